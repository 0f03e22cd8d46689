//! `;`-delimited record tables (the `types/T*.txt` family).
//!
//! ```text
//! // comment lines start with a slash and are dropped
//! 47;2;
//! ship_m5;0;...;SS_SH_A_M5;
//! ship_m4;0;...;SS_SH_A_M4;
//! ```
//!
//! The first non-comment line is the header (`version;count;`). Every other
//! line is one [`Record`]. Records keep their original line text until they are
//! edited so untouched lines are written back verbatim.

use super::layouts::{Field, Layout, TableFormat};
use crate::virtual_path::VirtualPath;
use encoding_rs::WINDOWS_1252;

/// Field delimiter of record tables.
pub const DELIMITER: char = ';';

/// One line of a record table.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<String>,
    /// Verbatim source line; cleared on the first edit.
    original: Option<String>,
    layout: Option<&'static Layout>,
}

impl Record {
    fn parse(line: &str, layout: Option<&'static Layout>) -> Self {
        Self {
            fields: line.split(DELIMITER).map(str::to_string).collect(),
            original: Some(line.to_string()),
            layout,
        }
    }

    /// Build a new record from raw field strings.
    pub fn from_fields(fields: Vec<String>) -> Self {
        Self {
            fields,
            original: None,
            layout: None,
        }
    }

    /// All raw field strings in line order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.original.is_none()
    }

    /// Index of `field` in this record, resolving from-the-end positions.
    pub fn position(&self, field: Field) -> Option<usize> {
        let pos = self.layout?.position(field)?;
        resolve_position(pos, self.fields.len())
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.get_index(self.position(field)?)
    }

    /// Set a named field. Returns `false` if the record has no such field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        match self.position(field) {
            Some(index) => self.set_index(index, value),
            None => false,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Set a field by position. Returns `false` if `index` is out of range.
    pub fn set_index(&mut self, index: usize, value: impl Into<String>) -> bool {
        let Some(slot) = self.fields.get_mut(index) else {
            return false;
        };
        let value = value.into();
        if *slot != value {
            *slot = value;
            self.original = None;
        }
        true
    }

    fn to_line(&self) -> String {
        match &self.original {
            Some(line) => line.clone(),
            None => self.fields.join(&DELIMITER.to_string()),
        }
    }
}

fn resolve_position(pos: isize, len: usize) -> Option<usize> {
    if pos >= 0 {
        let index = pos as usize;
        (index < len).then_some(index)
    } else {
        len.checked_sub(pos.unsigned_abs())
    }
}

/// A parsed record table.
#[derive(Debug, Clone)]
pub struct RecordTable {
    format: TableFormat,
    layout: Option<&'static Layout>,
    header: Option<Record>,
    records: Vec<Record>,
    newline: &'static str,
}

impl RecordTable {
    /// Parse Windows-1252 encoded table bytes for `path`.
    pub fn from_bytes(path: &VirtualPath, bytes: &[u8]) -> Self {
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
        Self::parse(TableFormat::for_path(path), &text)
    }

    /// Parse decoded table text in the given format.
    pub fn parse(format: TableFormat, text: &str) -> Self {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };

        let mut lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .filter(|l| !is_comment_or_blank(l));

        let header = lines.next().map(|l| Record::parse(l, None));
        let rest: Vec<&str> = lines.collect();

        let layout = rest
            .first()
            .and_then(|first| format.select_layout(first.split(DELIMITER).count()));
        if let Some(layout) = layout {
            tracing::trace!("Record table {:?} using layout '{}'", format, layout.name);
        }

        let records = rest
            .into_iter()
            .map(|line| Record::parse(line, layout))
            .collect();

        Self {
            format,
            layout,
            header,
            records,
            newline,
        }
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Name of the layout chosen at parse time, if the format has one.
    pub fn layout_name(&self) -> Option<&'static str> {
        self.layout.map(|l| l.name)
    }

    pub fn header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose `field` equals `value`.
    pub fn find(&self, field: Field, value: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.get(field) == Some(value))
    }

    pub fn find_mut(&mut self, field: Field, value: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.get(field) == Some(value))
    }

    /// Value of a `Globals` entry by name.
    pub fn global(&self, name: &str) -> Option<&str> {
        self.find(Field::Key, name)?.get(Field::Value)
    }

    /// Set a `Globals` entry by name. Returns `false` if no entry has that name.
    pub fn set_global(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.find_mut(Field::Key, name) {
            Some(record) => record.set(Field::Value, value),
            None => false,
        }
    }

    /// Append a record and bump the header's entry count.
    pub fn push_record(&mut self, fields: Vec<String>) {
        let mut record = Record::from_fields(fields);
        record.layout = self.layout;
        self.records.push(record);

        let count = self.records.len().to_string();
        match &mut self.header {
            Some(header) if header.len() > 1 => {
                header.set_index(1, count);
            }
            _ => {
                tracing::debug!("Record table has no entry count to update");
            }
        }
    }

    pub fn is_modified(&self) -> bool {
        self.header.as_ref().is_some_and(Record::is_modified)
            || self.records.iter().any(Record::is_modified)
    }

    /// Render the table (header and records, comments dropped).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for record in self.header.iter().chain(self.records.iter()) {
            out.push_str(&record.to_line());
            out.push_str(self.newline);
        }
        out
    }

    /// Render and encode the table as Windows-1252.
    ///
    /// Returns `None` if an edited field holds a character the encoding
    /// cannot represent.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let text = self.to_text();
        let (bytes, _, had_errors) = WINDOWS_1252.encode(&text);
        (!had_errors).then(|| bytes.into_owned())
    }
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPS: &str = "// TShips\r\n\
        // body;pict;...\r\n\
        47;2;\r\n\
        ships\\argon_m5;0;0;0;0;1;1001;1250;40;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;8000;SS_SH_A_M5;\r\n\
        ships\\argon_m4;0;0;0;0;2;1002;700;30;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;0;9000;SS_SH_A_M4;\r\n";

    #[test]
    fn test_parse_header_and_records() {
        let table = RecordTable::parse(TableFormat::Ships, SHIPS);
        assert_eq!(table.len(), 2);
        assert_eq!(table.header().unwrap().fields(), &["47", "2", ""]);
        assert_eq!(table.records()[0].get(Field::Id), Some("SS_SH_A_M5"));
        assert_eq!(table.records()[1].get(Field::Speed), Some("700"));
        assert_eq!(table.records()[0].get(Field::HullStrength), Some("8000"));
    }

    #[test]
    fn test_untouched_lines_verbatim() {
        let table = RecordTable::parse(TableFormat::Ships, SHIPS);
        let text = table.to_text();
        assert!(!text.contains("//"));
        assert!(text.starts_with("47;2;\r\n"));
        assert!(text.contains("ships\\argon_m4;0;0;0;0;2;1002;700;"));
        assert!(!table.is_modified());
    }

    #[test]
    fn test_edit_named_field() {
        let mut table = RecordTable::parse(TableFormat::Ships, SHIPS);
        let record = table.find_mut(Field::Id, "SS_SH_A_M5").unwrap();
        assert!(record.set(Field::Speed, "1500"));
        assert!(table.is_modified());
        assert_eq!(table.records()[0].get(Field::Speed), Some("1500"));
        assert!(table.to_text().contains(";1001;1500;40;"));
    }

    #[test]
    fn test_setting_same_value_is_not_an_edit() {
        let mut table = RecordTable::parse(TableFormat::Ships, SHIPS);
        assert!(table.records_mut()[0].set(Field::Speed, "1250"));
        assert!(!table.is_modified());
    }

    #[test]
    fn test_unmapped_positions_by_index() {
        let mut table = RecordTable::parse(TableFormat::Generic, "1;1;\na;b;c;\n");
        let record = &mut table.records_mut()[0];
        assert_eq!(record.get(Field::Id), None);
        assert_eq!(record.get_index(1), Some("b"));
        assert!(record.set_index(2, "z"));
        assert!(!record.set_index(10, "z"));
        assert_eq!(table.to_text(), "1;1;\na;b;z;\n");
    }

    #[test]
    fn test_negative_positions() {
        assert_eq!(resolve_position(-2, 5), Some(3));
        assert_eq!(resolve_position(-6, 5), None);
        assert_eq!(resolve_position(4, 5), Some(4));
        assert_eq!(resolve_position(5, 5), None);
    }

    #[test]
    fn test_push_record_updates_count() {
        let mut table = RecordTable::parse(TableFormat::Ships, SHIPS);
        let mut fields = table.records()[0].fields().to_vec();
        let id = fields.len() - 2;
        fields[id] = "SS_SH_A_M5_CUSTOM".to_string();
        table.push_record(fields);
        assert_eq!(table.len(), 3);
        assert_eq!(table.header().unwrap().get_index(1), Some("3"));
        assert!(table.find(Field::Id, "SS_SH_A_M5_CUSTOM").is_some());
    }

    #[test]
    fn test_globals() {
        let mut table = RecordTable::from_bytes(
            &VirtualPath::new("types/Globals.txt"),
            b"// globals\n1;2;\nSG_SECTOR_SIZE;60000;\nSG_MAX_CREDITS;99;\n",
        );
        assert_eq!(table.format(), TableFormat::Globals);
        assert_eq!(table.global("SG_MAX_CREDITS"), Some("99"));
        assert!(table.set_global("SG_MAX_CREDITS", "100"));
        assert!(!table.set_global("SG_UNKNOWN", "1"));
        assert_eq!(table.global("SG_MAX_CREDITS"), Some("100"));
    }

    #[test]
    fn test_latin1_roundtrip() {
        let bytes = b"1;1;\nna\xefve;\xa9;\n";
        let table = RecordTable::from_bytes(&VirtualPath::new("types/Jobs.txt"), bytes);
        assert_eq!(table.records()[0].get_index(0), Some("na\u{ef}ve"));
        assert_eq!(table.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_unencodable_edit() {
        let mut table = RecordTable::parse(TableFormat::Generic, "1;1;\na;\n");
        table.records_mut()[0].set_index(0, "\u{4e2d}");
        assert!(table.to_bytes().is_none());
    }

    #[test]
    fn test_layout_selected_from_first_record() {
        let short_line = vec!["x"; 26].join(";");
        let table = RecordTable::parse(TableFormat::Bullets, &format!("1;1;\n{}\n", short_line));
        assert_eq!(table.layout_name(), Some("x3r"));

        let long_line = vec!["x"; 34].join(";");
        let table = RecordTable::parse(TableFormat::Bullets, &format!("1;1;\n{}\n", long_line));
        assert_eq!(table.layout_name(), Some("x3tc"));
    }
}
