//! Field-name tables for the record-table formats.
//!
//! Each [`TableFormat`] owns one or more [`Layout`]s. Formats whose line length
//! changed between game versions list one layout per version; the layout is
//! picked once, when the table is parsed, from the field count of the first
//! data record. Positions may be negative to count from the end of a line,
//! which keeps the ware fields shared by most tables addressable even when the
//! front of the line differs between formats.

use crate::virtual_path::VirtualPath;

/// Named fields addressable on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Shared front fields
    Model,
    PictureId,
    DescriptionId,

    // Ship fields
    Yaw,
    Pitch,
    Roll,
    ShipClass,
    Speed,
    Acceleration,
    EngineSound,
    ReactionDelay,
    LaserEnergy,
    LaserRecharge,
    ShieldType,
    MaxShields,
    CargoMin,
    CargoMax,
    HullStrength,

    // Weapon fields
    BulletIndex,
    FireDelay,
    RotationSpeed,
    ShieldDamage,
    HullDamage,
    Lifetime,
    EnergyUse,
    Flags,

    // Shield/missile fields
    Strength,
    Recharge,
    Damage,
    Range,

    // Ware tail, present on every ware table
    Volume,
    RelativeValueNpc,
    PriceModifier1,
    PriceModifier2,
    WareSize,
    RelativeValuePlayer,
    MinNotoriety,
    VideoId,
    SkinIndex,
    Id,

    // Globals
    Key,
    Value,
}

/// Mapping of fields to line positions for one format version.
#[derive(Debug)]
pub struct Layout {
    /// Short label used in logs (`"x3tc"`, `"x3r"`, ...).
    pub name: &'static str,
    /// Smallest field count this layout applies to.
    pub min_fields: usize,
    pub fields: &'static [(Field, isize)],
}

impl Layout {
    /// Raw position of `field`, possibly negative.
    pub fn position(&self, field: Field) -> Option<isize> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, pos)| *pos)
    }
}

/// Field list of a ware table: the given front fields followed by the tail
/// shared by every ware table. Lines end with `;`, so the last split field is
/// empty and the ware ID sits at `-2`.
macro_rules! ware_fields {
    ($($front:expr),* $(,)?) => {
        &[
            $($front,)*
            (Field::Volume, -11),
            (Field::RelativeValueNpc, -10),
            (Field::PriceModifier1, -9),
            (Field::PriceModifier2, -8),
            (Field::WareSize, -7),
            (Field::RelativeValuePlayer, -6),
            (Field::MinNotoriety, -5),
            (Field::VideoId, -4),
            (Field::SkinIndex, -3),
            (Field::Id, -2),
        ]
    };
}

static SHIPS: &[Layout] = &[Layout {
    name: "ships",
    min_fields: 0,
    fields: &[
        (Field::Model, 0),
        (Field::PictureId, 1),
        (Field::Yaw, 2),
        (Field::Pitch, 3),
        (Field::Roll, 4),
        (Field::ShipClass, 5),
        (Field::DescriptionId, 6),
        (Field::Speed, 7),
        (Field::Acceleration, 8),
        (Field::EngineSound, 9),
        (Field::ReactionDelay, 10),
        (Field::LaserEnergy, 20),
        (Field::LaserRecharge, 21),
        (Field::ShieldType, 22),
        (Field::MaxShields, 23),
        (Field::CargoMin, 27),
        (Field::CargoMax, 28),
        (Field::HullStrength, 33),
        (Field::Id, -2),
    ],
}];

static LASERS: &[Layout] = &[Layout {
    name: "lasers",
    min_fields: 0,
    fields: ware_fields![
        (Field::Model, 0),
        (Field::PictureId, 1),
        (Field::RotationSpeed, 2),
        (Field::FireDelay, 3),
        (Field::BulletIndex, 7),
    ],
}];

// Bullet lines grew between game versions; the longer layout is tried first.
static BULLETS: &[Layout] = &[
    Layout {
        name: "x3tc",
        min_fields: 30,
        fields: &[
            (Field::Model, 0),
            (Field::PictureId, 1),
            (Field::ShieldDamage, 7),
            (Field::HullDamage, 8),
            (Field::Speed, 9),
            (Field::Lifetime, 10),
            (Field::EnergyUse, 11),
            (Field::Flags, 16),
            (Field::Id, -2),
        ],
    },
    Layout {
        name: "x3r",
        min_fields: 0,
        fields: &[
            (Field::Model, 0),
            (Field::PictureId, 1),
            (Field::ShieldDamage, 6),
            (Field::HullDamage, 7),
            (Field::Speed, 8),
            (Field::Lifetime, 9),
            (Field::EnergyUse, 10),
            (Field::Flags, 15),
            (Field::Id, -2),
        ],
    },
];

static SHIELDS: &[Layout] = &[Layout {
    name: "shields",
    min_fields: 0,
    fields: ware_fields![
        (Field::Model, 0),
        (Field::PictureId, 1),
        (Field::Recharge, 7),
        (Field::Strength, 8),
    ],
}];

static MISSILES: &[Layout] = &[Layout {
    name: "missiles",
    min_fields: 0,
    fields: ware_fields![
        (Field::Model, 0),
        (Field::PictureId, 1),
        (Field::Speed, 7),
        (Field::Acceleration, 8),
        (Field::Damage, 10),
        (Field::Range, 11),
        (Field::Flags, 15),
    ],
}];

static WARES: &[Layout] = &[Layout {
    name: "wares",
    min_fields: 0,
    fields: ware_fields![(Field::Model, 0), (Field::PictureId, 1)],
}];

static GLOBALS: &[Layout] = &[Layout {
    name: "globals",
    min_fields: 0,
    fields: &[(Field::Key, 0), (Field::Value, 1)],
}];

/// Record-table formats known by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Ships,
    Lasers,
    Bullets,
    Shields,
    Missiles,
    /// Other ware tables (`TWareT`, `TWareF`, ...), sharing only the ware tail.
    Wares,
    /// `types/Globals.txt`: `name;value;` pairs addressed by name.
    Globals,
    /// Unknown tables, index-addressed only.
    Generic,
}

impl TableFormat {
    /// Choose the format for a record-table virtual path.
    pub fn for_path(path: &VirtualPath) -> Self {
        let name = path.file_name().to_ascii_lowercase();
        let stem = name.strip_suffix(".txt").unwrap_or(&name);
        match stem {
            "tships" => TableFormat::Ships,
            "tlaser" => TableFormat::Lasers,
            "tbullets" => TableFormat::Bullets,
            "tshields" => TableFormat::Shields,
            "tmissiles" => TableFormat::Missiles,
            "globals" => TableFormat::Globals,
            s if s.starts_with("tware") => TableFormat::Wares,
            _ => TableFormat::Generic,
        }
    }

    fn layouts(self) -> &'static [Layout] {
        match self {
            TableFormat::Ships => SHIPS,
            TableFormat::Lasers => LASERS,
            TableFormat::Bullets => BULLETS,
            TableFormat::Shields => SHIELDS,
            TableFormat::Missiles => MISSILES,
            TableFormat::Wares => WARES,
            TableFormat::Globals => GLOBALS,
            TableFormat::Generic => &[],
        }
    }

    /// Pick the layout matching a record with `field_count` fields.
    pub fn select_layout(self, field_count: usize) -> Option<&'static Layout> {
        self.layouts()
            .iter()
            .find(|layout| field_count >= layout.min_fields)
    }
}
