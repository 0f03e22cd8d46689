//! Reader and writer for X3 catalog archive pairs.
//!
//! A catalog pair is an index file (`NN.cat`) and a data file (`NN.dat`). The
//! index lists internal paths and payload lengths; the data file holds the
//! payloads back to back. Both files are obfuscated with simple XOR ciphers
//! (see [`cipher`]). Payloads stored under a compressed-form name (`.pck`,
//! `.pbd`, `.pbb`) are additionally gzip-compressed (see [`compression`]).
//!
//! # Example
//!
//! ```no_run
//! use x3_catalog::{discover_pairs, compression};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! for mut pair in discover_pairs(Utf8Path::new("C:/Games/X3 Terran Conflict/addon")) {
//!     if let Some(bytes) = pair.read("types/TShips.pck")? {
//!         let text = compression::decompress(&bytes)?;
//!         println!("{} bytes from {}", text.len(), pair.cat_path());
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod compression;
pub mod error;
pub mod index;
pub mod pair;
pub mod writer;

pub use cipher::{decode_entry, decode_index, encode_entry, encode_index};
pub use error::{CatalogError, Result};
pub use index::{CatalogEntry, CatalogIndex};
pub use pair::{discover_pairs, next_pair_number, pair_file_name, CatalogPair};
pub use writer::CatalogWriter;
