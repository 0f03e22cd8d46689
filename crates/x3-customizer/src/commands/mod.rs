mod config;
mod list;
mod pack;
mod resolve;
mod restore;
mod run;
mod unpack;

pub use config::show_config;
pub use list::{list_catalogs, ListArgs};
pub use pack::{pack_catalog, PackCatalogArgs};
pub use resolve::{resolve_asset, ResolveArgs};
pub use restore::{restore, RestoreArgs};
pub use run::{run, RunArgs};
pub use unpack::{unpack_catalog, UnpackArgs};
