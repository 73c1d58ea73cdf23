#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![forbid(unsafe_code)]

mod coerce;
mod diag;
pub mod dock;
mod errors;
mod output;
mod source;
pub mod time;
mod utils;

pub use coerce::{int_from_str, RawValue};
pub use diag::{Diagnostic, Diagnostics, Level, LogDiagnostics, MemoryDiagnostics, NullDiagnostics};
pub use dock::{read_dock_items, DockTileRecord};
pub use errors::{Error, ErrorKind};
pub use output::*;
pub use source::{MacInfo, MountedVolume, UserInfo};
pub use time::{EpochKind, Timestamp, UtcDateTime};
pub use utils::{file_size, next_available_file_name, table_exists, table_names};
