//! Dock items
//!
//! Each user's `~/Library/Preferences/com.apple.dock.plist` lists the tiles
//! shown in the Dock. Applications live under `persistent-apps` and
//! folders/documents under `persistent-others`; every entry carries a
//! `tile-data` dictionary with the label, type and two HFS+ dates:
//!
//! ```text
//! persistent-apps = [
//!     { GUID = 3157260738; tile-data = {
//!         file-label = "Safari"; file-type = 41;
//!         file-mod-date = 3600000000; parent-mod-date = 3600000000; ... } },
//! ]
//! ```

use crate::coerce::RawValue;
use crate::diag::Diagnostics;
use crate::errors::{Error, ErrorKind};
use crate::output::{Cell, Column, DataType, TabularWriter};
use crate::source::{MacInfo, UserInfo};
use crate::time::{read_mac_hfs_time, read_mac_hfs_time_masked, Timestamp};

const TARGET: &str = "dockitems::dock";

/// Tag under which parsed plists are exported
pub const PLUGIN_NAME: &str = "DOCKITEMS";

/// Location of the Dock preferences relative to a home directory
pub const DOCK_PLIST_PATH: &str = "Library/Preferences/com.apple.dock.plist";

/// Top level keys holding tiles, in output order
pub const TILE_KEYS: [&str; 2] = ["persistent-others", "persistent-apps"];

/// Nothing of interest lives in this home directory
const EMPTY_HOME: &str = "/private/var/empty";

pub const SHEET_NAME: &str = "Dock Information";
pub const TABLE_NAME: &str = "Dock Items";

pub const DOCK_COLUMNS: [Column; 7] = [
    Column::new("File Label", DataType::Text),
    Column::new("Parent Modified", DataType::Date),
    Column::new("File Modified", DataType::Date),
    Column::new("File Type", DataType::Text),
    Column::new("GUID", DataType::Text),
    Column::new("User", DataType::Text),
    Column::new("Source", DataType::Text),
];

/// One Dock tile of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockTileRecord {
    pub file_label: String,
    pub parent_modified: Timestamp,
    pub file_modified: Timestamp,
    pub file_type: String,
    pub guid: String,
    pub user_name: String,
    pub source_path: String,
}

impl DockTileRecord {
    /// The record as a row matching [`DOCK_COLUMNS`]
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.file_label.clone()),
            Cell::Date(self.parent_modified),
            Cell::Date(self.file_modified),
            Cell::Text(self.file_type.clone()),
            Cell::Text(self.guid.clone()),
            Cell::Text(self.user_name.clone()),
            Cell::Text(self.source_path.clone()),
        ]
    }
}

/// Renders a scalar plist value as text. Missing and non-scalar values
/// become the empty string.
pub fn scalar_to_string(value: Option<&plist::Value>) -> String {
    match value {
        Some(plist::Value::String(s)) => s.clone(),
        Some(plist::Value::Integer(i)) => i.to_string(),
        Some(plist::Value::Real(r)) => r.to_string(),
        Some(plist::Value::Boolean(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn tile_data(entry: &plist::Dictionary) -> Result<&plist::Dictionary, Error> {
    match entry.get("tile-data") {
        None => Err(Error::from(ErrorKind::MissingTileData)),
        Some(plist::Value::Dictionary(data)) if data.is_empty() => {
            Err(Error::from(ErrorKind::MissingTileData))
        }
        Some(plist::Value::Dictionary(data)) => Ok(data),
        Some(_) => Err(Error::structural("tile-data is not a dictionary")),
    }
}

/// Reads the tiles listed under one top level key, appending to `records`.
///
/// A structural error abandons the rest of the key; records already
/// appended stay.
fn read_tile_entries(
    entries: &plist::Value,
    key: &str,
    user_name: &str,
    source_path: &str,
    records: &mut Vec<DockTileRecord>,
    diag: &dyn Diagnostics,
) -> Result<(), Error> {
    let entries = entries
        .as_array()
        .ok_or_else(|| Error::structural(format!("{} is not an array", key)))?;

    for (index, entry) in entries.iter().enumerate() {
        let entry = entry.as_dictionary().ok_or_else(|| {
            Error::structural(format!("{}[{}] is not a dictionary", key, index))
        })?;

        let data = match tile_data(entry) {
            Ok(data) => data,
            Err(err) if matches!(err.kind(), ErrorKind::MissingTileData) => {
                diag.warn(
                    TARGET,
                    format_args!(
                        "No tile-data found in {}[{}] of {}, perhaps a newer format?",
                        key, index, source_path
                    ),
                );
                continue;
            }
            Err(err) => return Err(err),
        };

        // only parent-mod-date has been seen with garbage above 32 bits
        let parent_mod_date = RawValue::from_plist(data.get("parent-mod-date"));
        let file_mod_date = RawValue::from_plist(data.get("file-mod-date"));

        records.push(DockTileRecord {
            file_label: scalar_to_string(data.get("file-label")),
            parent_modified: read_mac_hfs_time_masked(parent_mod_date, diag),
            file_modified: read_mac_hfs_time(file_mod_date, diag),
            file_type: scalar_to_string(data.get("file-type")),
            guid: scalar_to_string(entry.get("GUID")),
            user_name: user_name.to_string(),
            source_path: source_path.to_string(),
        });
    }

    Ok(())
}

/// Extracts every Dock tile from a parsed `com.apple.dock.plist`.
///
/// Tiles are returned in plist order, `persistent-others` before
/// `persistent-apps`. Problems are reported through `diag` and never
/// stop the extraction of the other key.
///
/// ```
/// use dockitems::dock::read_dock_items;
/// use dockitems::NullDiagnostics;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <plist version="1.0"><dict>
///   <key>persistent-apps</key>
///   <array><dict>
///     <key>GUID</key><integer>123</integer>
///     <key>tile-data</key><dict>
///       <key>file-label</key><string>Safari</string>
///       <key>file-mod-date</key><integer>3600000000</integer>
///     </dict>
///   </dict></array>
/// </dict></plist>"#;
/// let plist = plist::Value::from_reader_xml(xml.as_bytes()).unwrap();
///
/// let records = read_dock_items(&plist, "alice", "/Users/alice/dock.plist", &NullDiagnostics);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].file_label, "Safari");
/// assert_eq!(records[0].guid, "123");
/// assert_eq!(records[0].file_modified.to_string(), "2018-01-28T16:00:00Z");
/// assert!(!records[0].parent_modified.is_available());
/// ```
pub fn read_dock_items(
    plist: &plist::Value,
    user_name: &str,
    source_path: &str,
    diag: &dyn Diagnostics,
) -> Vec<DockTileRecord> {
    let mut records = Vec::new();

    let Some(root) = plist.as_dictionary() else {
        diag.error(
            TARGET,
            format_args!("Root of {} is not a dictionary", source_path),
        );
        return records;
    };

    for key in TILE_KEYS {
        let Some(entries) = root.get(key) else {
            diag.debug(
                TARGET,
                format_args!("Key {} not found in {}", key, source_path),
            );
            continue;
        };

        if let Err(err) = read_tile_entries(entries, key, user_name, source_path, &mut records, diag)
        {
            diag.error(
                TARGET,
                format_args!("Error while processing {} in {}: {}", key, source_path, err),
            );
        }
    }

    records
}

/// Reads and extracts one user's Dock plist. A plist that cannot be read
/// contributes no records.
pub fn read_dock_items_plist(
    mac_info: &dyn MacInfo,
    user: &UserInfo,
    plist_path: &str,
    diag: &dyn Diagnostics,
) -> Vec<DockTileRecord> {
    match mac_info.read_plist(plist_path) {
        Ok(plist) => read_dock_items(&plist, &user.user_name, plist_path, diag),
        Err(err) => {
            diag.error(
                TARGET,
                format_args!("Could not read {}: {}", plist_path, err),
            );
            Vec::new()
        }
    }
}

/// Collects the Dock tiles of every user, grouped by user in the order the
/// users are listed.
pub fn collect_dock_items(mac_info: &dyn MacInfo, diag: &dyn Diagnostics) -> Vec<Vec<DockTileRecord>> {
    let mut docks = Vec::new();
    for user in mac_info.users() {
        if user.home_dir == EMPTY_HOME {
            continue;
        }

        let source_path = format!("{}/{}", user.home_dir.trim_end_matches('/'), DOCK_PLIST_PATH);
        if mac_info.is_valid_file_path(&source_path) {
            mac_info.export_file(&source_path, PLUGIN_NAME);
            docks.push(read_dock_items_plist(mac_info, user, &source_path, diag));
        }
    }
    docks
}

/// Flattens per-user records and writes them as the `Dock Items` table.
pub fn write_dock_items(
    docks: &[Vec<DockTileRecord>],
    writer: &mut dyn TabularWriter,
    diag: &dyn Diagnostics,
) -> Result<usize, Error> {
    diag.info(TARGET, format_args!("{} user dock(s) found", docks.len()));

    let rows = docks
        .iter()
        .flatten()
        .map(DockTileRecord::to_row)
        .collect::<Vec<_>>();

    writer.write_rows(SHEET_NAME, TABLE_NAME, &DOCK_COLUMNS, &rows)?;
    Ok(rows.len())
}

/// Runs the Dock items plugin against a system: every user's Dock plist is
/// exported, parsed and written to `writer`.
///
/// Returns the number of rows written. Only a failing sink is an error;
/// unreadable or malformed plists are reported through `diag` and skipped.
pub fn run(
    mac_info: &dyn MacInfo,
    writer: &mut dyn TabularWriter,
    diag: &dyn Diagnostics,
) -> Result<usize, Error> {
    let docks = collect_dock_items(mac_info, diag);
    write_dock_items(&docks, writer, diag)
}
