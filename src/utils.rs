use crate::diag::Diagnostics;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

const TARGET: &str = "dockitems::utils";

/// Returns `path` if nothing exists there yet, otherwise the first free
/// name made by appending a two digit counter to the file stem
/// (`file.jpg`, `file01.jpg`, `file02.jpg`, ...).
pub fn next_available_file_name(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut index = 1u32;
    loop {
        let name = match &extension {
            Some(ext) => format!("{}{:02}.{}", stem, index, ext),
            None => format!("{}{:02}", stem, index),
        };
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

/// Returns the total size of a seekable stream, leaving its position where
/// it was.
pub fn file_size<S: Seek>(stream: &mut S) -> std::io::Result<u64> {
    let current = stream.stream_position()?;
    let size = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(current))?;
    Ok(size)
}

/// Checks whether a table with the given name exists in a SQLite database.
///
/// Errors while querying the schema are reported and treated as absent.
pub fn table_exists(conn: &rusqlite::Connection, table_name: &str, diag: &dyn Diagnostics) -> bool {
    let result = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")
        .and_then(|mut stmt| stmt.exists([table_name]));

    match result {
        Ok(exists) => exists,
        Err(err) => {
            diag.error(
                TARGET,
                format_args!(
                    "In table_exists({}). Failed to list tables of db: {}",
                    table_name, err
                ),
            );
            false
        }
    }
}

/// Returns the comma separated names of every table in a SQLite database,
/// or an empty string if they could not be listed.
pub fn table_names(conn: &rusqlite::Connection, diag: &dyn Diagnostics) -> String {
    let result = conn.query_row(
        "SELECT group_concat(name) FROM sqlite_master WHERE type='table'",
        [],
        |row| row.get::<_, Option<String>>(0),
    );

    match result {
        Ok(names) => names.unwrap_or_default(),
        Err(err) => {
            diag.error(TARGET, format_args!("Failed to list tables on db: {}", err));
            String::new()
        }
    }
}
