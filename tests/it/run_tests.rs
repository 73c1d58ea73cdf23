use dockitems::dock::{self, DOCK_COLUMNS, SHEET_NAME, TABLE_NAME};
use dockitems::{
    Cell, Column, Error, Level, MacInfo, MemoryDiagnostics, MountedVolume, SqliteWriter,
    TabularWriter, UserInfo,
};
use plist::{Dictionary, Value};
use std::cell::RefCell;
use std::collections::HashMap;

fn dock_plist(labels: &[&str]) -> Value {
    let entries = labels
        .iter()
        .map(|label| {
            let mut data = Dictionary::new();
            data.insert("file-label".into(), Value::String((*label).into()));
            let mut entry = Dictionary::new();
            entry.insert("tile-data".into(), Value::Dictionary(data));
            Value::Dictionary(entry)
        })
        .collect();

    let mut root = Dictionary::new();
    root.insert("persistent-apps".into(), Value::Array(entries));
    Value::Dictionary(root)
}

/// An in-memory system: plists keyed by path
#[derive(Default)]
struct FakeMac {
    users: Vec<UserInfo>,
    plists: HashMap<String, Option<Value>>,
    exported: RefCell<Vec<(String, String)>>,
}

impl FakeMac {
    fn user(mut self, name: &str, home: &str, plist: Option<Value>) -> Self {
        self.users.push(UserInfo::new(name, home));
        let path = format!("{}/Library/Preferences/com.apple.dock.plist", home);
        self.plists.insert(path, plist);
        self
    }
}

impl MacInfo for FakeMac {
    fn users(&self) -> &[UserInfo] {
        &self.users
    }

    fn is_valid_file_path(&self, path: &str) -> bool {
        self.plists.contains_key(path)
    }

    fn export_file(&self, path: &str, tag: &str) {
        self.exported
            .borrow_mut()
            .push((path.to_string(), tag.to_string()));
    }

    fn read_plist(&self, path: &str) -> Result<Value, Error> {
        match self.plists.get(path) {
            Some(Some(value)) => Ok(value.clone()),
            _ => Err(Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "corrupt plist",
            ))),
        }
    }
}

#[derive(Default)]
struct RecordingWriter {
    tables: Vec<(String, String, Vec<Column>, Vec<Vec<Cell>>)>,
}

impl TabularWriter for RecordingWriter {
    fn write_rows(
        &mut self,
        sheet_name: &str,
        table_name: &str,
        columns: &[Column],
        rows: &[Vec<Cell>],
    ) -> Result<(), Error> {
        self.tables.push((
            sheet_name.to_string(),
            table_name.to_string(),
            columns.to_vec(),
            rows.to_vec(),
        ));
        Ok(())
    }
}

struct FailingWriter;

impl TabularWriter for FailingWriter {
    fn write_rows(&mut self, _: &str, _: &str, _: &[Column], _: &[Vec<Cell>]) -> Result<(), Error> {
        Err(Error::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read only",
        )))
    }
}

fn label(row: &[Cell]) -> &str {
    match &row[0] {
        Cell::Text(s) => s.as_str(),
        other => panic!("unexpected cell {:?}", other),
    }
}

#[test]
fn test_run_flattens_in_user_order() {
    let mac = FakeMac::default()
        .user("zed", "/Users/zed", Some(dock_plist(&["Z1", "Z2"])))
        .user("nobody", "/private/var/empty", Some(dock_plist(&["hidden"])))
        .user("amy", "/Users/amy", Some(dock_plist(&["A1"])));

    let diag = MemoryDiagnostics::new();
    let mut writer = RecordingWriter::default();
    let rows = dock::run(&mac, &mut writer, &diag).unwrap();
    assert_eq!(rows, 3);

    let (sheet, table, columns, written) = &writer.tables[0];
    assert_eq!(sheet, SHEET_NAME);
    assert_eq!(table, TABLE_NAME);
    assert_eq!(columns.as_slice(), &DOCK_COLUMNS);
    let labels: Vec<_> = written.iter().map(|r| label(r)).collect();
    assert_eq!(labels, vec!["Z1", "Z2", "A1"]);

    assert_eq!(
        *mac.exported.borrow(),
        vec![
            (
                String::from("/Users/zed/Library/Preferences/com.apple.dock.plist"),
                String::from("DOCKITEMS")
            ),
            (
                String::from("/Users/amy/Library/Preferences/com.apple.dock.plist"),
                String::from("DOCKITEMS")
            ),
        ]
    );

    let info = diag.at_level(Level::Info);
    assert_eq!(info.len(), 1);
    assert!(info[0].message.starts_with("2 user dock(s)"));
}

#[test]
fn test_run_survives_unreadable_user() {
    let mac = FakeMac::default()
        .user("broken", "/Users/broken", None)
        .user("amy", "/Users/amy", Some(dock_plist(&["A1"])));

    let diag = MemoryDiagnostics::new();
    let mut writer = RecordingWriter::default();
    assert_eq!(dock::run(&mac, &mut writer, &diag).unwrap(), 1);
    assert_eq!(diag.at_level(Level::Error).len(), 1);
}

#[test]
fn test_run_reports_sink_failure() {
    let mac = FakeMac::default().user("amy", "/Users/amy", Some(dock_plist(&["A1"])));
    let err = dock::run(&mac, &mut FailingWriter, &MemoryDiagnostics::new()).unwrap_err();
    assert!(err.to_string().contains("read only"));
}

#[test]
fn test_run_into_sqlite_from_volume() {
    let dir = tempfile::tempdir().unwrap();
    for (user, labels) in [("alice", &["Safari", "Mail"][..]), ("bob", &["Notes"][..])] {
        let prefs = dir
            .path()
            .join("Users")
            .join(user)
            .join("Library/Preferences");
        std::fs::create_dir_all(&prefs).unwrap();
        dock_plist(labels)
            .to_file_xml(prefs.join("com.apple.dock.plist"))
            .unwrap();
    }
    std::fs::create_dir_all(dir.path().join("Users/Shared")).unwrap();

    let export = tempfile::tempdir().unwrap();
    let volume = MountedVolume::open(dir.path(), MemoryDiagnostics::new())
        .unwrap()
        .export_to(export.path());
    let mut writer = SqliteWriter::open_in_memory().unwrap();
    let diag = MemoryDiagnostics::new();
    assert_eq!(dock::run(&volume, &mut writer, &diag).unwrap(), 3);

    let conn = writer.connection();
    let mut stmt = conn
        .prepare("SELECT \"User\", \"File Label\" FROM \"Dock Items\" ORDER BY rowid")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (String::from("alice"), String::from("Safari")),
            (String::from("alice"), String::from("Mail")),
            (String::from("bob"), String::from("Notes")),
        ]
    );

    assert!(dockitems::table_exists(conn, "Dock Items", &diag));
    assert!(export
        .path()
        .join("DOCKITEMS")
        .join("com.apple.dock01.plist")
        .exists());
}
