use dockitems::dock::{read_dock_items, read_dock_items_plist, DOCK_PLIST_PATH};
use dockitems::{Level, MacInfo, MemoryDiagnostics, MountedVolume, Timestamp, UserInfo};
use plist::{Dictionary, Value};
use std::path::Path;

const DOCK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>autohide</key>
    <false/>
    <key>persistent-apps</key>
    <array>
        <dict>
            <key>GUID</key>
            <integer>3157260738</integer>
            <key>tile-data</key>
            <dict>
                <key>file-label</key>
                <string>Safari</string>
                <key>file-mod-date</key>
                <integer>3600000000</integer>
                <key>file-type</key>
                <integer>41</integer>
                <key>parent-mod-date</key>
                <integer>3599999000</integer>
            </dict>
            <key>tile-type</key>
            <string>file-tile</string>
        </dict>
        <dict>
            <key>GUID</key>
            <integer>2779468932</integer>
            <key>tile-data</key>
            <dict>
                <key>file-label</key>
                <string>Mail</string>
                <key>file-mod-date</key>
                <integer>0</integer>
                <key>file-type</key>
                <integer>41</integer>
                <key>parent-mod-date</key>
                <integer>4294967297</integer>
            </dict>
        </dict>
    </array>
</dict>
</plist>
"#;

fn write_dock(root: &Path, user: &str, contents: &[u8]) {
    let dir = root
        .join("Users")
        .join(user)
        .join("Library")
        .join("Preferences");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("com.apple.dock.plist"), contents).unwrap();
}

fn dock_path(user: &str) -> String {
    format!("/Users/{}/{}", user, DOCK_PLIST_PATH)
}

#[test]
fn test_xml_dock_plist() {
    let plist = Value::from_reader_xml(DOCK_XML.as_bytes()).unwrap();
    let diag = MemoryDiagnostics::new();
    let records = read_dock_items(&plist, "alice", "/Users/alice/dock", &diag);

    assert_eq!(records.len(), 2);

    let safari = &records[0];
    assert_eq!(safari.file_label, "Safari");
    assert_eq!(safari.file_type, "41");
    assert_eq!(safari.guid, "3157260738");
    assert_eq!(safari.file_modified.to_string(), "2018-01-28T16:00:00Z");
    assert_eq!(safari.parent_modified.to_string(), "2018-01-28T15:43:20Z");

    let mail = &records[1];
    assert_eq!(mail.file_modified, Timestamp::Unavailable);
    // 0x1_0000_0001 keeps only its low bits
    assert_eq!(mail.parent_modified.to_string(), "1904-01-01T00:00:01Z");

    let debug = diag.at_level(Level::Debug);
    assert_eq!(debug.len(), 1);
    assert!(debug[0].message.contains("persistent-others"));
    assert_eq!(diag.len(), 1);
}

#[test]
fn test_binary_dock_plist_from_volume() {
    let mut data = Dictionary::new();
    data.insert("file-label".into(), Value::String("Downloads".into()));
    data.insert("file-type".into(), Value::Integer(2.into()));
    data.insert("file-mod-date".into(), Value::Integer(3_600_000_000u64.into()));
    let mut entry = Dictionary::new();
    entry.insert("GUID".into(), Value::Integer(7.into()));
    entry.insert("tile-data".into(), Value::Dictionary(data));
    let mut root = Dictionary::new();
    root.insert(
        "persistent-others".into(),
        Value::Array(vec![Value::Dictionary(entry)]),
    );

    let mut bytes = Vec::new();
    Value::Dictionary(root).to_writer_binary(&mut bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    write_dock(dir.path(), "bob", &bytes);

    let diag = MemoryDiagnostics::new();
    let volume = MountedVolume::open(dir.path(), MemoryDiagnostics::new()).unwrap();
    let user = volume.users()[0].clone();
    assert_eq!(user, UserInfo::new("bob", "/Users/bob"));

    let records = read_dock_items_plist(&volume, &user, &dock_path("bob"), &diag);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_label, "Downloads");
    assert_eq!(records[0].user_name, "bob");
    assert_eq!(records[0].source_path, dock_path("bob"));
    assert_eq!(records[0].parent_modified, Timestamp::Unavailable);
}

#[test]
fn test_unparseable_plist_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_dock(dir.path(), "carol", b"definitely not a plist");

    let diag = MemoryDiagnostics::new();
    let volume = MountedVolume::open(dir.path(), MemoryDiagnostics::new()).unwrap();
    let user = volume.users()[0].clone();

    let records = read_dock_items_plist(&volume, &user, &dock_path("carol"), &diag);
    assert!(records.is_empty());

    let errors = diag.at_level(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("com.apple.dock.plist"));
}
