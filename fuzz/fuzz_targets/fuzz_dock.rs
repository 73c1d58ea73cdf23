#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(plist) = plist::Value::from_reader(std::io::Cursor::new(data)) else {
        return;
    };

    let diag = dockitems::NullDiagnostics;
    for record in dockitems::read_dock_items(&plist, "fuzz", "fuzz.plist", &diag) {
        let _ = record.to_row();
    }

    if let Ok(text) = std::str::from_utf8(data) {
        for kind in dockitems::EpochKind::ALL {
            let _ = dockitems::time::convert(kind, text, &diag).to_string();
        }
    }
});
