use dockitems::time::{
    convert, read_apfs_time, read_mac_absolute_time, read_mac_hfs_time, read_unix_time,
    HFS_EPOCH_OFFSET, MAC_ABSOLUTE_EPOCH_OFFSET,
};
use dockitems::{EpochKind, Level, MemoryDiagnostics, RawValue, Timestamp, UtcDateTime};
use quickcheck_macros::quickcheck;
use rstest::rstest;

fn unix(seconds: i64) -> Timestamp {
    Timestamp::Utc(UtcDateTime::from_unix(seconds).unwrap())
}

#[rstest]
#[case(1, -HFS_EPOCH_OFFSET + 1)]
#[case(HFS_EPOCH_OFFSET, 0)]
#[case(3_600_000_000, 3_600_000_000 - HFS_EPOCH_OFFSET)]
#[case(0xFFFF_FFFF, 0xFFFF_FFFF - HFS_EPOCH_OFFSET)]
fn test_hfs_values(#[case] raw: i64, #[case] expected_unix: i64) {
    let diag = MemoryDiagnostics::new();
    assert_eq!(read_mac_hfs_time(raw, &diag), unix(expected_unix));
    assert!(diag.is_empty());
}

#[rstest]
#[case(RawValue::Signed(1), MAC_ABSOLUTE_EPOCH_OFFSET + 1)]
#[case(RawValue::Signed(0xFFFF_FFFF), MAC_ABSOLUTE_EPOCH_OFFSET + 0xFFFF_FFFF)]
#[case(RawValue::Unsigned(600_000_000_000_000_000), MAC_ABSOLUTE_EPOCH_OFFSET + 600_000_000)]
#[case(RawValue::Real(600_000_000.0), MAC_ABSOLUTE_EPOCH_OFFSET + 600_000_000)]
#[case(RawValue::Text("600000000"), MAC_ABSOLUTE_EPOCH_OFFSET + 600_000_000)]
#[case(RawValue::Signed(-1), MAC_ABSOLUTE_EPOCH_OFFSET - 1)]
fn test_mac_absolute_values(#[case] raw: RawValue, #[case] expected_unix: i64) {
    let diag = MemoryDiagnostics::new();
    assert_eq!(read_mac_absolute_time(raw, &diag), unix(expected_unix));
    assert!(diag.is_empty());
}

#[test]
fn test_apfs_and_unix_agree() {
    let diag = MemoryDiagnostics::new();
    assert_eq!(
        read_apfs_time(1_283_652_721_000_000_000i64, &diag),
        read_unix_time(1_283_652_721i64, &diag)
    );
    assert_eq!(
        read_unix_time(1_283_652_721i64, &diag).to_string(),
        "2010-09-05T02:12:01Z"
    );
}

#[rstest]
fn test_unavailable_for_sentinels(
    #[values(EpochKind::Hfs, EpochKind::MacAbsolute, EpochKind::Apfs, EpochKind::Unix)]
    kind: EpochKind,
    #[values(RawValue::Absent, RawValue::Signed(0), RawValue::Real(0.0), RawValue::Text(""))]
    raw: RawValue<'static>,
) {
    let diag = MemoryDiagnostics::new();
    assert_eq!(convert(kind, raw, &diag), Timestamp::Unavailable);
    assert!(diag.is_empty());
}

#[rstest]
fn test_non_numeric_text_emits_one_diagnostic(
    #[values(EpochKind::Hfs, EpochKind::MacAbsolute, EpochKind::Apfs, EpochKind::Unix)]
    kind: EpochKind,
    #[values("abc", "12:30", "0x10", "--5")] text: &str,
) {
    let diag = MemoryDiagnostics::new();
    assert_eq!(convert(kind, text, &diag), Timestamp::Unavailable);
    let entries = diag.entries();
    assert_eq!(entries.len(), 1, "{:?}", entries);
    assert_eq!(entries[0].level, Level::Error);
}

#[test]
fn test_local_time_is_opt_in() {
    let diag = MemoryDiagnostics::new();
    let Timestamp::Utc(utc) = read_unix_time(0i64, &diag) else {
        panic!("expected a timestamp");
    };
    assert_eq!(utc.to_string(), "1970-01-01T00:00:00Z");

    let tz = jiff::tz::TimeZone::fixed(jiff::tz::offset(2));
    assert_eq!(utc.to_local(&tz).unwrap().to_string(), "1970-01-01T02:00:00");
}

#[quickcheck]
fn prop_hfs_matches_unix_offset(raw: u32) -> bool {
    if raw == 0 {
        return true;
    }
    let diag = MemoryDiagnostics::new();
    read_mac_hfs_time(raw, &diag) == unix(i64::from(raw) - HFS_EPOCH_OFFSET)
}

#[quickcheck]
fn prop_mac_absolute_seconds_match_unix_offset(raw: u32) -> bool {
    if raw == 0 {
        return true;
    }
    let diag = MemoryDiagnostics::new();
    read_mac_absolute_time(raw, &diag)
        == read_unix_time(i64::from(raw) + MAC_ABSOLUTE_EPOCH_OFFSET, &diag)
}

macro_rules! reader_matches_convert {
    ($($reader:ident => $kind:expr),* $(,)?) => {
        paste::paste! {
            $(
                #[quickcheck]
                fn [<prop_read_ $reader _time_matches_convert>](raw: u32) -> bool {
                    let diag = MemoryDiagnostics::new();
                    [<read_ $reader _time>](raw, &diag) == convert($kind, raw, &diag)
                }
            )*
        }
    };
}

reader_matches_convert! {
    mac_hfs => EpochKind::Hfs,
    mac_absolute => EpochKind::MacAbsolute,
    apfs => EpochKind::Apfs,
    unix => EpochKind::Unix,
}
