use criterion::{BenchmarkId, Criterion, Throughput};
use dockitems::{EpochKind, NullDiagnostics, RawValue};
use plist::{Dictionary, Value};

fn convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let inputs = [
        ("integer", RawValue::Signed(725_846_400)),
        ("nanos", RawValue::Signed(725_846_400_000_000_000)),
        ("real", RawValue::Real(725_846_400.5)),
        ("text", RawValue::Text("725846400")),
        ("garbage", RawValue::Text("not a date")),
    ];

    for kind in EpochKind::ALL {
        for (name, raw) in &inputs {
            let id = BenchmarkId::new(kind.to_string(), name);
            group.bench_with_input(id, raw, |b, raw| {
                b.iter(|| dockitems::time::convert(kind, *raw, &NullDiagnostics));
            });
        }
    }
    group.finish();
}

fn create_dock_plist(tiles: usize) -> Value {
    let entries = (0..tiles)
        .map(|i| {
            let mut data = Dictionary::new();
            data.insert("file-label".into(), Value::String(format!("App {}", i)));
            data.insert("file-type".into(), Value::Integer(41.into()));
            data.insert("file-mod-date".into(), Value::Integer(3_600_000_000u64.into()));
            data.insert(
                "parent-mod-date".into(),
                Value::Integer((0x1_0000_0000u64 + i as u64).into()),
            );

            let mut entry = Dictionary::new();
            entry.insert("GUID".into(), Value::Integer((i as u64).into()));
            entry.insert("tile-data".into(), Value::Dictionary(data));
            Value::Dictionary(entry)
        })
        .collect();

    let mut root = Dictionary::new();
    root.insert("persistent-apps".into(), Value::Array(entries));
    Value::Dictionary(root)
}

fn dock_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("read-dock-items");
    for size in &[1, 16, 256, 4096] {
        let plist = create_dock_plist(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _size| {
            b.iter(|| {
                let records = dockitems::read_dock_items(&plist, "bench", "dock.plist", &NullDiagnostics);
                assert_eq!(records.len(), *size);
            });
        });
    }
    group.finish();
}

criterion::criterion_group!(benches, convert, dock_items);
criterion::criterion_main!(benches);
