use criterion::{criterion_group, criterion_main, Criterion};

use isis2709tk::geometry::Geometry;
use isis2709tk::record::{decode_record, encode_record, IsoRecord, RawField};

fn sample_record() -> IsoRecord {
    IsoRecord::new(vec![
        RawField::new(*b"001", b"ocn953985896".to_vec()),
        RawField::new(*b"245", b"Despierta con Cala^ainspiraciones para una vida".to_vec()),
        RawField::new(*b"650", b"Self-actualization (Psychology)".to_vec()),
        RawField::new(*b"650", b"Self-help techniques.".to_vec()),
        RawField::new(*b"650", b"Success.".to_vec()),
    ])
}

fn encode_benchmark(c: &mut Criterion) {
    let geom = Geometry::default();
    let rec = sample_record();
    c.bench_function("encode_record", |b| {
        b.iter(|| {
            let bytes = encode_record(&geom, &rec).unwrap();
            assert!(!bytes.is_empty())
        })
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let geom = Geometry::default();
    let bytes = encode_record(&geom, &sample_record()).unwrap();
    c.bench_function("decode_record", |b| {
        b.iter(|| {
            let (rec, _) = decode_record(&geom, &bytes).unwrap();
            assert!(!rec.fields.is_empty())
        })
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
