/// Decoder and query pipeline benchmarks
///
/// Builds synthetic allocation dumps in memory and measures decode
/// throughput over growing record counts, plus the query stages that
/// dominate interactive use: filtering, grouping and trace transforms.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use desglose::dump;
use desglose::filter::FilterSpec;
use desglose::query::{run_query, QueryParams};
use desglose::sort::SortSpec;
use desglose::transform::TraceTransform;
use std::time::Duration;

const CLASS_COUNT: u16 = 64;
const METHOD_COUNT: u16 = 32;
const FILE_COUNT: u16 = 16;
const STACK_DEPTH: u8 = 4;

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().collect();
    put_u32(buf, units.len() as u32);
    for u in units {
        put_u16(buf, u);
    }
}

/// Synthetic dump with `entry_count` entries of fixed stack depth, cycling
/// through the string tables.
fn build_dump(entry_count: u16) -> Vec<u8> {
    let mut buf = vec![15u8, 9, 8];
    put_u16(&mut buf, entry_count);
    let offset_pos = buf.len();
    put_u32(&mut buf, 0); // patched after the entry region
    put_u16(&mut buf, CLASS_COUNT);
    put_u16(&mut buf, METHOD_COUNT);
    put_u16(&mut buf, FILE_COUNT);

    for i in 0..entry_count {
        put_u32(&mut buf, u32::from(i % 4096) + 16);
        put_u16(&mut buf, i % 8);
        put_u16(&mut buf, i % CLASS_COUNT);
        buf.push(STACK_DEPTH);
        for d in 0..u16::from(STACK_DEPTH) {
            put_u16(&mut buf, (i + d) % CLASS_COUNT);
            put_u16(&mut buf, (i + d) % METHOD_COUNT);
            put_u16(&mut buf, (i + d) % FILE_COUNT);
            put_u16(&mut buf, i % 500);
        }
    }

    let table_offset = buf.len() as u32;
    buf[offset_pos..offset_pos + 4].copy_from_slice(&table_offset.to_be_bytes());
    for i in 0..CLASS_COUNT {
        put_string(&mut buf, &format!("Lcom/app/gen/Class{};", i));
    }
    for i in 0..METHOD_COUNT {
        put_string(&mut buf, &format!("method{}", i));
    }
    for i in 0..FILE_COUNT {
        put_string(&mut buf, &format!("Class{}.java", i));
    }
    buf
}

/// Raw decode throughput in bytes and records.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    for entry_count in [1_000u16, 10_000, 50_000] {
        let buf = build_dump(entry_count);
        group.throughput(Throughput::Bytes(buf.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entry_count),
            &buf,
            |b, buf| {
                b.iter(|| {
                    let records = dump::decode(black_box(buf)).unwrap();
                    black_box(records);
                });
            },
        );
    }

    group.finish();
}

/// Query stages over already-decoded records.
fn bench_query_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let buf = build_dump(10_000);
    let records = dump::decode(&buf).unwrap();
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("filter_numeric", |b| {
        let params = QueryParams {
            filters: vec![FilterSpec::parse("size", "gt:2048").unwrap()],
            ..QueryParams::default()
        };
        b.iter(|| {
            let out = run_query(black_box(records.clone()), &params).unwrap();
            black_box(out);
        });
    });

    group.bench_function("filter_regex", |b| {
        let params = QueryParams {
            filters: vec![FilterSpec::parse("allocatedClass", "re:com\\.app\\..*").unwrap()],
            ..QueryParams::default()
        };
        b.iter(|| {
            let out = run_query(black_box(records.clone()), &params).unwrap();
            black_box(out);
        });
    });

    group.bench_function("group_by_class", |b| {
        let params = QueryParams {
            group_by: Some("allocatedClass".to_string()),
            weight: "size".to_string(),
            sort: SortSpec::parse_list("-weight,group").unwrap(),
            ..QueryParams::default()
        };
        b.iter(|| {
            let out = run_query(black_box(records.clone()), &params).unwrap();
            black_box(out);
        });
    });

    group.bench_function("transform_and_split", |b| {
        let params = QueryParams {
            transforms: vec![TraceTransform::parse("prune:underPackage:com.app").unwrap()],
            split_by_trace: true,
            ..QueryParams::default()
        };
        b.iter(|| {
            let out = run_query(black_box(records.clone()), &params).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

/// End-to-end: bytes in, aggregated table out.
fn bench_decode_and_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let buf = build_dump(10_000);
    group.throughput(Throughput::Bytes(buf.len() as u64));

    let params = QueryParams {
        group_by: Some("allocatedClass".to_string()),
        weight: "size".to_string(),
        sort: SortSpec::parse_list("-weight,group").unwrap(),
        ..QueryParams::default()
    };

    group.bench_function("decode_group_sort", |b| {
        b.iter(|| {
            let records = dump::decode(black_box(&buf)).unwrap();
            let out = run_query(records, &params).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_query_stages, bench_decode_and_aggregate);

criterion_main!(benches);
