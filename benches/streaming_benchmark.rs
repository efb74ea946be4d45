use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use excelexport::fast_writer::SharedStrings;
use excelexport::{ColumnSet, ExportOptions, FieldType, FieldValue, StreamingWorkbook};
use std::io::Cursor;
use tempfile::NamedTempFile;

fn columns() -> ColumnSet {
    ColumnSet::from_fields(
        &[
            ("ID", FieldType::I64),
            ("Name", FieldType::String),
            ("Value", FieldType::F64),
            ("Created", FieldType::DateTime),
        ],
        true,
    )
    .unwrap()
}

fn row(i: i64) -> Vec<FieldValue> {
    vec![
        FieldValue::Int(i),
        FieldValue::Text(format!("Name_{}", i % 1000)),
        FieldValue::Float(i as f64 * 1.5),
        FieldValue::Text("2024-01-15T08:30:00".to_string()),
    ]
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.sample_size(10);

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let temp = NamedTempFile::new().unwrap();
                let mut workbook =
                    StreamingWorkbook::create(temp.path(), columns(), ExportOptions::default()).unwrap();
                for i in 0..size {
                    workbook.write_row(&row(i)).unwrap();
                }
                workbook.close().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_memory");

    for level in [1u32, 6].iter() {
        group.bench_with_input(BenchmarkId::new("compression", level), level, |b, &level| {
            b.iter(|| {
                let options = ExportOptions::default().with_compression_level(level);
                let mut workbook =
                    StreamingWorkbook::from_writer(Cursor::new(Vec::new()), columns(), options).unwrap();
                for i in 0..10_000 {
                    workbook.write_row(&row(i)).unwrap();
                }
                black_box(workbook.into_inner().unwrap().into_inner().len());
            });
        });
    }

    group.finish();
}

fn benchmark_shared_strings(c: &mut Criterion) {
    let values: Vec<String> = (0..100_000).map(|i| format!("value_{}", i % 5_000)).collect();

    c.bench_function("shared_strings_find_or_create", |b| {
        b.iter(|| {
            let mut table = SharedStrings::new();
            for value in &values {
                black_box(table.find_or_create(value));
            }
            table.unique_count()
        });
    });
}

criterion_group!(benches, benchmark_write, benchmark_in_memory, benchmark_shared_strings);
criterion_main!(benches);
