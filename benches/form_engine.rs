use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use intake::adapters::InMemoryFormApi;
use intake::domain::{FieldDescriptor, FormSchema};
use intake::engine::kind::StaticResolver;
use intake::engine::session::{FormSession, SessionOptions};
use intake::engine::submission::SubmissionPayload;
use intake::engine::validation::{collect_violations, validate_required};
use intake::engine::values::{FileHandle, FileMap, FormValues, ResolvedField, PDF_MEDIA_TYPE};
use std::sync::Arc;

fn wide_form(size: usize) -> Vec<FieldDescriptor> {
    (0..size)
        .map(|i| FieldDescriptor {
            field_id: format!("field_{}", i),
            field_type_id: (i % 5) as i64 + 1,
            label: format!("Question {}", i),
            required: i % 2 == 0,
            options: None,
        })
        .collect()
}

fn filled(size: usize) -> (Vec<ResolvedField>, FormValues, FileMap) {
    let fields = ResolvedField::resolve_all(&wide_form(size), &StaticResolver);
    let mut values = FormValues::seed(&fields);
    let mut files = FileMap::seed(&fields);
    for field in &fields {
        if field.kind.is_file() {
            files.set(
                field.field_id(),
                Some(FileHandle::new("cv.pdf", PDF_MEDIA_TYPE, vec![0u8; 4096])),
            );
        } else if !field.kind.is_flag() {
            values.replace(field.field_id(), "answer".into());
        }
    }
    (fields, values, files)
}

fn benchmark_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    for size in [10usize, 100, 1000] {
        let (fields, values, files) = filled(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fail_fast", size), &size, |b, _| {
            b.iter(|| validate_required(black_box(&fields), black_box(&values), black_box(&files)))
        });
        group.bench_with_input(BenchmarkId::new("collect_all", size), &size, |b, _| {
            b.iter(|| collect_violations(black_box(&fields), black_box(&values), black_box(&files)))
        });
    }
    group.finish();
}

fn benchmark_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");
    for size in [10usize, 100, 1000] {
        let (_, values, files) = filled(size);
        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, _| {
            b.iter(|| SubmissionPayload::build(black_box(&values), black_box(&files)))
        });
    }
    group.finish();
}

fn benchmark_submit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let api = Arc::new(InMemoryFormApi::new());
    let form_id = rt.block_on(api.insert_form(FormSchema {
        title: "Bench".into(),
        description: String::new(),
        fields: wide_form(20),
    }));

    c.bench_function("session_open_and_submit", |b| {
        b.to_async(&rt).iter(|| {
            let api = api.clone();
            async move {
                let session = FormSession::open(
                    form_id,
                    api,
                    Arc::new(StaticResolver),
                    SessionOptions::default(),
                )
                .await;
                for field in session.fields().await {
                    if field.kind.is_file() {
                        let file = FileHandle::new("cv.pdf", PDF_MEDIA_TYPE, &b"%PDF"[..]);
                        session.set_file(field.field_id(), Some(file)).await.unwrap();
                    } else if !field.kind.is_flag() {
                        session.set_value(field.field_id(), "answer").await.unwrap();
                    }
                }
                black_box(session.submit().await.unwrap())
            }
        })
    });
}

criterion_group!(benches, benchmark_validation, benchmark_payload, benchmark_submit);
criterion_main!(benches);
