use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use redline::document::DocumentSink;
use redline::docx::{parse_document_xml, DocxSink};
use redline::{classify_line, count_lines, mark_duplicates, FrequencyTable};

const LINE_COUNT: usize = 10_000;

/// Synthetic document: short comma-separated lines with frequent adjacent repeats
fn synthetic_lines() -> Vec<String> {
    (0..LINE_COUNT)
        .map(|i| {
            let group = i / 3;
            format!("tag{},Item{},note{}", group % 97, group % 13, group % 7)
        })
        .collect()
}

fn synthetic_table() -> FrequencyTable {
    (0..97u64).map(|i| (format!("tag{i}"), i % 11)).collect()
}

fn bench_line_transforms(c: &mut Criterion) {
    // WHY: the core transforms are linear scans; catch regressions in per-line cost
    let lines = synthetic_lines();
    let table = synthetic_table();

    let mut group = c.benchmark_group("line_transforms");
    group.throughput(Throughput::Elements(LINE_COUNT as u64));

    group.bench_function("count_lines", |b| {
        b.iter(|| black_box(count_lines(black_box(&lines))))
    });

    group.bench_function("mark_duplicates", |b| {
        b.iter(|| black_box(mark_duplicates(black_box(&lines))))
    });

    group.bench_function("classify_lines", |b| {
        b.iter(|| {
            let rows: Vec<_> = lines.iter().map(|line| classify_line(line, &table).to_row()).collect();
            black_box(rows)
        })
    });

    group.finish();
}

fn bench_docx_round_trip(c: &mut Criterion) {
    // WHY: XML writing and parsing dominate end-to-end time on large documents
    let annotated = mark_duplicates(&synthetic_lines());
    let rendered = DocxSink::default().render(&annotated).unwrap();
    let document_xml = {
        let mut package = redline::package::OpcPackage::open(&rendered).unwrap();
        package.read_part("word/document.xml").unwrap()
    };

    let mut group = c.benchmark_group("docx");
    group.sample_size(20); // WHY: each iteration zips the whole document

    group.bench_function("render", |b| {
        b.iter(|| black_box(DocxSink::default().render(black_box(&annotated)).unwrap()))
    });

    group.bench_function("parse_document_xml", |b| {
        b.iter(|| black_box(parse_document_xml(black_box(&document_xml)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_line_transforms, bench_docx_round_trip);
criterion_main!(benches);
