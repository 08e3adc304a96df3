use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdiss::{ErrorAnalyzer, MarkdownParser};
use std::time::Duration;

fn report(blocks: usize) -> String {
    (1..=blocks)
        .map(|i| {
            format!(
                "## {i}. Make target: step-{i}\n\n\
                 **Command:** `make step-{i}`\n\
                 **Type:** make_target\n\
                 **Status:** ❌ Failed\n\
                 **Return Code:** 2\n\
                 **Execution Time:** 1.{i}s\n\n\
                 **Output:**\n```\nmake[1]: Entering directory\n## 9. not a title\n```\n\n\
                 **Error Output:**\n```\nnpm error code ENOENT\nnpm error path /srv/app/package.json\n```\n\n\
                 **Metadata:**\n- **target:** step-{i}\n"
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

pub fn parse_benchmark(c: &mut Criterion) {
    let document = report(200);
    let parser = MarkdownParser::new();

    c.bench_function("parse_numbered_report", |b| {
        b.iter(|| parser.parse_content(black_box(&document), "bench.md"))
    });

    let records = parser.parse_content(&document, "bench.md");
    let analyzer = ErrorAnalyzer::new();
    c.bench_function("analyze_records", |b| {
        b.iter(|| analyzer.analyze_all(black_box(&records)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = parse_benchmark
}

criterion_main!(benches);
