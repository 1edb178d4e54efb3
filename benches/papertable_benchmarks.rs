use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use papertable::*;

const JOURNALS: [&str; 5] = ["IEEE Access", "Sensors", "Electronics", "Microelectronics Reliability", ""];

/// Deterministic rows with a spread of marks, years and journals
fn make_rows(size: usize) -> Vec<RowEntry> {
    (0..size)
        .map(|i| {
            let mut row = PaperRow::new(format!("p{:05}", i));
            row.title = format!("Paper {}", i % (size / 2 + 1));
            row.journal = JOURNALS[i % JOURNALS.len()].to_string();
            row.year = (2000 + (i % 25)).to_string();
            row.page_count = if i % 7 == 0 { String::new() } else { (i % 20).to_string() };
            row.pub_type = if i % 3 == 0 { "article" } else { "inproceedings" }.to_string();
            let mark = |n: usize| match (i / n) % 3 {
                0 => Mark::Yes,
                1 => Mark::No,
                _ => Mark::Unknown,
            };
            let row = row
                .with_mark(Field::IsOfftopic, mark(11))
                .with_mark(Field::IsSurvey, mark(5))
                .with_mark(Field::FeaturesTracks, mark(2))
                .with_mark(Field::FeaturesSolderVoid, mark(3))
                .with_mark(Field::TechniqueDlCnnDetector, mark(4));
            RowEntry::new(row, DetailRow::default())
        })
        .collect()
}

fn session_with(size: usize) -> TableSession {
    let config = ViewConfig {
        initial_sort: None,
        ..Default::default()
    };
    TableSession::with_entries(config, make_rows(size)).unwrap()
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute_pass");

    for size in [100, 1000, 10000].iter() {
        let mut session = session_with(*size);
        session.set_filter(FilterState {
            hide_offtopic: true,
            min_page_count: Some(3),
            ..Default::default()
        });
        session.click_sort("year").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(session.recompute().visible));
        });
    }
    group.finish();
}

fn bench_search_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_filter");

    for size in [100, 1000, 10000].iter() {
        let mut store = RowStore::from_entries(make_rows(*size)).unwrap();
        let state = FilterState {
            search: "sensors".to_string(),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(filter::apply(&mut store, black_box(&state))));
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_visible");

    for size in [100, 1000, 10000].iter() {
        let entries = make_rows(*size);
        let rows: Vec<&PaperRow> = entries.iter().map(|e| &e.row).collect();

        group.bench_with_input(BenchmarkId::new("year", size), size, |b, _| {
            b.iter(|| {
                let mut ordered = rows.clone();
                sort(&mut ordered, SortColumn::Year, SortDirection::Descending);
                black_box(ordered.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("journal", size), size, |b, _| {
            b.iter(|| {
                let mut ordered = rows.clone();
                sort(&mut ordered, SortColumn::Journal, SortDirection::Ascending);
                black_box(ordered.len())
            });
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [100, 1000, 10000].iter() {
        let entries = make_rows(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let (counts, yearly) = aggregate(entries.iter().map(|e| &e.row));
                black_box((counts.visible, yearly.is_empty()))
            });
        });
    }
    group.finish();
}

fn bench_shading(c: &mut Criterion) {
    let mut group = c.benchmark_group("shading");

    for size in [100, 1000, 10000].iter() {
        let entries = make_rows(*size);
        let config = ShadingConfig::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(shade(entries.iter().map(|e| &e.row), &config).duplicate_titles));
        });
    }
    group.finish();
}

fn bench_markup_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("markup_parse");

    for size in [100, 1000].iter() {
        let fragment: String = (0..*size)
            .map(|i| {
                format!(
                    r#"<tr data-paper-id="{i}"><td data-col="title">Paper {i}</td><td data-col="year">{y}</td><td data-field="is_survey">✔️</td></tr><tr class="detail-row"><td>Abstract {i}</td></tr>"#,
                    i = i,
                    y = 2000 + i % 25
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(markup::parse_rows(&fragment).unwrap().len()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_recompute,
    bench_search_filter,
    bench_sort,
    bench_aggregate,
    bench_shading,
    bench_markup_parse
);
criterion_main!(benches);
