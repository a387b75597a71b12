//! Benchmarks for result parsing and URL normalization.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use websift::normalize::normalize_url;
use websift::providers::{BingParser, DuckDuckGoParser, ResultParser};

fn bing_page(results: usize) -> Vec<u8> {
    let mut html = String::from("<html><body><ol id=\"b_results\">");
    for i in 0..results {
        html.push_str(&format!(
            "<li class=\"b_algo\"><h2><a href=\"https://site{i}.example.com/page\">Result {i}</a></h2><p>snippet</p></li>"
        ));
    }
    html.push_str("</ol></body></html>");
    html.into_bytes()
}

fn duckduckgo_page(results: usize) -> Vec<u8> {
    let mut html = String::from("<html><body>");
    for i in 0..results {
        html.push_str(&format!(
            "<div class=\"result\"><h2>Result {i}</h2><a href=\"//duckduckgo.com/l/?uddg=https%3A%2F%2Fsite{i}.example.com%2F&amp;rut=abc\">link</a></div>"
        ));
    }
    html.push_str("</body></html>");
    html.into_bytes()
}

fn parse_benchmark(c: &mut Criterion) {
    let bing = bing_page(20);
    let ddg = duckduckgo_page(20);

    c.bench_function("parse_bing_20", |b| {
        b.iter(|| BingParser.parse(black_box(&bing)))
    });
    c.bench_function("parse_duckduckgo_20", |b| {
        b.iter(|| DuckDuckGoParser.parse(black_box(&ddg)))
    });
}

fn normalize_benchmark(c: &mut Criterion) {
    c.bench_function("normalize_yahoo_redirect", |b| {
        b.iter(|| {
            normalize_url(black_box(
                "https://r.search.yahoo.com/_ylt=x/RV=2/RE=1/RO=10/RU=https%3a%2f%2fwww.rust-lang.org%2f/RK=2/RS=abc",
            ))
        })
    });
}

criterion_group!(benches, parse_benchmark, normalize_benchmark);
criterion_main!(benches);
