use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use og_image::fonts::FontAssets;
use og_image::template::{Composer, ComposerConfig};
use og_image::{emoji, markdown, parse_request};

const URL: &str = "/**Hello**%20_world_%20%F0%9F%91%8B%F0%9F%8F%BD%20%F0%9F%87%B0%F0%9F%87%B7.png?md=1&theme=dark&images=https%3A%2F%2Fexample.com%2Fa.svg&images=https%3A%2F%2Fexample.com%2Fb.svg&widths=300";

fn bench_parse_request(c: &mut Criterion) {
    c.bench_function("parse_request", |b| {
        b.iter(|| parse_request(black_box(URL), "localhost").unwrap())
    });
}

fn bench_compose(c: &mut Criterion) {
    // font payloads dominate document size; use something close to a real woff2
    let regular = vec![0x5a_u8; 700 * 1024];
    let bold = vec![0xa5_u8; 700 * 1024];
    let composer = Composer::new(
        Arc::new(FontAssets::from_bytes(&regular, &bold)),
        ComposerConfig::default(),
    );
    let req = parse_request(URL, "localhost").unwrap();

    c.bench_function("compose", |b| b.iter(|| composer.compose(black_box(&req))));
}

fn bench_heading_transforms(c: &mut Criterion) {
    let text = "**Ship** it _today_ 🚀👩‍👩‍👧‍👦 1️⃣ ".repeat(16);

    c.bench_function("markdown_expand", |b| {
        b.iter(|| markdown::expand(black_box(&text)))
    });
    c.bench_function("emojify", |b| b.iter(|| emoji::emojify(black_box(&text))));
}

criterion_group!(benches, bench_parse_request, bench_compose, bench_heading_transforms);
criterion_main!(benches);
