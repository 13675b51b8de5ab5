extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use blazecss_lib::{minify, Options};

fn bench_large_stylesheet(c: &mut Criterion) {
    let mut big_css = String::with_capacity(4_000_000);
    for i in 0..20_000 {
        big_css.push_str(&format!(
            ".item-{} {{ color: #ff0000; margin: 0px 0px 0px 0px; padding: {}px }}\n",
            i,
            i % 7
        ));
    }

    c.bench_function("large_stylesheet", |b| b.iter(|| minify(&big_css, &Options::default())));
}

fn bench_repeated_declarations(c: &mut Criterion) {
    let mut css = String::new();
    for i in 0..500 {
        css.push_str(&format!(
            ".a{0}{{background:url(sprite.png) no-repeat;border:1px solid #ccc;width:{0}px}}",
            i
        ));
        css.push_str("@media print{.b{display:none}}");
    }

    c.bench_function("repeated_declarations", |b| b.iter(|| minify(&css, &Options::default())));
}

fn bench_deep_nesting(c: &mut Criterion) {
    let mut deep_css = String::new();
    for _ in 0..50 {
        deep_css.push_str("@supports (display:grid){");
    }
    deep_css.push_str("a{color:red}");
    for _ in 0..50 {
        deep_css.push('}');
    }

    c.bench_function("deep_nesting", |b| b.iter(|| minify(&deep_css, &Options::default())));
}

criterion_group!(benches, bench_large_stylesheet, bench_repeated_declarations, bench_deep_nesting);
criterion_main!(benches);
