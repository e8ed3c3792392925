use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tiktok_crosspost::models::PublishRequest;
use tiktok_crosspost::services::media;
use tiktok_crosspost::services::post_text::{build_post_text, TITLE_MAX_CHARS};

fn benchmark_post_text(c: &mut Criterion) {
    let tags: Vec<String> = ["launch", "music", "behindthescenes", "tour2026"]
        .iter()
        .map(|t| t.to_string())
        .collect();
    let long_description = "Recorded live at the harbour stage, ".repeat(20);

    let mut group = c.benchmark_group("post_text");

    group.bench_function("short_with_hashtags", |b| {
        b.iter(|| {
            build_post_text(
                black_box("Launch day"),
                black_box("New single out now"),
                black_box(&tags),
                TITLE_MAX_CHARS,
            )
        })
    });

    group.bench_function("long_truncated", |b| {
        b.iter(|| {
            build_post_text(
                black_box("Live set"),
                black_box(&long_description),
                black_box(&tags),
                TITLE_MAX_CHARS,
            )
        })
    });

    group.finish();
}

fn benchmark_media_resolution(c: &mut Criterion) {
    let request = PublishRequest {
        image_urls: (0..60)
            .map(|i| format!("https://media.example.com/img/{}.jpg", i))
            .collect(),
        ..Default::default()
    };

    c.bench_function("resolve_oversized_carousel", |b| {
        b.iter(|| media::resolve(black_box(&request)))
    });
}

criterion_group!(benches, benchmark_post_text, benchmark_media_resolution);
criterion_main!(benches);
