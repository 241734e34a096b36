use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use backdrop_studio::{composite_images, layout, render_export, Effect, ExportRequest};
use chrono::NaiveDate;
use image::{DynamicImage, Rgba, RgbaImage};

fn subject(width: u32, height: u32) -> DynamicImage {
    // Opaque ellipse on a transparent field, like a typical cutout
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let dx = (x as f32 - cx) / cx;
        let dy = (y as f32 - cy) / cy;
        if dx * dx + dy * dy <= 1.0 {
            Rgba([220, 180, 150, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

fn background(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    }))
}

fn benchmark_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite");
    group.sample_size(10);

    let cutout = subject(600, 900);
    for (width, height) in [(640, 480), (1920, 1080), (3840, 2160)] {
        let bg = background(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &bg,
            |b, bg| b.iter(|| composite_images(black_box(&cutout), black_box(bg)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("effects");
    group.sample_size(10);

    let source = background(1080, 1080).to_rgba8();
    for effect in Effect::ALL {
        group.bench_function(effect.id(), |b| {
            b.iter(|| {
                let mut image = source.clone();
                effect.apply(black_box(&mut image));
                image
            });
        });
    }

    group.finish();
}

fn benchmark_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.sample_size(10);

    let source = background(1920, 1080).to_rgba8();
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap_or_default();
    for id in layout::LAYOUTS.map(|l| l.id) {
        let target = layout::find(id).unwrap();
        let request = ExportRequest::new("Bench Brand", target, Effect::Warm).with_date(date);
        group.bench_function(id, |b| {
            b.iter(|| render_export(black_box(&source), &request).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    compositing_benches,
    benchmark_composite,
    benchmark_effects,
    benchmark_export
);
criterion_main!(compositing_benches);
