use criterion::{Criterion, black_box, criterion_group, criterion_main};
use li_core::Image;
use li_detect::{InspectConfig, inspect};

fn build_defective_u16(width: usize, height: usize) -> Image<u16> {
    let mut data = vec![0u16; width * height];
    for y in 0..height {
        let level = if y == height / 3 { 3200 } else { 2000 + (y % 5) as u16 };
        for x in 0..width {
            data[y * width + x] = if x == width / 2 { 1200 } else { level };
        }
    }
    Image::from_vec(width, height, data).expect("valid image")
}

fn bench_inspect(c: &mut Criterion) {
    let img = build_defective_u16(2048, 1536);
    let view = img.as_view();
    let cfg = InspectConfig::default();

    c.bench_function("inspect_4ch_2048x1536", |b| {
        b.iter(|| {
            let res = inspect(black_box(&view), black_box(&cfg)).expect("valid input");
            black_box(res.defects.len());
        });
    });
}

fn bench_inspect_16ch(c: &mut Criterion) {
    let img = build_defective_u16(2048, 1536);
    let view = img.as_view();
    let cfg = InspectConfig {
        channel_count: 16,
        ..InspectConfig::default()
    };

    c.bench_function("inspect_16ch_2048x1536", |b| {
        b.iter(|| {
            let res = inspect(black_box(&view), black_box(&cfg)).expect("valid input");
            black_box(res.defects.len());
        });
    });
}

criterion_group!(benches, bench_inspect, bench_inspect_16ch);
criterion_main!(benches);
