use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use std::time::Duration;

use eegstim_render::{blit_premultiplied, stack_layout};
use tiny_skia::{Color, Pixmap};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

/// Stand-in for a rasterised text line: opaque body with translucent edges.
fn glyph_strip(width: u32, height: u32) -> Pixmap {
    let mut pm = Pixmap::new(width, height).unwrap();
    pm.fill(Color::from_rgba8(0x66, 0xcc, 0xff, 0xff));
    let stride = width as usize * 4;
    for row in pm.data_mut().chunks_mut(stride).step_by(3) {
        for px in row.chunks_mut(4).step_by(2) {
            px.copy_from_slice(&[0x33, 0x66, 0x80, 0x80]);
        }
    }
    pm
}

fn background() -> Pixmap {
    let mut pm = Pixmap::new(WIDTH, HEIGHT).unwrap();
    pm.fill(Color::from_rgba8(0x2b, 0x2b, 0x2b, 0xff));
    pm
}

/// Benchmarks `blit_premultiplied` for line sizes seen on trial screens.
pub fn bench_blit(c: &mut Criterion) {
    let mut group = c.benchmark_group("blit_premultiplied");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2));

    for (name, w, h) in [("caption", 80, 24), ("prompt", 900, 48), ("highlight", 220, 80)] {
        let src = glyph_strip(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(name), &src, |b, src| {
            let mut canvas = background();
            let x = (WIDTH - w) as i32 / 2;
            let y = (HEIGHT - h) as i32 / 2;
            b.iter(|| black_box(blit_premultiplied(&mut canvas, src, black_box(x), black_box(y))));
        });
    }

    group.finish();
}

/// Full stack of a counting trial: layout plus four blits.
pub fn bench_trial_stack(c: &mut Criterion) {
    let lines = [
        glyph_strip(900, 48),
        glyph_strip(220, 80),
        glyph_strip(60, 24),
        glyph_strip(100, 24),
    ];
    let sizes: Vec<(u32, u32)> = lines.iter().map(|p| (p.width(), p.height())).collect();

    c.bench_function("trial_stack", |b| {
        let mut canvas = background();
        b.iter(|| {
            for (pm, (x, y)) in lines.iter().zip(stack_layout(&sizes, WIDTH, HEIGHT, 18)) {
                blit_premultiplied(&mut canvas, pm, x, y);
            }
            black_box(canvas.data().len())
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02)
        .significance_level(0.05);
    targets = bench_blit, bench_trial_stack
}

criterion_main!(benches);
