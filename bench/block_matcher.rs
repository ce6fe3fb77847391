use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_disparity_tuner::block_matcher::BlockMatcher;
use cv_disparity_tuner::camstream::StereoFrame;
use cv_disparity_tuner::prelude::*;
use opencv::core::{Mat, Scalar, CV_8UC1};
use opencv::prelude::*;

const WIDTH: i32 = 640;
const HEIGHT: i32 = 480;
const SHIFT: i32 = 8;

/// Deterministic texture so the matcher has something to correlate.
fn texture(x: i32, y: i32) -> u8 {
    let h = (x as u32).wrapping_mul(73_856_093) ^ (y as u32).wrapping_mul(19_349_663);
    (h >> 13) as u8
}

/// Synthetic rectified pair where the right view is the left shifted by `SHIFT` pixels.
fn synthetic_frame() -> opencv::Result<StereoFrame> {
    let mut left = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC1, Scalar::all(0.0))?;
    let mut right = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC1, Scalar::all(0.0))?;

    {
        let data = left.data_typed_mut::<u8>()?;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                data[(y * WIDTH + x) as usize] = texture(x, y);
            }
        }
    }
    {
        let data = right.data_typed_mut::<u8>()?;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                data[(y * WIDTH + x) as usize] = texture(x + SHIFT, y);
            }
        }
    }

    Ok(StereoFrame::new(left, right))
}

fn block_matcher_bench(c: &mut Criterion) {
    let frame = synthetic_frame().unwrap();

    let mut params = DisparityParams::default();
    params.num_disparities = 64;
    params.min_disparity = 0;
    params.sigma = 1.5;

    let mut matcher = BlockMatcher::new(&params).unwrap();

    c.bench_function("block matcher + wls 640x480", |b| {
        b.iter(|| matcher.compute(black_box(&frame)))
    });
}

criterion_group!(benches, block_matcher_bench);
criterion_main!(benches);
