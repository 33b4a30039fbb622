//! Block-matching motion estimation and compensation.
//!
//! Vectors are full-pel luma displacements, one per `block_size` square,
//! stored row-major. Chroma reuses them halved (truncated toward zero) on
//! half-size windows.

use rayon::prelude::*;

use crate::error::{try_alloc, Error, Result};
use crate::image::{Picture, PixelPlane};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MotionVector {
    pub dx: i32,
    pub dy: i32,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> MotionVector {
        MotionVector { dx, dy }
    }
}

/// Per-frame vectors indexed by `row * cols + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionField {
    pub vectors: Vec<MotionVector>,
    pub cols: usize,
    pub rows: usize,
    pub block_size: usize,
}

impl MotionField {
    pub fn get(&self, col: usize, row: usize) -> MotionVector {
        self.vectors[row * self.cols + col]
    }

    /// Mean of `|dx| + |dy|` over all blocks.
    pub fn mean_magnitude(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        let total: i64 = self
            .vectors
            .iter()
            .map(|v| (v.dx.abs() + v.dy.abs()) as i64)
            .sum();
        total as f64 / self.vectors.len() as f64
    }
}

/// A referenced window that would leave the frame. Never escapes this
/// module: search skips such candidates, compensation clamps them.
struct OutOfBounds;

fn displaced_origin(
    origin: (usize, usize),
    vector: MotionVector,
    size: usize,
    dims: (usize, usize),
) -> std::result::Result<(usize, usize), OutOfBounds> {
    let x = origin.0 as i64 + vector.dx as i64;
    let y = origin.1 as i64 + vector.dy as i64;
    if x < 0 || y < 0 || x + size as i64 > dims.0 as i64 || y + size as i64 > dims.1 as i64 {
        return Err(OutOfBounds);
    }
    Ok((x as usize, y as usize))
}

fn clamped_origin(
    origin: (usize, usize),
    vector: MotionVector,
    size: usize,
    dims: (usize, usize),
) -> (usize, usize) {
    let max_x = dims.0.saturating_sub(size) as i64;
    let max_y = dims.1.saturating_sub(size) as i64;
    let x = (origin.0 as i64 + vector.dx as i64).clamp(0, max_x);
    let y = (origin.1 as i64 + vector.dy as i64).clamp(0, max_y);
    (x as usize, y as usize)
}

/// Sum of absolute differences between two `block_size` windows.
pub fn compute_sad(
    current: &PixelPlane,
    reference: &PixelPlane,
    block_origin: (usize, usize),
    ref_origin: (usize, usize),
    block_size: usize,
) -> u32 {
    let mut sad = 0u32;
    for row in 0..block_size {
        let a = &current.row(block_origin.1 + row)[block_origin.0..block_origin.0 + block_size];
        let b = &reference.row(ref_origin.1 + row)[ref_origin.0..ref_origin.0 + block_size];
        sad += a
            .iter()
            .zip(b)
            .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
            .sum::<u32>();
    }
    sad
}

/// Blocks whose zero-vector SAD is below one per sample are static.
pub fn static_threshold(block_size: usize) -> u32 {
    (block_size * block_size) as u32
}

/// Exhaustive raster search; ties keep the earliest candidate.
pub fn find_motion_vector(
    current: &PixelPlane,
    reference: &PixelPlane,
    block_origin: (usize, usize),
    block_size: usize,
    search_range: i32,
) -> MotionVector {
    let dims = (reference.width(), reference.height());

    let zero_sad = compute_sad(current, reference, block_origin, block_origin, block_size);
    if zero_sad < static_threshold(block_size) {
        return MotionVector::ZERO;
    }

    let mut best = MotionVector::ZERO;
    let mut best_sad = u32::MAX;
    for dy in -search_range..=search_range {
        for dx in -search_range..=search_range {
            let candidate = MotionVector::new(dx, dy);
            let ref_origin = match displaced_origin(block_origin, candidate, block_size, dims) {
                Ok(origin) => origin,
                Err(OutOfBounds) => continue,
            };
            let sad = compute_sad(current, reference, block_origin, ref_origin, block_size);
            if sad < best_sad {
                best_sad = sad;
                best = candidate;
            }
        }
    }
    best
}

/// Motion search for every `block_size` block of the luma planes.
pub fn estimate_motion(
    current: &PixelPlane,
    reference: &PixelPlane,
    block_size: usize,
    search_range: i32,
) -> Result<MotionField> {
    if current.width() != reference.width() || current.height() != reference.height() {
        return Err(Error::format(format!(
            "reference is {}x{}, current is {}x{}",
            reference.width(),
            reference.height(),
            current.width(),
            current.height()
        )));
    }
    if block_size == 0 || current.width() % block_size != 0 || current.height() % block_size != 0 {
        return Err(Error::configuration(format!(
            "block size {} does not tile {}x{}",
            block_size,
            current.width(),
            current.height()
        )));
    }
    let cols = current.width() / block_size;
    let rows = current.height() / block_size;

    let vectors = (0..cols * rows)
        .into_par_iter()
        .map(|index| {
            let origin = ((index % cols) * block_size, (index / cols) * block_size);
            find_motion_vector(current, reference, origin, block_size, search_range)
        })
        .collect::<Vec<MotionVector>>();

    Ok(MotionField {
        vectors,
        cols,
        rows,
        block_size,
    })
}

/// Copy each referenced window into a fresh plane. `subsampling` is 1 for
/// luma and 2 for chroma.
fn predict_plane(
    reference: &PixelPlane,
    field: &MotionField,
    subsampling: usize,
) -> Result<PixelPlane> {
    let (width, height) = (reference.width(), reference.height());
    let size = field.block_size / subsampling;
    if field.cols * size != width || field.rows * size != height {
        return Err(Error::format(format!(
            "motion field {}x{} of {} does not cover a {}x{} plane",
            field.cols, field.rows, field.block_size, width, height
        )));
    }

    let mut predicted = try_alloc::<u8>(width * height, "predicted plane")?;
    for row in 0..field.rows {
        for col in 0..field.cols {
            let vector = field.get(col, row);
            let scaled = MotionVector::new(
                vector.dx / subsampling as i32,
                vector.dy / subsampling as i32,
            );
            let origin = (col * size, row * size);
            let (sx, sy) = clamped_origin(origin, scaled, size, (width, height));
            for y in 0..size {
                let src = &reference.row(sy + y)[sx..sx + size];
                let start = (origin.1 + y) * width + origin.0;
                predicted[start..start + size].copy_from_slice(src);
            }
        }
    }
    PixelPlane::new(width, height, predicted)
}

/// Forward prediction of a P picture from `reference`.
pub fn compensate(reference: &Picture, field: &MotionField) -> Result<Picture> {
    Ok(Picture {
        y: predict_plane(&reference.y, field, 1)?,
        cb: predict_plane(&reference.cb, field, 2)?,
        cr: predict_plane(&reference.cr, field, 2)?,
    })
}

fn average_planes(past: &PixelPlane, future: &PixelPlane) -> Result<PixelPlane> {
    let mut averaged = try_alloc::<u8>(past.data().len(), "bidirectional plane")?;
    for ((out, &a), &b) in averaged.iter_mut().zip(past.data()).zip(future.data()) {
        *out = ((a as u16 + b as u16) / 2) as u8;
    }
    PixelPlane::new(past.width(), past.height(), averaged)
}

/// B prediction: the past window (via `backward`) and the future window
/// (via `forward`) averaged, truncating.
pub fn compensate_bidirectional(
    past: &Picture,
    backward: &MotionField,
    future: &Picture,
    forward: &MotionField,
) -> Result<Picture> {
    let from_past = compensate(past, backward)?;
    let from_future = compensate(future, forward)?;
    Ok(Picture {
        y: average_planes(&from_past.y, &from_future.y)?,
        cb: average_planes(&from_past.cb, &from_future.cb)?,
        cr: average_planes(&from_past.cr, &from_future.cr)?,
    })
}

/// `current - predicted`, sample by sample.
pub fn residual(current: &PixelPlane, predicted: &PixelPlane) -> Result<Vec<i16>> {
    if current.data().len() != predicted.data().len() {
        return Err(Error::format(format!(
            "prediction has {} samples, current plane {}",
            predicted.data().len(),
            current.data().len()
        )));
    }
    let mut out = try_alloc::<i16>(current.data().len(), "residual plane")?;
    for ((r, &c), &p) in out.iter_mut().zip(current.data()).zip(predicted.data()) {
        *r = c as i16 - p as i16;
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn textured(width: usize, height: usize, seed: u32) -> PixelPlane {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect();
        PixelPlane::new(width, height, data).unwrap()
    }

    /// `source` content moved by (dx, dy): current(x, y) = source(x - dx, y - dy),
    /// so the matching reference window sits at `origin - (dx, dy)`.
    fn shifted(source: &PixelPlane, dx: i32, dy: i32) -> PixelPlane {
        let (w, h) = (source.width() as i32, source.height() as i32);
        let mut data = vec![0u8; (w * h) as usize];
        for y in 0..h {
            for x in 0..w {
                let sx = (x - dx).clamp(0, w - 1);
                let sy = (y - dy).clamp(0, h - 1);
                data[(y * w + x) as usize] = source.get(sx as usize, sy as usize);
            }
        }
        PixelPlane::new(w as usize, h as usize, data).unwrap()
    }

    #[test]
    fn test_sad_identity_and_symmetry() {
        let a = textured(32, 32, 1);
        let b = textured(32, 32, 2);
        assert_eq!(compute_sad(&a, &a, (8, 8), (8, 8), 16), 0);
        for &(o1, o2) in &[((0, 0), (0, 0)), ((8, 0), (3, 5)), ((16, 16), (0, 16))] {
            assert_eq!(compute_sad(&a, &b, o1, o2, 16), compute_sad(&b, &a, o2, o1, 16));
        }
        assert_eq!(compute_sad(&a, &b, (4, 4), (4, 4), 8), compute_sad(&b, &a, (4, 4), (4, 4), 8));
    }

    #[test]
    fn test_finds_exact_shift() {
        let reference = textured(64, 64, 7);
        for &(dx, dy) in &[(3, -2), (-5, 4), (0, 6), (7, 7)] {
            let current = shifted(&reference, dx, dy);
            let vector = find_motion_vector(&current, &reference, (24, 24), 16, 8);
            assert_eq!(vector, MotionVector::new(-dx, -dy));
            let origin = displaced_origin((24, 24), vector, 16, (64, 64)).ok().unwrap();
            assert_eq!(compute_sad(&current, &reference, (24, 24), origin, 16), 0);
        }
    }

    #[test]
    fn test_static_block_skips_search() {
        let reference = textured(32, 32, 3);
        let mut data = reference.data().to_vec();
        // one changed sample differs by at most 255, under the 256 threshold
        data[0] = data[0].wrapping_add(1);
        let current = PixelPlane::new(32, 32, data).unwrap();
        assert_eq!(find_motion_vector(&current, &reference, (0, 0), 16, 16), MotionVector::ZERO);
    }

    #[test]
    fn test_search_skips_out_of_frame_candidates() {
        let reference = textured(32, 32, 11);
        let current = textured(32, 32, 12);
        for &origin in &[(0, 0), (16, 16), (0, 16)] {
            let vector = find_motion_vector(&current, &reference, origin, 16, 32);
            assert!(displaced_origin(origin, vector, 16, (32, 32)).is_ok());
        }
    }

    #[test]
    fn test_ties_keep_earliest_candidate() {
        // flat reference: every candidate has the same SAD
        let reference = PixelPlane::filled(48, 48, 100).unwrap();
        let current = PixelPlane::filled(48, 48, 50).unwrap();
        let vector = find_motion_vector(&current, &reference, (16, 16), 16, 4);
        assert_eq!(vector, MotionVector::new(-4, -4));
    }

    #[test]
    fn test_estimate_motion_is_row_major() {
        let reference = textured(64, 32, 5);
        let current = shifted(&reference, 2, 0);
        let field = estimate_motion(&current, &reference, 16, 4).unwrap();
        assert_eq!((field.cols, field.rows), (4, 2));
        assert_eq!(field.vectors.len(), 8);
        // blocks away from the clamped left edge see the exact shift
        for row in 0..2 {
            for col in 1..4 {
                assert_eq!(field.get(col, row), MotionVector::new(-2, 0));
            }
        }
    }

    #[test]
    fn test_compensate_copies_windows() {
        let reference = Picture {
            y: textured(32, 32, 21),
            cb: textured(16, 16, 22),
            cr: textured(16, 16, 23),
        };
        let field = MotionField {
            vectors: vec![
                MotionVector::new(3, 2),
                MotionVector::ZERO,
                MotionVector::new(-3, 0),
                MotionVector::new(0, -1),
            ],
            cols: 2,
            rows: 2,
            block_size: 16,
        };
        let predicted = compensate(&reference, &field).unwrap();
        assert_eq!(predicted.y.get(0, 0), reference.y.get(3, 2));
        assert_eq!(predicted.y.get(20, 5), reference.y.get(20, 5));
        assert_eq!(predicted.y.get(16, 16), reference.y.get(16, 15));
        // chroma vector (3, 2) / 2 = (1, 1)
        assert_eq!(predicted.cb.get(0, 0), reference.cb.get(1, 1));
        // (-3, 0) / 2 = (-1, 0) at chroma origin (0, 8) clamps to x = 0
        assert_eq!(predicted.cr.get(0, 8), reference.cr.get(0, 8));
    }

    #[test]
    fn test_compensate_clamps_out_of_frame_vectors() {
        let reference = Picture {
            y: textured(16, 16, 31),
            cb: textured(8, 8, 32),
            cr: textured(8, 8, 33),
        };
        let field = MotionField {
            vectors: vec![MotionVector::new(-9, 40)],
            cols: 1,
            rows: 1,
            block_size: 16,
        };
        assert_eq!(compensate(&reference, &field).unwrap(), reference);
    }

    #[test]
    fn test_bidirectional_average_truncates() {
        let past = Picture::filled(16, 16, 10, 20, 30).unwrap();
        let future = Picture::filled(16, 16, 13, 21, 30).unwrap();
        let zero = MotionField {
            vectors: vec![MotionVector::ZERO],
            cols: 1,
            rows: 1,
            block_size: 16,
        };
        let predicted = compensate_bidirectional(&past, &zero, &future, &zero).unwrap();
        assert!(predicted.y.data().iter().all(|&s| s == 11));
        assert!(predicted.cb.data().iter().all(|&s| s == 20));
        assert!(predicted.cr.data().iter().all(|&s| s == 30));
    }

    #[test]
    fn test_residual_is_signed() {
        let current = PixelPlane::new(2, 1, vec![0, 255]).unwrap();
        let predicted = PixelPlane::new(2, 1, vec![255, 0]).unwrap();
        assert_eq!(residual(&current, &predicted).unwrap(), vec![-255, 255]);
        assert_eq!(residual(&current, &current).unwrap(), vec![0, 0]);
    }
}
