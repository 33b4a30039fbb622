//! Forward 8x8 type-II DCT.
//!
//! `F[u,v] = 1/4 C(u) C(v) sum_x sum_y f[x,y] cos((2x+1)u pi/16) cos((2y+1)v pi/16)`
//! with `C(0) = 1/sqrt(2)` and `C(k) = 1` otherwise. Blocks are row-major,
//! `x`/`u` index rows and `y`/`v` columns.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use once_cell::sync::Lazy;
use strum_macros::EnumIter;

pub const N: usize = 8;

/// 64 samples or coefficients in natural (row-major) order.
pub type Block = [f64; N * N];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum DctImplementation {
    /// Direct O(N^4) double sum, kept as the oracle.
    Direct,
    /// Row pass then column pass, O(N^3).
    Separable,
}

impl Default for DctImplementation {
    fn default() -> Self {
        DctImplementation::Separable
    }
}

/// `BASIS[k][n] = 1/2 C(k) cos((2n+1) k pi / 16)`; applied on both axes it
/// yields the 1/4 C(u) C(v) scaling.
static BASIS: Lazy<[[f64; N]; N]> = Lazy::new(|| {
    let mut basis = [[0.0; N]; N];
    for (k, row) in basis.iter_mut().enumerate() {
        for (n, value) in row.iter_mut().enumerate() {
            *value = 0.5 * c(k) * (((2 * n + 1) * k) as f64 * PI / (2 * N) as f64).cos();
        }
    }
    basis
});

fn c(k: usize) -> f64 {
    if k == 0 {
        FRAC_1_SQRT_2
    } else {
        1.0
    }
}

pub fn forward_transform(block: &Block, implementation: DctImplementation) -> Block {
    match implementation {
        DctImplementation::Direct => spatial_to_freq_direct(block),
        DctImplementation::Separable => spatial_to_freq(block),
    }
}

/// Separable transform: `F = B f B^T`.
pub fn spatial_to_freq(block: &Block) -> Block {
    let basis = &*BASIS;
    let mut rows = [0.0; N * N];
    for x in 0..N {
        for v in 0..N {
            let mut sum = 0.0;
            for y in 0..N {
                sum += block[x * N + y] * basis[v][y];
            }
            rows[x * N + v] = sum;
        }
    }

    let mut result = [0.0; N * N];
    for u in 0..N {
        for v in 0..N {
            let mut sum = 0.0;
            for x in 0..N {
                sum += basis[u][x] * rows[x * N + v];
            }
            result[u * N + v] = sum;
        }
    }
    result
}

pub fn spatial_to_freq_direct(block: &Block) -> Block {
    let mut result = [0.0; N * N];
    for u in 0..N {
        for v in 0..N {
            result[u * N + v] = g(u, v, block);
        }
    }
    result
}

fn g(u: usize, v: usize, block: &Block) -> f64 {
    let mut sum = 0.0;
    for x in 0..N {
        for y in 0..N {
            let cosx = (((2 * x + 1) * u) as f64 * PI / 16.0).cos();
            let cosy = (((2 * y + 1) * v) as f64 * PI / 16.0).cos();
            sum += block[x * N + y] * cosx * cosy;
        }
    }
    0.25 * c(u) * c(v) * sum
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    struct Lcg(u64);

    impl Lcg {
        fn next_unit(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        fn block(&mut self, lo: f64, hi: f64) -> Block {
            let mut block = [0.0; 64];
            for sample in block.iter_mut() {
                *sample = lo + (hi - lo) * self.next_unit();
            }
            block
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_direct_and_separable_agree() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..100 {
            let block = rng.block(0.0, 255.0);
            let slow = spatial_to_freq_direct(&block);
            let fast = spatial_to_freq(&block);
            for i in 0..64 {
                assert!(close(slow[i], fast[i]), "coeff {}: {} vs {}", i, slow[i], fast[i]);
            }
        }
    }

    #[test]
    fn test_constant_block_concentrates_in_dc() {
        for implementation in DctImplementation::iter() {
            for &level in &[0.0, 1.0, 128.0, 255.0, -37.5] {
                let freq = forward_transform(&[level; 64], implementation);
                let expected_dc = 0.25 * c(0) * c(0) * 64.0 * level;
                assert!((freq[0] - expected_dc).abs() < 1e-9, "{:?} dc {}", implementation, freq[0]);
                assert!((expected_dc - 8.0 * level).abs() < 1e-9);
                for (i, ac) in freq.iter().enumerate().skip(1) {
                    assert!(ac.abs() < 1e-9, "{:?} ac[{}] = {}", implementation, i, ac);
                }
            }
        }
    }

    #[test]
    fn test_linearity() {
        let mut rng = Lcg(42);
        for implementation in DctImplementation::iter() {
            for _ in 0..20 {
                let x = rng.block(-255.0, 255.0);
                let y = rng.block(-255.0, 255.0);
                let (a, b) = (rng.next_unit() * 4.0 - 2.0, rng.next_unit() * 4.0 - 2.0);

                let mut mixed = [0.0; 64];
                for i in 0..64 {
                    mixed[i] = a * x[i] + b * y[i];
                }
                let fx = forward_transform(&x, implementation);
                let fy = forward_transform(&y, implementation);
                let fm = forward_transform(&mixed, implementation);
                for i in 0..64 {
                    assert!(close(fm[i], a * fx[i] + b * fy[i]));
                }
            }
        }
    }

    #[test]
    fn test_single_horizontal_cosine() {
        // one column-frequency cosine along every row lands in F[0][1]
        let mut block = [0.0; 64];
        for x in 0..N {
            for y in 0..N {
                block[x * N + y] = ((2 * y + 1) as f64 * PI / 16.0).cos();
            }
        }
        let freq = spatial_to_freq(&block);
        assert!(freq[1].abs() > 1.0);
        for (i, value) in freq.iter().enumerate() {
            if i != 1 {
                assert!(value.abs() < 1e-9, "coeff {} = {}", i, value);
            }
        }
    }
}
