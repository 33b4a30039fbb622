use crate::dct::{Block, N};

/// Luma samples per macroblock side.
pub const MACROBLOCK_SIZE: usize = 16;

/// Four luma blocks in raster order, then Cb, then Cr.
pub const BLOCKS_PER_MACROBLOCK: usize = 6;

pub type MacroblockBlocks = [Block; BLOCKS_PER_MACROBLOCK];

/// Borrowed row-major samples: raw pixels for intra pictures, signed
/// residuals for predicted ones.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a, T> {
    pub data: &'a [T],
    pub stride: usize,
}

impl<'a, T> PlaneView<'a, T> {
    pub fn new(data: &'a [T], stride: usize) -> PlaneView<'a, T> {
        PlaneView { data, stride }
    }
}

/// The 8x8 block at block coordinates (`u`, `v`).
pub fn get_block<T: Copy + Into<f64>>(plane: PlaneView<'_, T>, u: usize, v: usize) -> Block {
    let mut result = [0.0; N * N];

    for y in 0..N {
        let start = (v * N + y) * plane.stride + u * N;
        for (x, sample) in plane.data[start..start + N].iter().enumerate() {
            result[y * N + x] = (*sample).into();
        }
    }

    result
}

/// Blocks of the macroblock at (`mb_x`, `mb_y`) in coding order.
pub fn macroblock_blocks<T: Copy + Into<f64>>(
    y: PlaneView<'_, T>,
    cb: PlaneView<'_, T>,
    cr: PlaneView<'_, T>,
    mb_x: usize,
    mb_y: usize,
) -> MacroblockBlocks {
    [
        get_block(y, 2 * mb_x, 2 * mb_y),
        get_block(y, 2 * mb_x + 1, 2 * mb_y),
        get_block(y, 2 * mb_x, 2 * mb_y + 1),
        get_block(y, 2 * mb_x + 1, 2 * mb_y + 1),
        get_block(cb, mb_x, mb_y),
        get_block(cr, mb_x, mb_y),
    ]
}

/// Whether block `index` of a macroblock is a luma block.
pub fn is_luma_block(index: usize) -> bool {
    index < 4
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_block_reads_window() {
        let width = 16;
        let data = (0..(width * 16)).map(|i| (i % 251) as u8).collect::<Vec<u8>>();
        let block = get_block(PlaneView::new(&data, width), 1, 1);
        assert_eq!(block[0], data[8 * width + 8] as f64);
        assert_eq!(block[63], data[15 * width + 15] as f64);
        assert_eq!(block[9], data[9 * width + 9] as f64);
    }

    #[test]
    fn test_signed_residual_blocks() {
        let residual = vec![-5i16; 8 * 8];
        let block = get_block(PlaneView::new(&residual, 8), 0, 0);
        assert!(block.iter().all(|&s| s == -5.0));
    }

    #[test]
    fn test_macroblock_order() {
        // luma quadrant i filled with i, chroma with 10 and 20
        let mut y = vec![0u8; 32 * 16];
        for row in 0..16 {
            for col in 0..16 {
                let quadrant = (row / 8) * 2 + col / 8;
                y[row * 32 + 16 + col] = quadrant as u8;
            }
        }
        let cb = vec![10u8; 16 * 8];
        let cr = vec![20u8; 16 * 8];
        let blocks = macroblock_blocks(
            PlaneView::new(&y, 32),
            PlaneView::new(&cb, 16),
            PlaneView::new(&cr, 16),
            1,
            0,
        );
        for (i, block) in blocks.iter().take(4).enumerate() {
            assert!(block.iter().all(|&s| s == i as f64));
            assert!(is_luma_block(i));
        }
        assert!(blocks[4].iter().all(|&s| s == 10.0));
        assert!(blocks[5].iter().all(|&s| s == 20.0));
        assert!(!is_luma_block(4));
    }
}
