use crate::dct::{Block, N};
use crate::error::{Error, Result};

/// 64 quantised coefficients in natural (row-major) order.
pub type QuantizedBlock = [i32; N * N];

/// Quantisation matrix with every entry strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantTable([[u8; N]; N]);

impl QuantTable {
    pub fn new(table: [[u8; N]; N]) -> Result<QuantTable> {
        for (row, entries) in table.iter().enumerate() {
            if let Some(col) = entries.iter().position(|&q| q == 0) {
                return Err(Error::configuration(format!(
                    "quantization table entry ({}, {}) must be positive",
                    row, col
                )));
            }
        }
        Ok(QuantTable(table))
    }

    pub fn luminance() -> QuantTable {
        QuantTable(LUMINANCE_QUANTIZATION_TABLE)
    }

    pub fn chrominance() -> QuantTable {
        QuantTable(CHROMINANCE_QUANTIZATION_TABLE)
    }

    pub fn get(&self, index: usize) -> u8 {
        self.0[index / N][index % N]
    }
}

/// `q[i] = round(block[i] / (scale * table[i]))`, halves rounded away from zero.
pub fn quantize(block: &Block, table: &QuantTable, scale: u8) -> Result<QuantizedBlock> {
    if scale == 0 {
        return Err(Error::configuration("quantizer scale must be positive"));
    }
    let mut quantized = [0; N * N];
    for (i, q) in quantized.iter_mut().enumerate() {
        let step = scale as f64 * table.get(i) as f64;
        *q = (block[i] / step).round() as i32;
    }
    Ok(quantized)
}

/// Quantiser scales reachable through the 5-bit slice field when a scale
/// above 31 is requested (MPEG-2 non-linear table, index = code).
pub const NON_LINEAR_QUANTIZER_SCALE: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 18, 20, 22, 24, 28, 32, 36, 40, 44, 48, 52, 56, 64,
    72, 80, 88, 96, 104, 112,
];

pub const MAX_QUANTIZER_SCALE: u8 = 112;

/// 5-bit code carried in the slice header for `scale`.
pub fn quantizer_scale_code(scale: u8) -> Result<u8> {
    match scale {
        1..=31 => Ok(scale),
        32..=MAX_QUANTIZER_SCALE => NON_LINEAR_QUANTIZER_SCALE
            .iter()
            .position(|&s| s == scale)
            .map(|code| code as u8)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "quantizer scale {} above 31 is not a non-linear table entry",
                    scale
                ))
            }),
        _ => Err(Error::configuration(format!(
            "quantizer scale {} outside 1..={}",
            scale, MAX_QUANTIZER_SCALE
        ))),
    }
}

pub const LUMINANCE_QUANTIZATION_TABLE: [[u8; 8]; 8] = [
    [16, 11, 10, 16, 24, 40, 51, 61],
    [12, 12, 14, 19, 26, 58, 60, 55],
    [14, 13, 16, 24, 40, 57, 69, 56],
    [14, 17, 22, 29, 51, 87, 80, 62],
    [18, 22, 37, 56, 68, 109, 103, 77],
    [24, 35, 55, 64, 81, 104, 113, 92],
    [49, 64, 78, 87, 103, 121, 120, 101],
    [72, 92, 95, 98, 112, 100, 103, 99],
];

pub const CHROMINANCE_QUANTIZATION_TABLE: [[u8; 8]; 8] = [
    [17, 18, 24, 47, 99, 99, 99, 99],
    [18, 21, 26, 66, 99, 99, 99, 99],
    [24, 26, 56, 99, 99, 99, 99, 99],
    [47, 66, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
    [99, 99, 99, 99, 99, 99, 99, 99],
];
