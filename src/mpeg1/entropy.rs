//! Zigzag, DC differential and AC run/size coding of quantised blocks,
//! plus the motion-code VLC.
//!
//! Amplitudes use the biased one's-complement form: `v` for `v >= 0`,
//! `v + 2^size - 1` otherwise, so the leading bit tells the sign.

use once_cell::sync::Lazy;

use crate::bitwriter::{BitReader, BitWriter};
use crate::block::BLOCKS_PER_MACROBLOCK;
use crate::error::{Error, Result};
use crate::image::Component;
use crate::motion::MotionVector;
use crate::quant::QuantizedBlock;

use super::constants::{
    AC_CHROMINANCE_BITS, AC_CHROMINANCE_VALUES, AC_ESCAPE, AC_LUMINANCE_BITS,
    AC_LUMINANCE_VALUES, DC_CHROMINANCE, DC_LUMINANCE, END_OF_BLOCK, MAX_AC_CATEGORY,
    MAX_DC_CATEGORY, MOTION, ZERO_RUN, ZERO_RUN_LENGTH, ZIG_ZAG,
};

/// Run/size symbol to (code, length); length 0 marks a symbol with no code.
pub struct AcTable {
    codes: [(u16, u8); 256],
}

impl AcTable {
    /// Canonical Huffman codes from code-length counts and symbols sorted by
    /// code length.
    fn from_bits_and_values(bits: &[u8; 17], values: &[u8]) -> AcTable {
        let mut codes = [(0u16, 0u8); 256];
        let mut code = 0u32;
        let mut p = 0usize;
        for length in 1..=16u8 {
            for _ in 0..bits[length as usize] {
                codes[values[p] as usize] = (code as u16, length);
                code += 1;
                p += 1;
            }
            code <<= 1;
        }
        debug_assert_eq!(p, values.len());
        AcTable { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<(u16, u8)> {
        match self.codes[symbol as usize] {
            (_, 0) => None,
            code => Some(code),
        }
    }

    fn symbol_for(&self, code: u16, length: u8) -> Option<u8> {
        self.codes
            .iter()
            .position(|&entry| entry == (code, length))
            .map(|symbol| symbol as u8)
    }
}

pub static AC_LUMINANCE_TABLE: Lazy<AcTable> =
    Lazy::new(|| AcTable::from_bits_and_values(&AC_LUMINANCE_BITS, &AC_LUMINANCE_VALUES));

pub static AC_CHROMINANCE_TABLE: Lazy<AcTable> =
    Lazy::new(|| AcTable::from_bits_and_values(&AC_CHROMINANCE_BITS, &AC_CHROMINANCE_VALUES));

fn ac_table(is_luma: bool) -> &'static AcTable {
    if is_luma {
        &AC_LUMINANCE_TABLE
    } else {
        &AC_CHROMINANCE_TABLE
    }
}

fn dc_table(is_luma: bool) -> &'static [(u16, u8); 12] {
    if is_luma {
        &DC_LUMINANCE
    } else {
        &DC_CHROMINANCE
    }
}

/// Bits needed for `|value|`: 0 for 0, else `floor(log2|value|) + 1`.
pub fn category(value: i32) -> u32 {
    32 - value.unsigned_abs().leading_zeros()
}

pub fn amplitude_bits(value: i32, category: u32) -> u32 {
    if value >= 0 {
        value as u32
    } else {
        (value + (1 << category) - 1) as u32
    }
}

pub fn decode_amplitude(bits: u32, category: u32) -> i32 {
    if category == 0 {
        0
    } else if bits >> (category - 1) == 1 {
        bits as i32
    } else {
        bits as i32 - (1 << category) + 1
    }
}

/// Previous quantised DC per component; zero at every slice start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DcPredictor {
    y: i32,
    cb: i32,
    cr: i32,
}

impl DcPredictor {
    pub fn reset(&mut self) {
        *self = DcPredictor::default();
    }

    pub fn get(&self, component: Component) -> i32 {
        match component {
            Component::Y => self.y,
            Component::Cb => self.cb,
            Component::Cr => self.cr,
        }
    }

    pub fn set(&mut self, component: Component, dc: i32) {
        match component {
            Component::Y => self.y = dc,
            Component::Cb => self.cb = dc,
            Component::Cr => self.cr = dc,
        }
    }
}

/// Component of block `index` within a macroblock.
pub fn block_component(index: usize) -> Component {
    match index {
        0..=3 => Component::Y,
        4 => Component::Cb,
        _ => Component::Cr,
    }
}

/// Writes one block and returns the DC predictor for the next block of the
/// same component.
pub fn encode_block(
    coeffs: &QuantizedBlock,
    prev_dc: i32,
    is_luma: bool,
    writer: &mut BitWriter,
) -> Result<i32> {
    let diff = coeffs[0] - prev_dc;
    let size = category(diff);
    if size > MAX_DC_CATEGORY {
        return Err(Error::CoefficientOverflow {
            what: "DC difference",
            value: diff,
            category: size,
        });
    }
    let (code, length) = dc_table(is_luma)[size as usize];
    writer.append_bits(code as u32, length);
    if size > 0 {
        writer.append_bits(amplitude_bits(diff, size), size as u8);
    }

    let table = ac_table(is_luma);
    let mut run = 0u32;
    for &index in ZIG_ZAG.iter().skip(1) {
        let coeff = coeffs[index];
        if coeff == 0 {
            run += 1;
            continue;
        }

        while run > ZERO_RUN_LENGTH {
            let (code, length) = table.get(ZERO_RUN).ok_or_else(missing_zero_run)?;
            writer.append_bits(code as u32, length);
            run -= ZERO_RUN_LENGTH;
        }

        let size = category(coeff);
        if size > MAX_AC_CATEGORY {
            return Err(Error::CoefficientOverflow {
                what: "AC coefficient",
                value: coeff,
                category: size,
            });
        }
        match table.get(((run << 4) | size) as u8) {
            Some((code, length)) => writer.append_bits(code as u32, length),
            None => {
                writer.append_bits(AC_ESCAPE.0 as u32, AC_ESCAPE.1);
                writer.append_bits(run, 4);
                writer.append_bits(size, 4);
            }
        }
        writer.append_bits(amplitude_bits(coeff, size), size as u8);
        run = 0;
    }

    if run > 0 {
        let (code, length) = table.get(END_OF_BLOCK).ok_or_else(missing_end_of_block)?;
        writer.append_bits(code as u32, length);
    }

    Ok(coeffs[0])
}

fn missing_zero_run() -> Error {
    Error::configuration("AC table has no zero-run code")
}

fn missing_end_of_block() -> Error {
    Error::configuration("AC table has no end-of-block code")
}

/// The six blocks of macroblock `index` (raster order in the picture),
/// updating the per-component predictor.
pub fn encode_macroblock(
    index: usize,
    blocks: &[QuantizedBlock; BLOCKS_PER_MACROBLOCK],
    predictor: &mut DcPredictor,
    writer: &mut BitWriter,
) -> Result<()> {
    for (i, block) in blocks.iter().enumerate() {
        let component = block_component(i);
        let dc = encode_block(block, predictor.get(component), component.is_luma(), writer)
            .map_err(|e| e.in_block(index, i))?;
        predictor.set(component, dc);
    }
    Ok(())
}

fn truncated() -> Error {
    Error::format("bitstream ended inside a block")
}

/// Reads back one block written by `encode_block`.
pub fn decode_block(
    reader: &mut BitReader<'_>,
    prev_dc: i32,
    is_luma: bool,
) -> Result<(QuantizedBlock, i32)> {
    let mut coeffs = [0; 64];

    let dc_codes = dc_table(is_luma);
    let mut code = 0u16;
    let mut length = 0u8;
    let size = loop {
        code = (code << 1) | reader.read_bit().ok_or_else(truncated)? as u16;
        length += 1;
        if let Some(size) = dc_codes.iter().position(|&entry| entry == (code, length)) {
            break size as u32;
        }
        if length >= 16 {
            return Err(Error::format("invalid DC size code"));
        }
    };
    let bits = reader.read_bits(size as u8).ok_or_else(truncated)?;
    coeffs[0] = prev_dc + decode_amplitude(bits, size);

    let table = ac_table(is_luma);
    let mut position = 1usize;
    while position < 64 {
        let mut code = 0u16;
        let mut length = 0u8;
        let (run, size) = loop {
            code = (code << 1) | reader.read_bit().ok_or_else(truncated)? as u16;
            length += 1;
            if (code, length) == AC_ESCAPE {
                let run = reader.read_bits(4).ok_or_else(truncated)?;
                let size = reader.read_bits(4).ok_or_else(truncated)?;
                break (run, size);
            }
            if let Some(symbol) = table.symbol_for(code, length) {
                break ((symbol >> 4) as u32, (symbol & 0x0F) as u32);
            }
            if length >= 16 {
                return Err(Error::format("invalid AC code"));
            }
        };

        match (run, size) {
            (0, 0) => break,
            (15, 0) => position += ZERO_RUN_LENGTH as usize,
            (run, size) => {
                position += run as usize;
                if position >= 64 {
                    return Err(Error::format("AC run past the end of the block"));
                }
                let bits = reader.read_bits(size as u8).ok_or_else(truncated)?;
                coeffs[ZIG_ZAG[position]] = decode_amplitude(bits, size);
                position += 1;
            }
        }
    }

    Ok((coeffs, coeffs[0]))
}

/// Smallest `f_code` whose vector range exceeds `search_range`.
pub fn f_code_for(search_range: u32) -> u8 {
    (1..super::constants::MAX_F_CODE)
        .find(|&f| (16u32 << (f - 1)) > search_range)
        .unwrap_or(super::constants::MAX_F_CODE)
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (value << shift) >> shift
}

/// One vector component, coded as the difference from `previous` wrapped
/// into the `f_code` range.
pub fn encode_motion_component(delta: i32, f_code: u8, writer: &mut BitWriter) {
    let bit_size = f_code as u32 - 1;
    let value = sign_extend(delta, 5 + bit_size);
    if value == 0 {
        let (code, length) = MOTION[0];
        writer.append_bits(code as u32, length);
        return;
    }

    let negative = value < 0;
    let magnitude = value.abs() - 1;
    let motion_code = (magnitude >> bit_size) + 1;
    let residual = magnitude & ((1 << bit_size) - 1);

    let (code, length) = MOTION[motion_code as usize];
    writer.append_bits(code as u32, length);
    writer.write_bit(negative);
    if bit_size > 0 {
        writer.append_bits(residual as u32, bit_size as u8);
    }
}

pub fn encode_motion_vector(
    vector: MotionVector,
    previous: &mut MotionVector,
    f_code: u8,
    writer: &mut BitWriter,
) {
    encode_motion_component(vector.dx - previous.dx, f_code, writer);
    encode_motion_component(vector.dy - previous.dy, f_code, writer);
    *previous = vector;
}

/// Inverse of `encode_motion_component`: the new vector component.
pub fn decode_motion_component(reader: &mut BitReader<'_>, f_code: u8, previous: i32) -> Result<i32> {
    let r_size = f_code as u32 - 1;
    let f_scale = 1i32 << r_size;

    let mut code = 0u16;
    let mut length = 0u8;
    let motion_code = loop {
        code = (code << 1) | reader.read_bit().ok_or_else(truncated)? as u16;
        length += 1;
        if let Some(index) = MOTION.iter().position(|&entry| entry == (code, length)) {
            break index as i32;
        }
        if length >= 10 {
            return Err(Error::format("invalid motion code"));
        }
    };

    let delta = if motion_code == 0 {
        0
    } else {
        let negative = reader.read_bit().ok_or_else(truncated)?;
        let r = reader.read_bits(r_size as u8).ok_or_else(truncated)? as i32;
        let d = ((motion_code - 1) << r_size) + r + 1;
        if negative {
            -d
        } else {
            d
        }
    };

    let mut value = previous + delta;
    if value > (f_scale << 4) - 1 {
        value -= f_scale << 5;
    } else if value < -(f_scale << 4) {
        value += f_scale << 5;
    }
    Ok(value)
}
