use bitvec::prelude::*;

/// MSB-first bit accumulator.
///
/// Codes are appended back to back with no alignment between calls; the
/// owner decides when to pad (`byte_align`) and take the bytes out.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buffer: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter {
            buffer: BitVec::new(),
        }
    }

    /// Append the low `length` bits of `code`, most significant first.
    /// VLC codes are at most 16 bits long.
    pub fn append_bits(&mut self, code: u32, length: u8) {
        debug_assert!((1..=16).contains(&length), "code length {}", length);
        self.write_bits(code, length);
    }

    /// Like `append_bits`, for the wider fixed-length header fields.
    pub fn write_bits(&mut self, value: u32, length: u8) {
        debug_assert!(length <= 32);
        for i in (0..length).rev() {
            self.buffer.push((value >> i) & 1 == 1);
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.buffer.push(bit);
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn byte_align(&mut self) {
        while self.buffer.len() % 8 != 0 {
            self.buffer.push(false);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn bit_length(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes needed to hold everything written so far.
    pub fn byte_length(&self) -> usize {
        (self.buffer.len() + 7) / 8
    }

    /// Copy of the written bits, the last partial byte zero-filled.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bits = self.buffer.clone();
        bits.set_uninitialized(false);
        bits.into_vec()
    }

    /// Byte-align, hand the bytes over and start empty again.
    pub fn flush(&mut self) -> Vec<u8> {
        self.byte_align();
        let bytes = self.to_bytes();
        self.reset();
        bytes
    }
}

/// Sequential reader over bytes produced by a `BitWriter`.
pub struct BitReader<'a> {
    buffer: &'a BitSlice<u8, Msb0>,
    pointer: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> BitReader<'a> {
        BitReader {
            buffer: bytes.view_bits::<Msb0>(),
            pointer: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pointer
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pointer
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = *self.buffer.get(self.pointer)?;
        self.pointer += 1;
        Some(bit)
    }

    pub fn read_bits(&mut self, length: u8) -> Option<u32> {
        if length == 0 {
            return Some(0);
        }
        let end = self.pointer + length as usize;
        if end > self.buffer.len() {
            return None;
        }
        let value = self.buffer[self.pointer..end].load_be::<u32>();
        self.pointer = end;
        Some(value)
    }

    pub fn skip(&mut self, length: usize) {
        self.pointer = (self.pointer + length).min(self.buffer.len());
    }

    pub fn byte_align(&mut self) {
        self.pointer = ((self.pointer + 7) / 8) * 8;
    }
}
