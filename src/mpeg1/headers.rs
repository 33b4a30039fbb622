//! Fixed-layout headers. Every writer starts on a byte boundary with the
//! `00 00 01 id` start code.

use crate::bitwriter::BitWriter;
use crate::error::{Error, Result};
use crate::gop::FrameType;

use super::constants::{
    ASPECT_RATIO_CODE, GROUP_START_CODE, PACK_START_CODE, PICTURE_START_CODE,
    SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE, SLICE_FIRST_START_CODE, SLICE_LAST_START_CODE,
    START_CODE_PREFIX, SYSTEM_HEADER_START_CODE, VARIABLE_BIT_RATE, VIDEO_STREAM_ID,
};

pub const MAX_DIMENSION: usize = 4095;

pub fn write_start_code(writer: &mut BitWriter, id: u8) {
    writer.byte_align();
    for &byte in START_CODE_PREFIX.iter() {
        writer.append_bits(byte as u32, 8);
    }
    writer.append_bits(id as u32, 8);
}

fn marker(writer: &mut BitWriter) {
    writer.write_bit(true);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    pub width: usize,
    pub height: usize,
    pub frame_rate_code: u8,
    /// Bits per second, `None` writes the variable-rate marker.
    pub bit_rate: Option<u32>,
}

impl SequenceHeader {
    /// `bit_rate` field, in units of 400 bit/s rounded up.
    pub fn bit_rate_field(&self) -> u32 {
        match self.bit_rate {
            Some(bps) => ((bps as u64 + 399) / 400).clamp(1, VARIABLE_BIT_RATE as u64 - 1) as u32,
            None => VARIABLE_BIT_RATE,
        }
    }

    /// One raw 4:2:0 frame in units of 16 kbit.
    pub fn vbv_buffer_size(&self) -> u32 {
        let bits = (self.width * self.height * 12) as u64;
        ((bits + 16383) / 16384).clamp(1, 1023) as u32
    }

    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        let fits = |size: usize| (1..=MAX_DIMENSION).contains(&size);
        if !fits(self.width) || !fits(self.height) {
            return Err(Error::format(format!(
                "{}x{} does not fit the 12-bit size fields",
                self.width, self.height
            )));
        }
        write_start_code(writer, SEQUENCE_HEADER_CODE);
        writer.write_bits(self.width as u32, 12);
        writer.write_bits(self.height as u32, 12);
        writer.write_bits(ASPECT_RATIO_CODE as u32, 4);
        writer.write_bits(self.frame_rate_code as u32, 4);
        writer.write_bits(self.bit_rate_field(), 18);
        marker(writer);
        writer.write_bits(self.vbv_buffer_size(), 10);
        // constrained parameters, load intra matrix, load non-intra matrix
        writer.write_bits(0, 3);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeCode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub pictures: u8,
}

impl TimeCode {
    /// Time code of the frame shown at `display_index` at `fps` frames per
    /// second. Hours wrap at 24.
    pub fn from_frame_index(display_index: usize, fps: u32) -> TimeCode {
        let fps = fps.max(1) as usize;
        let total_seconds = display_index / fps;
        TimeCode {
            hours: ((total_seconds / 3600) % 24) as u8,
            minutes: ((total_seconds / 60) % 60) as u8,
            seconds: (total_seconds % 60) as u8,
            pictures: (display_index % fps) as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GopHeader {
    pub time_code: TimeCode,
    pub closed_gop: bool,
    pub broken_link: bool,
}

impl GopHeader {
    pub fn write(&self, writer: &mut BitWriter) {
        write_start_code(writer, GROUP_START_CODE);
        // drop_frame_flag
        writer.write_bit(false);
        writer.write_bits(self.time_code.hours as u32, 5);
        writer.write_bits(self.time_code.minutes as u32, 6);
        marker(writer);
        writer.write_bits(self.time_code.seconds as u32, 6);
        writer.write_bits(self.time_code.pictures as u32, 6);
        writer.write_bit(self.closed_gop);
        writer.write_bit(self.broken_link);
        writer.write_bits(0, 5);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    pub temporal_reference: u16,
    pub frame_type: FrameType,
    pub forward_f_code: u8,
    pub backward_f_code: u8,
}

impl PictureHeader {
    pub fn write(&self, writer: &mut BitWriter) {
        write_start_code(writer, PICTURE_START_CODE);
        writer.write_bits(self.temporal_reference as u32 & 0x3FF, 10);
        writer.write_bits(self.frame_type.coding_type() as u32, 3);
        // vbv_delay, unspecified
        writer.write_bits(0xFFFF, 16);

        if matches!(self.frame_type, FrameType::P | FrameType::B) {
            // full_pel_forward_vector
            writer.write_bit(true);
            writer.write_bits(self.forward_f_code as u32, 3);
        }
        if self.frame_type == FrameType::B {
            writer.write_bit(true);
            writer.write_bits(self.backward_f_code as u32, 3);
        }

        // extra_bit_picture
        writer.write_bit(false);
        writer.byte_align();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeader {
    /// Macroblock row, zero based.
    pub row: usize,
    pub quantizer_code: u8,
}

impl SliceHeader {
    pub fn start_code(&self) -> Result<u8> {
        let id = self.row + SLICE_FIRST_START_CODE as usize;
        if id > SLICE_LAST_START_CODE as usize {
            return Err(Error::format(format!(
                "macroblock row {} has no slice start code",
                self.row
            )));
        }
        Ok(id as u8)
    }

    /// Leaves the writer unaligned; macroblock data follows directly.
    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        let id = self.start_code()?;
        write_start_code(writer, id);
        writer.write_bits(self.quantizer_code as u32, 5);
        // extra_bit_slice
        writer.write_bit(false);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    /// 90 kHz system clock reference, 33 bits.
    pub system_clock_reference: u64,
    /// In units of 50 bytes/s, 22 bits.
    pub mux_rate: u32,
}

impl PackHeader {
    pub fn write(&self, writer: &mut BitWriter) {
        let scr = self.system_clock_reference & 0x1_FFFF_FFFF;
        write_start_code(writer, PACK_START_CODE);
        writer.write_bits(0b0010, 4);
        writer.write_bits((scr >> 30) as u32, 3);
        marker(writer);
        writer.write_bits(((scr >> 15) & 0x7FFF) as u32, 15);
        marker(writer);
        writer.write_bits((scr & 0x7FFF) as u32, 15);
        marker(writer);
        marker(writer);
        writer.write_bits(self.mux_rate & 0x3F_FFFF, 22);
        marker(writer);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemHeader {
    /// 22 bits, same units as the pack mux rate.
    pub rate_bound: u32,
    /// Video buffer bound in units of 1024 bytes, 13 bits.
    pub video_buffer_size_bound: u16,
}

impl SystemHeader {
    pub const HEADER_LENGTH: u16 = 9;

    pub fn write(&self, writer: &mut BitWriter) {
        write_start_code(writer, SYSTEM_HEADER_START_CODE);
        writer.write_bits(Self::HEADER_LENGTH as u32, 16);
        marker(writer);
        writer.write_bits(self.rate_bound & 0x3F_FFFF, 22);
        marker(writer);
        // audio_bound
        writer.write_bits(0, 6);
        // fixed_flag, CSPS_flag
        writer.write_bits(0b00, 2);
        // system_audio_lock_flag, system_video_lock_flag
        writer.write_bits(0b11, 2);
        marker(writer);
        // video_bound
        writer.write_bits(1, 5);
        // reserved_byte
        writer.write_bits(0xFF, 8);

        writer.write_bits(VIDEO_STREAM_ID as u32, 8);
        writer.write_bits(0b11, 2);
        // buffer_bound_scale: 1024-byte units
        writer.write_bit(true);
        writer.write_bits(self.video_buffer_size_bound as u32 & 0x1FFF, 13);
    }
}

pub fn write_sequence_end(writer: &mut BitWriter) {
    write_start_code(writer, SEQUENCE_END_CODE);
}
