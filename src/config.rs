use strum_macros::{Display, EnumIter};

use crate::error::{Error, Result};
use crate::mpeg1::entropy::f_code_for;
use crate::quant::{quantizer_scale_code, QuantTable};

pub const MAX_SEARCH_RANGE: u32 = 64;

/// Temporal references are 10 bits.
pub const MAX_GOP_SIZE: usize = 1024;

/// Picture rates with their 4-bit `frame_rate_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum FrameRate {
    #[strum(serialize = "23.976")]
    Film23_976,
    #[strum(serialize = "24")]
    Film24,
    #[strum(serialize = "25")]
    Pal25,
    #[strum(serialize = "29.97")]
    Ntsc29_97,
    #[strum(serialize = "30")]
    Fps30,
    #[strum(serialize = "50")]
    Pal50,
    #[strum(serialize = "59.94")]
    Ntsc59_94,
    #[strum(serialize = "60")]
    Fps60,
}

impl FrameRate {
    pub fn code(&self) -> u8 {
        match self {
            FrameRate::Film23_976 => 1,
            FrameRate::Film24 => 2,
            FrameRate::Pal25 => 3,
            FrameRate::Ntsc29_97 => 4,
            FrameRate::Fps30 => 5,
            FrameRate::Pal50 => 6,
            FrameRate::Ntsc59_94 => 7,
            FrameRate::Fps60 => 8,
        }
    }

    pub fn frames_per_second(&self) -> f64 {
        match self {
            FrameRate::Film23_976 => 24000.0 / 1001.0,
            FrameRate::Film24 => 24.0,
            FrameRate::Pal25 => 25.0,
            FrameRate::Ntsc29_97 => 30000.0 / 1001.0,
            FrameRate::Fps30 => 30.0,
            FrameRate::Pal50 => 50.0,
            FrameRate::Ntsc59_94 => 60000.0 / 1001.0,
            FrameRate::Fps60 => 60.0,
        }
    }

    /// Whole pictures per second, as counted by GOP time codes.
    pub fn nominal(&self) -> u32 {
        self.frames_per_second().round() as u32
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::Pal25
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub gop_size: usize,
    pub b_frames: usize,
    /// Motion block size, 8 or 16.
    pub block_size: usize,
    pub search_range: u32,
    pub quantizer_scale: u8,
    pub frame_rate: FrameRate,
    /// Bits per second; `None` marks the stream as variable rate.
    pub bit_rate: Option<u32>,
    pub luma_table: QuantTable,
    pub chroma_table: QuantTable,
    /// Prefix the stream with pack and system headers.
    pub system_headers: bool,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            gop_size: 8,
            b_frames: 2,
            block_size: 16,
            search_range: 16,
            quantizer_scale: 8,
            frame_rate: FrameRate::default(),
            bit_rate: None,
            luma_table: QuantTable::luminance(),
            chroma_table: QuantTable::chrominance(),
            system_headers: false,
            threads: None,
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gop_size(mut self, gop_size: usize) -> Self {
        self.gop_size = gop_size;
        self
    }

    pub fn with_b_frames(mut self, b_frames: usize) -> Self {
        self.b_frames = b_frames;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_search_range(mut self, search_range: u32) -> Self {
        self.search_range = search_range;
        self
    }

    pub fn with_quantizer_scale(mut self, quantizer_scale: u8) -> Self {
        self.quantizer_scale = quantizer_scale;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: Option<u32>) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    pub fn with_tables(mut self, luma_table: QuantTable, chroma_table: QuantTable) -> Self {
        self.luma_table = luma_table;
        self.chroma_table = chroma_table;
        self
    }

    pub fn with_system_headers(mut self, system_headers: bool) -> Self {
        self.system_headers = system_headers;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Rejects anything the encoder cannot express before any frame is read.
    pub fn validate(&self) -> Result<()> {
        if self.gop_size == 0 || self.gop_size > MAX_GOP_SIZE {
            return Err(Error::configuration(format!(
                "gop_size {} outside 1..={}",
                self.gop_size, MAX_GOP_SIZE
            )));
        }
        if self.b_frames >= MAX_GOP_SIZE {
            return Err(Error::configuration(format!(
                "b_frames {} must be below {}",
                self.b_frames, MAX_GOP_SIZE
            )));
        }
        if self.block_size != 8 && self.block_size != 16 {
            return Err(Error::configuration(format!(
                "block_size {} must be 8 or 16",
                self.block_size
            )));
        }
        if self.search_range > MAX_SEARCH_RANGE {
            return Err(Error::configuration(format!(
                "search_range {} above {}",
                self.search_range, MAX_SEARCH_RANGE
            )));
        }
        quantizer_scale_code(self.quantizer_scale)?;
        if self.bit_rate == Some(0) {
            return Err(Error::configuration("bit_rate must be positive"));
        }
        if self.threads == Some(0) {
            return Err(Error::configuration("threads must be positive"));
        }
        Ok(())
    }

    pub fn quantizer_code(&self) -> Result<u8> {
        quantizer_scale_code(self.quantizer_scale)
    }

    pub fn f_code(&self) -> u8 {
        f_code_for(self.search_range)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_default_is_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.f_code(), 2);
        assert_eq!(config.quantizer_code().unwrap(), 8);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let bad = [
            EncoderConfig::new().with_gop_size(0),
            EncoderConfig::new().with_gop_size(1025),
            EncoderConfig::new().with_b_frames(1024),
            EncoderConfig::new().with_b_frames(usize::MAX),
            EncoderConfig::new().with_block_size(4),
            EncoderConfig::new().with_search_range(65),
            EncoderConfig::new().with_quantizer_scale(0),
            EncoderConfig::new().with_quantizer_scale(113),
            EncoderConfig::new().with_quantizer_scale(33),
            EncoderConfig::new().with_bit_rate(Some(0)),
            EncoderConfig::new().with_threads(Some(0)),
        ];
        for config in bad.iter() {
            assert!(matches!(config.validate(), Err(Error::Configuration(_))), "{:?}", config);
        }
    }

    #[test]
    fn test_accepts_edges() {
        let config = EncoderConfig::new()
            .with_gop_size(1)
            .with_b_frames(0)
            .with_block_size(8)
            .with_search_range(0)
            .with_quantizer_scale(112);
        assert!(config.validate().is_ok());
        assert_eq!(config.quantizer_code().unwrap(), 31);
        assert_eq!(config.f_code(), 1);
    }

    #[test]
    fn test_frame_rate_codes() {
        let codes = FrameRate::iter().map(|r| r.code()).collect::<Vec<u8>>();
        assert_eq!(codes, (1..=8).collect::<Vec<u8>>());
        assert_eq!(FrameRate::Ntsc29_97.nominal(), 30);
        assert_eq!(FrameRate::Film23_976.nominal(), 24);
        assert_eq!(FrameRate::Pal25.to_string(), "25");
    }
}
