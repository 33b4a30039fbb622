//! Block-based I/P/B video encoder producing an MPEG-1 style elementary
//! stream.
//!
//! ```no_run
//! use mpeg1_encoder::{encode_sequence, EncoderConfig, Picture};
//!
//! let frames = (0..10).map(|_| Picture::filled(64, 48, 128, 128, 128));
//! let frames = frames.collect::<Result<Vec<_>, _>>()?;
//! let stream = encode_sequence(frames, EncoderConfig::default().with_gop_size(5))?;
//! std::fs::write("out.m1v", stream)?;
//! # Ok::<(), mpeg1_encoder::Error>(())
//! ```

pub mod bitwriter;
pub mod block;
pub mod config;
pub mod dct;
pub mod encoder;
pub mod error;
pub mod gop;
pub mod image;
pub mod loader;
pub mod motion;
pub mod mpeg1;
pub mod pixel;
pub mod quant;
pub mod timing;

pub use config::{EncoderConfig, FrameRate};
pub use encoder::{encode_sequence, EncodeReport, EncodedFrameInfo, Encoder};
pub use error::{Error, Result};
pub use gop::FrameType;
pub use image::{Picture, PixelPlane};
pub use loader::{load_sequence, FrameLoader, RawYuvLoader};
pub use quant::QuantTable;
