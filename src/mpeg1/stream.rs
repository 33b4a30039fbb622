//! Picture assembly and the ordered byte sink.
//!
//! A picture is built in memory slice by slice; nothing reaches the sink
//! until the whole picture is ready.

use std::io::Write;

use crate::bitwriter::BitWriter;
use crate::block::BLOCKS_PER_MACROBLOCK;
use crate::error::Result;
use crate::motion::MotionVector;
use crate::quant::QuantizedBlock;

use super::constants::{EMULATION_PREVENTION_BYTE, START_CODE_PREFIX};
use super::entropy::{encode_macroblock, encode_motion_vector, DcPredictor};
use super::headers::{PictureHeader, SliceHeader};

/// Everything coded for one macroblock, in payload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroblockPayload {
    /// P: against the previous reference. B: against the future reference.
    pub forward: Vec<MotionVector>,
    /// B only: against the previous reference.
    pub backward: Vec<MotionVector>,
    pub blocks: [QuantizedBlock; BLOCKS_PER_MACROBLOCK],
}

impl MacroblockPayload {
    pub fn intra(blocks: [QuantizedBlock; BLOCKS_PER_MACROBLOCK]) -> MacroblockPayload {
        MacroblockPayload {
            forward: Vec::new(),
            backward: Vec::new(),
            blocks,
        }
    }
}

/// Per-slice state that runs in raster order.
#[derive(Debug, Default)]
struct SliceState {
    dc: DcPredictor,
    forward: MotionVector,
    backward: MotionVector,
}

/// Copy of `payload` with `EMULATION_PREVENTION_BYTE` inserted after every
/// `00 00` that is followed by a byte <= 3. The result never holds a start
/// code prefix.
pub fn escape_payload(payload: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(payload.len() + payload.len() / 64);
    let mut zeros = 0;
    for &byte in payload {
        if zeros >= 2 && byte <= EMULATION_PREVENTION_BYTE {
            escaped.push(EMULATION_PREVENTION_BYTE);
            zeros = 0;
        }
        escaped.push(byte);
        zeros = if byte == 0 { zeros + 1 } else { 0 };
    }
    escaped
}

/// Inverse of `escape_payload`.
pub fn unescape_payload(bytes: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(bytes.len());
    let mut zeros = 0;
    for &byte in bytes {
        if zeros >= 2 && byte == EMULATION_PREVENTION_BYTE {
            zeros = 0;
            continue;
        }
        payload.push(byte);
        zeros = if byte == 0 { zeros + 1 } else { 0 };
    }
    payload
}

/// Picture header followed by one slice per macroblock row, each slice
/// zero-padded to a byte boundary. Everything after a slice start code is
/// escaped with `escape_payload`.
pub fn write_picture(
    header: &PictureHeader,
    quantizer_code: u8,
    mb_cols: usize,
    macroblocks: &[MacroblockPayload],
) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    header.write(&mut writer);
    let mut bytes = writer.flush();

    let mb_cols = mb_cols.max(1);
    for (row, slice) in macroblocks.chunks(mb_cols).enumerate() {
        SliceHeader {
            row,
            quantizer_code,
        }
        .write(&mut writer)?;

        let mut state = SliceState::default();
        for (col, macroblock) in slice.iter().enumerate() {
            for &vector in &macroblock.forward {
                encode_motion_vector(vector, &mut state.forward, header.forward_f_code, &mut writer);
            }
            for &vector in &macroblock.backward {
                encode_motion_vector(vector, &mut state.backward, header.backward_f_code, &mut writer);
            }
            let index = row * mb_cols + col;
            encode_macroblock(index, &macroblock.blocks, &mut state.dc, &mut writer)?;
        }

        let slice_bytes = writer.flush();
        let (start_code, payload) = slice_bytes.split_at(START_CODE_PREFIX.len() + 1);
        let escaped = escape_payload(payload);
        tracing::trace!(row, bytes = escaped.len() + start_code.len(), "slice");
        bytes.extend_from_slice(start_code);
        bytes.extend_from_slice(&escaped);
    }

    Ok(bytes)
}

/// Append-only byte sink. Chunks are written whole and in call order.
pub struct StreamWriter<W: Write> {
    sink: W,
    bytes_written: u64,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(sink: W) -> StreamWriter<W> {
        StreamWriter {
            sink,
            bytes_written: 0,
        }
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
