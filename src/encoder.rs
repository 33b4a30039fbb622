//! Frame pipeline and the public encoding entry points.
//!
//! Pictures are buffered one GOP at a time. Each frame is predicted,
//! transformed and quantised in parallel across macroblocks, then entropy
//! coded in raster order on one thread and appended to the sink whole.

use std::io::Write;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::block::{
    is_luma_block, macroblock_blocks, PlaneView, BLOCKS_PER_MACROBLOCK, MACROBLOCK_SIZE,
};
use crate::bitwriter::BitWriter;
use crate::config::EncoderConfig;
use crate::dct;
use crate::error::{Error, Result};
use crate::gop::{Frame, FrameType, Gop, GopPlan};
use crate::image::Picture;
use crate::motion::{self, MotionField, MotionVector};
use crate::mpeg1::headers::{
    write_sequence_end, GopHeader, PackHeader, PictureHeader, SequenceHeader, SystemHeader,
    TimeCode, MAX_DIMENSION,
};
use crate::mpeg1::stream::{write_picture, MacroblockPayload, StreamWriter};
use crate::quant::{quantize, QuantizedBlock};
use crate::timing::StageTimer;

/// Slice start codes run from 0x01 to 0xAF.
pub const MAX_MACROBLOCK_ROWS: usize = 175;

/// Outcome of one coded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrameInfo {
    pub display_index: usize,
    pub slot: usize,
    pub frame_type: FrameType,
    pub bytes: usize,
    /// Mean `|dx| + |dy|` over the frame's motion blocks, 0 for I frames.
    pub mean_motion: f64,
}

#[derive(Debug, Default)]
pub struct EncodeReport {
    /// In coding order.
    pub frames: Vec<EncodedFrameInfo>,
    /// Frames left out of the stream after a recoverable failure.
    pub dropped: Vec<Error>,
    pub bytes_written: u64,
}

/// Rejects pictures the headers and slice numbering cannot describe.
pub fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 || width % MACROBLOCK_SIZE != 0 || height % MACROBLOCK_SIZE != 0 {
        return Err(Error::format(format!(
            "{}x{} is not a non-zero multiple of {}",
            width, height, MACROBLOCK_SIZE
        )));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::format(format!(
            "{}x{} exceeds {} samples",
            width, height, MAX_DIMENSION
        )));
    }
    if height / MACROBLOCK_SIZE > MAX_MACROBLOCK_ROWS {
        return Err(Error::format(format!(
            "{} macroblock rows exceed {}",
            height / MACROBLOCK_SIZE,
            MAX_MACROBLOCK_ROWS
        )));
    }
    Ok(())
}

/// Streaming encoder writing an elementary stream into `W`.
pub struct Encoder<W: Write> {
    config: EncoderConfig,
    quantizer_code: u8,
    stream: StreamWriter<W>,
    pool: Option<rayon::ThreadPool>,
    gop: Gop,
    dimensions: Option<(usize, usize)>,
    next_display_index: usize,
    report: EncodeReport,
}

impl<W: Write> Encoder<W> {
    pub fn new(config: EncoderConfig, sink: W) -> Result<Encoder<W>> {
        config.validate()?;
        let quantizer_code = config.quantizer_code()?;
        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::resource(format!("thread pool: {}", e)))?,
            ),
            None => None,
        };
        Ok(Encoder {
            gop: Gop::new(config.gop_size),
            config,
            quantizer_code,
            stream: StreamWriter::new(sink),
            pool,
            dimensions: None,
            next_display_index: 0,
            report: EncodeReport::default(),
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Queue the next picture in display order. Completes and writes a GOP
    /// whenever `gop_size` pictures are queued.
    pub fn push_frame(&mut self, picture: Picture) -> Result<()> {
        picture.check_layout()?;
        let dimensions = (picture.width(), picture.height());
        match self.dimensions {
            None => {
                check_dimensions(dimensions.0, dimensions.1)?;
                self.write_sequence_start(dimensions)?;
                self.dimensions = Some(dimensions);
            }
            Some(expected) if expected != dimensions => {
                return Err(Error::format(format!(
                    "frame {} is {}x{}, sequence is {}x{}",
                    self.next_display_index, dimensions.0, dimensions.1, expected.0, expected.1
                )));
            }
            Some(_) => {}
        }

        self.gop.push(Frame {
            display_index: self.next_display_index,
            picture,
        });
        self.next_display_index += 1;

        if self.gop.len() == self.config.gop_size {
            self.encode_gop()?;
        }
        Ok(())
    }

    /// Encode any partial GOP, terminate the stream and hand back the sink.
    pub fn finish(mut self) -> Result<(W, EncodeReport)> {
        if self.dimensions.is_none() {
            return Err(Error::format("no frames to encode"));
        }
        if !self.gop.is_empty() {
            self.encode_gop()?;
        }
        let mut writer = BitWriter::new();
        write_sequence_end(&mut writer);
        self.stream.append(&writer.flush())?;

        let mut report = std::mem::take(&mut self.report);
        report.bytes_written = self.stream.bytes_written();
        info!(
            frames = report.frames.len(),
            dropped = report.dropped.len(),
            bytes = report.bytes_written,
            "sequence finished"
        );
        Ok((self.stream.into_inner()?, report))
    }

    fn write_sequence_start(&mut self, (width, height): (usize, usize)) -> Result<()> {
        let sequence = SequenceHeader {
            width,
            height,
            frame_rate_code: self.config.frame_rate.code(),
            bit_rate: self.config.bit_rate,
        };
        let mut writer = BitWriter::new();
        if self.config.system_headers {
            let bytes_per_second = match self.config.bit_rate {
                Some(bps) => bps as f64 / 8.0,
                None => (width * height * 3 / 2) as f64 * self.config.frame_rate.frames_per_second(),
            };
            let mux_rate = ((bytes_per_second / 50.0).ceil() as u32).clamp(1, 0x3F_FFFF);
            let buffer_kib = ((sequence.vbv_buffer_size() * 2048 + 1023) / 1024).clamp(1, 0x1FFF);
            PackHeader {
                system_clock_reference: 0,
                mux_rate,
            }
            .write(&mut writer);
            SystemHeader {
                rate_bound: mux_rate,
                video_buffer_size_bound: buffer_kib as u16,
            }
            .write(&mut writer);
        }
        sequence.write(&mut writer)?;
        self.stream.append(&writer.flush())
    }

    fn encode_gop(&mut self) -> Result<()> {
        let first_display_index = match self.gop.first_display_index() {
            Some(index) => index,
            None => return Ok(()),
        };
        let frames = self.gop.take();
        let _timer = StageTimer::new("gop");
        let mut plan = GopPlan::new(frames.len(), self.config.b_frames);
        info!(
            first_display_index,
            len = frames.len(),
            pattern = %plan.slots().iter().map(|s| s.frame_type.to_string()).collect::<String>(),
            "encoding GOP"
        );

        let mut writer = BitWriter::new();
        GopHeader {
            time_code: TimeCode::from_frame_index(first_display_index, self.config.frame_rate.nominal()),
            closed_gop: true,
            broken_link: false,
        }
        .write(&mut writer);
        self.stream.append(&writer.flush())?;

        let mut dropped = vec![false; frames.len()];
        for slot in plan.encode_order() {
            debug_assert!(plan.is_ready(slot), "slot {} coded before its references", slot);
            let info = *plan.slot(slot);
            let frame_type = info.frame_type;
            let display_index = frames[slot].display_index;

            let missing = [info.previous, info.future]
                .into_iter()
                .flatten()
                .find(|&reference| dropped[reference]);
            let result = match missing {
                Some(reference) => Err(Error::ReferenceDropped { reference }),
                None => {
                    let config = &self.config;
                    let quantizer_code = self.quantizer_code;
                    let job = || encode_frame(config, quantizer_code, &frames, &plan, slot);
                    match &self.pool {
                        Some(pool) => pool.install(job),
                        None => job(),
                    }
                }
            };

            match result {
                Ok((bytes, mean_motion)) => {
                    self.stream.append(&bytes)?;
                    debug!(
                        display_index,
                        slot,
                        frame_type = %frame_type,
                        bytes = bytes.len(),
                        mean_motion,
                        "frame encoded"
                    );
                    self.report.frames.push(EncodedFrameInfo {
                        display_index,
                        slot,
                        frame_type,
                        bytes: bytes.len(),
                        mean_motion,
                    });
                }
                Err(source) => {
                    let error = Error::Frame {
                        slot,
                        display_index,
                        frame_type,
                        source: Box::new(source),
                    };
                    if error.is_fatal_for_job() {
                        return Err(error);
                    }
                    warn!(%error, "frame dropped");
                    self.report.dropped.push(error);
                    dropped[slot] = true;
                }
            }
            // dropped frames are terminal too; their dependants are dropped above
            plan.mark_encoded(slot);
        }
        debug_assert!(plan.is_complete());
        Ok(())
    }
}

/// Picture bytes of one slot and its mean motion.
fn encode_frame(
    config: &EncoderConfig,
    quantizer_code: u8,
    frames: &[Frame],
    plan: &GopPlan,
    slot: usize,
) -> Result<(Vec<u8>, f64)> {
    let _timer = StageTimer::new("frame");
    let info = plan.slot(slot);
    let current = &frames[slot].picture;
    let search_range = config.search_range as i32;
    let f_code = config.f_code();

    let (prediction, forward, backward) = match info.frame_type {
        FrameType::I => (None, None, None),
        FrameType::P => {
            let past = reference_picture(frames, info.previous, slot)?;
            let field = motion::estimate_motion(&current.y, &past.y, config.block_size, search_range)?;
            let predicted = motion::compensate(past, &field)?;
            (Some(predicted), Some(field), None)
        }
        FrameType::B => {
            let past = reference_picture(frames, info.previous, slot)?;
            let future = reference_picture(frames, info.future, slot)?;
            let forward =
                motion::estimate_motion(&current.y, &future.y, config.block_size, search_range)?;
            let backward =
                motion::estimate_motion(&current.y, &past.y, config.block_size, search_range)?;
            let predicted = motion::compensate_bidirectional(past, &backward, future, &forward)?;
            (Some(predicted), Some(forward), Some(backward))
        }
    };

    let mb_cols = current.width() / MACROBLOCK_SIZE;
    let mb_rows = current.height() / MACROBLOCK_SIZE;
    let blocks = match &prediction {
        None => quantize_macroblocks(
            PlaneView::new(current.y.data(), current.y.width()),
            PlaneView::new(current.cb.data(), current.cb.width()),
            PlaneView::new(current.cr.data(), current.cr.width()),
            mb_cols,
            mb_rows,
            config,
        )?,
        Some(predicted) => {
            let y = motion::residual(&current.y, &predicted.y)?;
            let cb = motion::residual(&current.cb, &predicted.cb)?;
            let cr = motion::residual(&current.cr, &predicted.cr)?;
            quantize_macroblocks(
                PlaneView::new(&y, current.y.width()),
                PlaneView::new(&cb, current.cb.width()),
                PlaneView::new(&cr, current.cr.width()),
                mb_cols,
                mb_rows,
                config,
            )?
        }
    };

    let macroblocks = blocks
        .into_iter()
        .enumerate()
        .map(|(index, blocks)| {
            let (mb_x, mb_y) = (index % mb_cols, index / mb_cols);
            MacroblockPayload {
                forward: forward
                    .as_ref()
                    .map(|f| macroblock_vectors(f, mb_x, mb_y))
                    .unwrap_or_default(),
                backward: backward
                    .as_ref()
                    .map(|f| macroblock_vectors(f, mb_x, mb_y))
                    .unwrap_or_default(),
                blocks,
            }
        })
        .collect::<Vec<MacroblockPayload>>();

    let header = PictureHeader {
        temporal_reference: slot as u16,
        frame_type: info.frame_type,
        forward_f_code: f_code,
        backward_f_code: f_code,
    };
    let bytes = write_picture(&header, quantizer_code, mb_cols, &macroblocks)?;

    let fields = [forward.as_ref(), backward.as_ref()];
    let used = fields.iter().flatten().count();
    let mean_motion = if used == 0 {
        0.0
    } else {
        fields.iter().flatten().map(|f| f.mean_magnitude()).sum::<f64>() / used as f64
    };
    Ok((bytes, mean_motion))
}

fn reference_picture(frames: &[Frame], index: Option<usize>, slot: usize) -> Result<&Picture> {
    index
        .map(|i| &frames[i].picture)
        .ok_or_else(|| Error::format(format!("slot {} has no reference frame", slot)))
}

/// Transform and quantise every macroblock, collected in raster order.
fn quantize_macroblocks<T>(
    y: PlaneView<'_, T>,
    cb: PlaneView<'_, T>,
    cr: PlaneView<'_, T>,
    mb_cols: usize,
    mb_rows: usize,
    config: &EncoderConfig,
) -> Result<Vec<[QuantizedBlock; BLOCKS_PER_MACROBLOCK]>>
where
    T: Copy + Into<f64> + Sync,
{
    let _timer = StageTimer::new("transform");
    (0..mb_cols * mb_rows)
        .into_par_iter()
        .map(|index| {
            let blocks = macroblock_blocks(y, cb, cr, index % mb_cols, index / mb_cols);
            let mut quantized = [[0; 64]; BLOCKS_PER_MACROBLOCK];
            for (i, block) in blocks.iter().enumerate() {
                let freq = dct::spatial_to_freq(block);
                let table = if is_luma_block(i) {
                    &config.luma_table
                } else {
                    &config.chroma_table
                };
                quantized[i] = quantize(&freq, table, config.quantizer_scale)
                    .map_err(|e| e.in_block(index, i))?;
            }
            Ok(quantized)
        })
        .collect()
}

/// Vectors of the motion blocks covering one macroblock, raster order.
fn macroblock_vectors(field: &MotionField, mb_x: usize, mb_y: usize) -> Vec<MotionVector> {
    let per_side = MACROBLOCK_SIZE / field.block_size;
    let mut vectors = Vec::with_capacity(per_side * per_side);
    for row in 0..per_side {
        for col in 0..per_side {
            vectors.push(field.get(mb_x * per_side + col, mb_y * per_side + row));
        }
    }
    vectors
}

/// Encode `frames` in display order into a complete elementary stream.
pub fn encode_sequence<I>(frames: I, config: EncoderConfig) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Picture>,
{
    let mut encoder = Encoder::new(config, Vec::new())?;
    for picture in frames {
        encoder.push_frame(picture)?;
    }
    let (bytes, _report) = encoder.finish()?;
    Ok(bytes)
}
