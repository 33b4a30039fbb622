use mpeg1_encoder::bitwriter::BitReader;
use mpeg1_encoder::block::{is_luma_block, macroblock_blocks, PlaneView, BLOCKS_PER_MACROBLOCK};
use mpeg1_encoder::dct::spatial_to_freq;
use mpeg1_encoder::gop::pattern_frame_type;
use mpeg1_encoder::motion::{
    compensate, compute_sad, estimate_motion, find_motion_vector, residual, MotionVector,
};
use mpeg1_encoder::mpeg1::entropy::{
    block_component, decode_block, decode_motion_component, DcPredictor,
};
use mpeg1_encoder::mpeg1::stream::unescape_payload;
use mpeg1_encoder::quant::quantize;
use mpeg1_encoder::{encode_sequence, Encoder, EncoderConfig, FrameType, Picture, PixelPlane};

fn start_code_offsets(bytes: &[u8], id: u8) -> Vec<usize> {
    bytes
        .windows(4)
        .enumerate()
        .filter(|(_, w)| w[..3] == [0, 0, 1] && w[3] == id)
        .map(|(i, _)| i)
        .collect()
}

fn textured(width: usize, height: usize, seed: u32) -> Picture {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        (state >> 24) as u8
    };
    let y = (0..width * height).map(|_| next()).collect();
    let cb = (0..width * height / 4).map(|_| next()).collect();
    let cr = (0..width * height / 4).map(|_| next()).collect();
    Picture::from_planes(width, height, y, cb, cr).unwrap()
}

#[test]
fn gray_intra_frame_stream_layout() {
    for scale in [1u8, 8, 31] {
        let gray = Picture::filled(16, 16, 128, 128, 128).unwrap();
        let config = EncoderConfig::new().with_gop_size(1).with_quantizer_scale(scale);
        let bytes = encode_sequence(vec![gray], config).unwrap();

        assert_eq!(
            &bytes[..12],
            &[0x00, 0x00, 0x01, 0xB3, 0x01, 0x00, 0x10, 0x13, 0xFF, 0xFF, 0xE0, 0x08]
        );
        let pictures = start_code_offsets(&bytes, 0x00);
        assert_eq!(pictures.len(), 1);
        let mut reader = BitReader::new(&bytes[pictures[0] + 4..]);
        assert_eq!(reader.read_bits(10), Some(0));
        assert_eq!(reader.read_bits(3), Some(1));
        assert_eq!(start_code_offsets(&bytes, 0xB8).len(), 1);
        assert_eq!(start_code_offsets(&bytes, 0x01).len(), 1);
        assert!(bytes.ends_with(&[0x00, 0x00, 0x01, 0xB7]));
    }
}

#[test]
fn identical_p_macroblock_codes_zero_motion_and_residual() {
    let picture = textured(16, 16, 99);

    let field = estimate_motion(&picture.y, &picture.y, 16, 16).unwrap();
    assert_eq!(field.vectors, vec![MotionVector::ZERO]);
    let predicted = compensate(&picture, &field).unwrap();
    let y = residual(&picture.y, &predicted.y).unwrap();
    let cb = residual(&picture.cb, &predicted.cb).unwrap();
    let cr = residual(&picture.cr, &predicted.cr).unwrap();
    let config = EncoderConfig::default();
    let blocks = macroblock_blocks(
        PlaneView::new(&y, 16),
        PlaneView::new(&cb, 8),
        PlaneView::new(&cr, 8),
        0,
        0,
    );
    for (i, block) in blocks.iter().enumerate() {
        let table = if is_luma_block(i) { &config.luma_table } else { &config.chroma_table };
        let q = quantize(&spatial_to_freq(block), table, config.quantizer_scale).unwrap();
        assert!(q.iter().all(|&c| c == 0));
    }

    // the same holds in the coded P picture
    let config = EncoderConfig::new().with_gop_size(2).with_b_frames(0);
    let f_code = config.f_code();
    let bytes = encode_sequence(vec![picture.clone(), picture], config).unwrap();
    let pictures = start_code_offsets(&bytes, 0x00);
    assert_eq!(pictures.len(), 2);
    let mut reader = BitReader::new(&bytes[pictures[1] + 4..]);
    reader.skip(10);
    assert_eq!(reader.read_bits(3), Some(2));

    let slice = start_code_offsets(&bytes[pictures[1]..], 0x01)[0] + pictures[1];
    let payload = unescape_payload(&bytes[slice + 4..]);
    let mut reader = BitReader::new(&payload);
    reader.skip(6);
    assert_eq!(decode_motion_component(&mut reader, f_code, 0).unwrap(), 0);
    assert_eq!(decode_motion_component(&mut reader, f_code, 0).unwrap(), 0);
    let mut predictor = DcPredictor::default();
    for i in 0..BLOCKS_PER_MACROBLOCK {
        let component = block_component(i);
        let (coeffs, dc) =
            decode_block(&mut reader, predictor.get(component), component.is_luma()).unwrap();
        assert!(coeffs.iter().all(|&c| c == 0), "block {}", i);
        predictor.set(component, dc);
    }
}

#[test]
fn intra_slice_decodes_to_quantized_blocks() {
    let picture = textured(32, 16, 5);
    let config = EncoderConfig::new().with_gop_size(1).with_quantizer_scale(2);
    let bytes = encode_sequence(vec![picture.clone()], config.clone()).unwrap();

    let slice = start_code_offsets(&bytes, 0x01)[0];
    let payload = unescape_payload(&bytes[slice + 4..]);
    let mut reader = BitReader::new(&payload);
    assert_eq!(reader.read_bits(5), Some(2));
    assert_eq!(reader.read_bit(), Some(false));

    let mut predictor = DcPredictor::default();
    for mb_x in 0..2 {
        let blocks = macroblock_blocks(
            PlaneView::new(picture.y.data(), 32),
            PlaneView::new(picture.cb.data(), 16),
            PlaneView::new(picture.cr.data(), 16),
            mb_x,
            0,
        );
        for (i, block) in blocks.iter().enumerate() {
            let table = if is_luma_block(i) { &config.luma_table } else { &config.chroma_table };
            let expected = quantize(&spatial_to_freq(block), table, 2).unwrap();
            let component = block_component(i);
            let (coeffs, dc) =
                decode_block(&mut reader, predictor.get(component), component.is_luma()).unwrap();
            assert_eq!(coeffs, expected, "macroblock {} block {}", mb_x, i);
            predictor.set(component, dc);
        }
    }
}

#[test]
fn only_headers_carry_start_codes() {
    // faint noise around mid grey yields long runs of +-1 coefficients
    let faint = |seed: u32| {
        let noisy = textured(32, 32, seed);
        let y = noisy.y.data().iter().map(|&v| 127 + v % 3).collect();
        let cb = noisy.cb.data().iter().map(|&v| 127 + v % 2).collect();
        let cr = noisy.cr.data().iter().map(|&v| 128 - v % 2).collect();
        Picture::from_planes(32, 32, y, cb, cr).unwrap()
    };
    let frames = vec![faint(1), textured(32, 32, 2), faint(3)];
    let config = EncoderConfig::new()
        .with_gop_size(3)
        .with_b_frames(1)
        .with_quantizer_scale(1)
        .with_search_range(4);
    let bytes = encode_sequence(frames, config).unwrap();

    let ids = bytes
        .windows(4)
        .filter(|w| w[..3] == [0, 0, 1])
        .map(|w| w[3])
        .collect::<Vec<u8>>();
    // sequence, GOP, then per picture its header and two slices, then the end code
    let mut expected = vec![0xB3, 0xB8];
    for _ in 0..3 {
        expected.extend_from_slice(&[0x00, 0x01, 0x02]);
    }
    expected.push(0xB7);
    assert_eq!(ids, expected);
}

#[test]
fn frame_types_follow_the_pattern_rule() {
    let config = EncoderConfig::new().with_gop_size(8).with_b_frames(2).with_search_range(2);
    let mut encoder = Encoder::new(config, Vec::new()).unwrap();
    for i in 0..16 {
        encoder.push_frame(textured(16, 16, i)).unwrap();
    }
    let (_bytes, report) = encoder.finish().unwrap();
    assert_eq!(report.frames.len(), 16);

    let mut by_display = report.frames.clone();
    by_display.sort_by_key(|f| f.display_index);
    for info in &by_display {
        let slot = info.display_index % 8;
        assert_eq!(info.slot, slot);
        assert_eq!(info.frame_type, pattern_frame_type(slot, 2), "display {}", info.display_index);
        if slot == 0 {
            assert_eq!(info.frame_type, FrameType::I);
        }
    }

    // every B is coded after the P that follows it in display order
    for (position, info) in report.frames.iter().enumerate() {
        if info.frame_type == FrameType::B {
            let next_p = report
                .frames
                .iter()
                .position(|f| f.frame_type == FrameType::P && f.display_index > info.display_index)
                .unwrap();
            assert!(next_p < position);
        }
    }
}

#[test]
fn sad_is_symmetric_and_zero_on_identity() {
    let a = textured(32, 32, 1);
    let b = textured(32, 32, 2);
    assert_eq!(compute_sad(&a.y, &a.y, (16, 0), (16, 0), 16), 0);
    assert_eq!(
        compute_sad(&a.y, &b.y, (0, 16), (8, 8), 16),
        compute_sad(&b.y, &a.y, (8, 8), (0, 16), 16)
    );
}

#[test]
fn motion_search_recovers_a_moved_block() {
    let background = PixelPlane::filled(64, 64, 40).unwrap();
    let patch = textured(16, 16, 77);
    let place = |x0: usize, y0: usize| {
        let mut data = background.data().to_vec();
        for y in 0..16 {
            for x in 0..16 {
                data[(y0 + y) * 64 + x0 + x] = patch.y.get(x, y);
            }
        }
        PixelPlane::new(64, 64, data).unwrap()
    };
    let reference = place(21, 27);
    let current = place(24, 24);
    let vector = find_motion_vector(&current, &reference, (24, 24), 16, 8);
    assert_eq!(vector, MotionVector::new(-3, 3));
    assert_eq!(find_motion_vector(&current, &reference, (24, 24), 16, 8), vector);
}
