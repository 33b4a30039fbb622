#![allow(clippy::identity_op)]

pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

pub const PICTURE_START_CODE: u8 = 0x00;
pub const SLICE_FIRST_START_CODE: u8 = 0x01;
pub const SLICE_LAST_START_CODE: u8 = 0xAF;
pub const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub const SEQUENCE_END_CODE: u8 = 0xB7;
pub const GROUP_START_CODE: u8 = 0xB8;
pub const PACK_START_CODE: u8 = 0xBA;
pub const SYSTEM_HEADER_START_CODE: u8 = 0xBB;
pub const VIDEO_STREAM_ID: u8 = 0xE0;

/// Stuffed after `00 00` inside slice payloads when the next byte is <= 3.
pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

pub const PICTURE_TYPE_INTRA: u8 = 0b001;
pub const PICTURE_TYPE_PREDICTIVE: u8 = 0b010;
pub const PICTURE_TYPE_B: u8 = 0b011;

/// Square pels.
pub const ASPECT_RATIO_CODE: u8 = 1;

/// Bit rate field value meaning "variable".
pub const VARIABLE_BIT_RATE: u32 = 0x3FFFF;

/// `ZIG_ZAG[scan position] = natural (row-major) index`.
#[rustfmt::skip]
pub const ZIG_ZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// `dct_dc_size_luminance`, indexed by size category: (code, length).
#[rustfmt::skip]
pub const DC_LUMINANCE: [(u16, u8); 12] = [
    (0b100, 3), (0b00, 2), (0b01, 2), (0b101, 3),
    (0b110, 3), (0b1110, 4), (0b11110, 5), (0b111110, 6),
    (0b1111110, 7), (0b11111110, 8), (0b111111110, 9), (0b111111111, 9),
];

/// `dct_dc_size_chrominance`, indexed by size category: (code, length).
#[rustfmt::skip]
pub const DC_CHROMINANCE: [(u16, u8); 12] = [
    (0b00, 2), (0b01, 2), (0b10, 2), (0b110, 3),
    (0b1110, 4), (0b11110, 5), (0b111110, 6), (0b1111110, 7),
    (0b11111110, 8), (0b111111110, 9), (0b1111111110, 10), (0b1111111111, 10),
];

pub const MAX_DC_CATEGORY: u32 = 11;

/// Run/size symbols. High nibble run, low nibble size.
pub const END_OF_BLOCK: u8 = 0x00;
pub const ZERO_RUN: u8 = 0xF0;
pub const ZERO_RUN_LENGTH: u32 = 15;

/// Prefix for (run, size) pairs missing from the AC tables, followed by a
/// 4-bit run and 4-bit size. Both tables leave the all-ones code unused.
pub const AC_ESCAPE: (u16, u8) = (0xFFFF, 16);

pub const MAX_AC_CATEGORY: u32 = 15;

/// Number of AC codes of each length 1..=16 (index 0 unused).
#[rustfmt::skip]
pub const AC_LUMINANCE_BITS: [u8; 17] = [0, 0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];

#[rustfmt::skip]
pub const AC_LUMINANCE_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

#[rustfmt::skip]
pub const AC_CHROMINANCE_BITS: [u8; 17] = [0, 0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];

#[rustfmt::skip]
pub const AC_CHROMINANCE_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// `motion_code` VLC for |motion_code| 0..=16, the sign bit follows
/// separately: (code, length).
#[rustfmt::skip]
pub const MOTION: [(u16, u8); 17] = [
    (0b1, 1),          (0b01, 2),         (0b001, 3),        (0b0001, 4),
    (0b000011, 6),     (0b0000101, 7),    (0b0000100, 7),    (0b0000011, 7),
    (0b000001011, 9),  (0b000001010, 9),  (0b000001001, 9),  (0b0000010001, 10),
    (0b0000010000, 10), (0b0000001111, 10), (0b0000001110, 10), (0b0000001101, 10),
    (0b0000001100, 10),
];

pub const MAX_F_CODE: u8 = 7;
