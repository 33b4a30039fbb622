//! MPEG-1 video layer: tables, entropy coding, headers and picture assembly.

pub mod constants;
pub mod entropy;
pub mod headers;
pub mod stream;
