//! Error types for the encoder

use thiserror::Error;

use crate::gop::FrameType;

/// Result type alias for encoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the encoder
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid encoder parameters or tables, rejected before encoding starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A frame or coefficient buffer could not be allocated
    #[error("Resource error: {0}")]
    Resource(String),

    /// Input pictures do not have a layout the encoder accepts
    #[error("Format error: {0}")]
    Format(String),

    /// Writing the finished stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value fell outside every code the VLC tables can express
    #[error("Coefficient overflow: {what} value {value} needs category {category}")]
    CoefficientOverflow {
        what: &'static str,
        value: i32,
        category: u32,
    },

    /// One block of a macroblock (raster index) could not be coded
    #[error("Macroblock {macroblock} block {block}: {source}")]
    Block {
        macroblock: usize,
        block: usize,
        #[source]
        source: Box<Error>,
    },

    /// A reference picture of this frame was itself dropped
    #[error("Reference slot {reference} was dropped")]
    ReferenceDropped { reference: usize },

    /// A frame failed part way through; none of its bytes were written
    #[error("Frame {display_index} ({frame_type:?}, GOP slot {slot}) failed: {source}")]
    Frame {
        slot: usize,
        display_index: usize,
        frame_type: FrameType,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a resource error
    pub fn resource<S: Into<String>>(msg: S) -> Self {
        Error::Resource(msg.into())
    }

    /// Tag the error with the macroblock and block it came from
    pub fn in_block(self, macroblock: usize, block: usize) -> Self {
        Error::Block {
            macroblock,
            block,
            source: Box::new(self),
        }
    }

    /// Whether the whole job must stop, as opposed to just the current frame
    pub fn is_fatal_for_job(&self) -> bool {
        match self {
            Error::Configuration(_) | Error::Io(_) | Error::Format(_) => true,
            Error::Frame { source, .. } | Error::Block { source, .. } => source.is_fatal_for_job(),
            Error::Resource(_)
            | Error::CoefficientOverflow { .. }
            | Error::ReferenceDropped { .. } => false,
        }
    }
}

/// Allocate a zeroed buffer, reporting failure instead of aborting.
pub(crate) fn try_alloc<T: Clone + Default>(len: usize, what: &str) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| Error::resource(format!("{} ({} elements): {}", what, len, e)))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_error_reports_slot() {
        let err = Error::Frame {
            slot: 3,
            display_index: 11,
            frame_type: FrameType::P,
            source: Box::new(Error::resource("predicted plane")),
        };
        let msg = err.to_string();
        assert!(msg.contains("Frame 11"));
        assert!(msg.contains("slot 3"));
        assert!(!err.is_fatal_for_job());
    }

    #[test]
    fn test_block_error_names_position() {
        let err = Error::CoefficientOverflow {
            what: "DC difference",
            value: -4080,
            category: 12,
        }
        .in_block(5, 4);
        assert!(err.to_string().starts_with("Macroblock 5 block 4"));
        assert!(!err.is_fatal_for_job());
        assert!(Error::format("plane").in_block(0, 0).is_fatal_for_job());
        assert!(!Error::ReferenceDropped { reference: 3 }.is_fatal_for_job());
    }

    #[test]
    fn test_io_is_fatal() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(err.is_fatal_for_job());
        assert!(Error::configuration("scale").is_fatal_for_job());
    }

    #[test]
    fn test_try_alloc_zeroed() {
        let buf: Vec<u8> = try_alloc(16, "plane").unwrap();
        assert_eq!(buf, vec![0; 16]);
    }
}
