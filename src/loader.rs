use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::image::Picture;

/// Source of decoded 4:2:0 pictures.
pub trait FrameLoader {
    fn load_image(&self, path: &Path) -> Result<Picture>;
}

/// Planar I420 files holding exactly one frame of a known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawYuvLoader {
    pub width: usize,
    pub height: usize,
}

impl RawYuvLoader {
    pub fn new(width: usize, height: usize) -> RawYuvLoader {
        RawYuvLoader { width, height }
    }

    pub fn frame_size(&self) -> usize {
        self.width * self.height + 2 * (self.width / 2) * (self.height / 2)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Picture> {
        if bytes.len() != self.frame_size() {
            return Err(Error::format(format!(
                "I420 frame of {}x{} is {} bytes, got {}",
                self.width,
                self.height,
                self.frame_size(),
                bytes.len()
            )));
        }
        let luma = self.width * self.height;
        let chroma = (self.width / 2) * (self.height / 2);
        let (y, rest) = bytes.split_at(luma);
        let (cb, cr) = rest.split_at(chroma);
        Picture::from_planes(self.width, self.height, y.to_vec(), cb.to_vec(), cr.to_vec())
    }
}

impl FrameLoader for RawYuvLoader {
    fn load_image(&self, path: &Path) -> Result<Picture> {
        let bytes = fs::read(path)?;
        self.parse(&bytes)
    }
}

/// Loads `paths` in order; the first failure ends the job.
pub fn load_sequence<L, P>(loader: &L, paths: &[P]) -> Result<Vec<Picture>>
where
    L: FrameLoader + ?Sized,
    P: AsRef<Path>,
{
    let mut pictures = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let picture = loader.load_image(path).map_err(|e| match e {
            Error::Format(msg) => Error::Format(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded frame");
        pictures.push(picture);
    }
    Ok(pictures)
}

/// Frame files in a directory sorted by name.
pub fn sorted_frame_paths(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |e| e == extension))
        .collect::<Vec<PathBuf>>();
    paths.sort();
    Ok(paths)
}
