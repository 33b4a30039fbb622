use crate::error::{try_alloc, Error, Result};
use crate::pixel::{YCbCr, RGB};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Y,
    Cb,
    Cr,
}

impl Component {
    pub fn is_luma(&self) -> bool {
        matches!(self, Component::Y)
    }
}

/// Row-major 8-bit samples. Never mutated once built; every stage that
/// produces samples allocates a fresh plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelPlane {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelPlane {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<PixelPlane> {
        if data.len() != width * height {
            return Err(Error::format(format!(
                "plane of {}x{} needs {} samples, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(PixelPlane {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Result<PixelPlane> {
        let mut data = try_alloc::<u8>(width * height, "pixel plane")?;
        data.iter_mut().for_each(|s| *s = value);
        Ok(PixelPlane {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

/// One 4:2:0 frame: full-size luma, half-size chroma in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub y: PixelPlane,
    pub cb: PixelPlane,
    pub cr: PixelPlane,
}

impl Picture {
    pub fn from_planes(
        width: usize,
        height: usize,
        y: Vec<u8>,
        cb: Vec<u8>,
        cr: Vec<u8>,
    ) -> Result<Picture> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::format(format!(
                "4:2:0 picture needs even dimensions, got {}x{}",
                width, height
            )));
        }
        let (cw, ch) = (width / 2, height / 2);
        Ok(Picture {
            y: PixelPlane::new(width, height, y)?,
            cb: PixelPlane::new(cw, ch, cb)?,
            cr: PixelPlane::new(cw, ch, cr)?,
        })
    }

    /// Interleaved 8-bit RGB to 4:2:0, chroma averaged over each 2x2 square.
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> Result<Picture> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::format(format!(
                "4:2:0 picture needs even dimensions, got {}x{}",
                width, height
            )));
        }
        if rgb.len() != width * height * 3 {
            return Err(Error::format(format!(
                "RGB image of {}x{} needs {} bytes, got {}",
                width,
                height,
                width * height * 3,
                rgb.len()
            )));
        }

        let pixels = rgb
            .chunks_exact(3)
            .map(|p| RGB((p[0], p[1], p[2])).to_ycbcr())
            .collect::<Vec<YCbCr>>();

        let y = pixels.iter().map(|p| p.y()).collect::<Vec<u8>>();
        let (cw, ch) = (width / 2, height / 2);
        let mut cb = try_alloc::<u8>(cw * ch, "Cb plane")?;
        let mut cr = try_alloc::<u8>(cw * ch, "Cr plane")?;
        for cy in 0..ch {
            for cx in 0..cw {
                let (mut sum_cb, mut sum_cr) = (0u32, 0u32);
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let p = &pixels[(2 * cy + dy) * width + 2 * cx + dx];
                    sum_cb += p.cb() as u32;
                    sum_cr += p.cr() as u32;
                }
                cb[cy * cw + cx] = ((sum_cb + 2) / 4) as u8;
                cr[cy * cw + cx] = ((sum_cr + 2) / 4) as u8;
            }
        }

        Picture::from_planes(width, height, y, cb, cr)
    }

    /// Uniform picture, handy for tests and padding.
    pub fn filled(width: usize, height: usize, y: u8, cb: u8, cr: u8) -> Result<Picture> {
        Ok(Picture {
            y: PixelPlane::filled(width, height, y)?,
            cb: PixelPlane::filled(width / 2, height / 2, cb)?,
            cr: PixelPlane::filled(width / 2, height / 2, cr)?,
        })
    }

    pub fn width(&self) -> usize {
        self.y.width()
    }

    pub fn height(&self) -> usize {
        self.y.height()
    }

    /// Even luma size with both chroma planes exactly half of it.
    pub fn check_layout(&self) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::format(format!(
                "4:2:0 picture needs even dimensions, got {}x{}",
                width, height
            )));
        }
        for (name, plane) in [("Cb", &self.cb), ("Cr", &self.cr)] {
            if plane.width() != width / 2 || plane.height() != height / 2 {
                return Err(Error::format(format!(
                    "{} plane is {}x{}, a {}x{} picture needs {}x{}",
                    name,
                    plane.width(),
                    plane.height(),
                    width,
                    height,
                    width / 2,
                    height / 2
                )));
            }
        }
        Ok(())
    }
}
