#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RGB(pub (u8, u8, u8));

impl RGB {
    /// BT.601 full-range conversion.
    pub fn to_ycbcr(&self) -> YCbCr {
        let (r, g, b) = self.0;
        let (r, g, b) = (r as f32, g as f32, b as f32);

        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;

        YCbCr((clamp_sample(y), clamp_sample(cb), clamp_sample(cr)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YCbCr(pub (u8, u8, u8));

impl YCbCr {
    pub fn y(&self) -> u8 {
        self.0 .0
    }

    pub fn cb(&self) -> u8 {
        self.0 .1
    }

    pub fn cr(&self) -> u8 {
        self.0 .2
    }
}

pub(crate) fn clamp_sample(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
