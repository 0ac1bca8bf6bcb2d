//! Pixel buffers exchanged with the host and the filter engine.
//!
//! The host stores images as interleaved BGRA scanlines, 8 or 16 bits per
//! sample, always four samples per pixel. The engine works on planar
//! `f32` images with 1 to 4 channels (gray, gray+alpha, RGB, RGBA) in the
//! 0..255 range whatever the host depth.

use crate::error::{BqmError, BqmResult};

/// Samples per host pixel.
pub const HOST_CHANNELS: usize = 4;

/// Scale between 16-bit host samples and the engine range.
const SIXTEEN_BIT_SCALE: f32 = 257.0;

/// Raw host sample storage.
#[derive(Debug, Clone, PartialEq)]
pub enum HostPixels {
    /// 8 bits per sample.
    U8(Vec<u8>),
    /// 16 bits per sample.
    U16(Vec<u16>),
}

/// Host image: interleaved BGRA.
#[derive(Debug, Clone, PartialEq)]
pub struct HostImage {
    width: u32,
    height: u32,
    has_alpha: bool,
    data: HostPixels,
}

impl HostImage {
    /// Creates a zeroed image.
    pub fn new(width: u32, height: u32, sixteen_bit: bool, has_alpha: bool) -> Self {
        let size = pixel_count(width, height) * HOST_CHANNELS;
        let data = if sixteen_bit {
            HostPixels::U16(vec![0; size])
        } else {
            HostPixels::U8(vec![0; size])
        };

        Self {
            width,
            height,
            has_alpha,
            data,
        }
    }

    /// Wraps existing samples, checking the buffer size.
    pub fn from_pixels(width: u32, height: u32, has_alpha: bool, data: HostPixels) -> BqmResult<Self> {
        let expected = pixel_count(width, height) * HOST_CHANNELS;
        let len = match &data {
            HostPixels::U8(v) => v.len(),
            HostPixels::U16(v) => v.len(),
        };
        if len != expected {
            return Err(BqmError::Buffer(format!(
                "{width}x{height} image needs {expected} samples, got {len}"
            )));
        }

        Ok(Self {
            width,
            height,
            has_alpha,
            data,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true for 16 bits per sample.
    pub fn sixteen_bit(&self) -> bool {
        matches!(self.data, HostPixels::U16(_))
    }

    /// Returns true if the alpha samples are meaningful.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Raw samples.
    pub fn pixels(&self) -> &HostPixels {
        &self.data
    }

    /// Returns true for a 0x0 image.
    pub fn is_null(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// BGRA sample at `(x, y)` widened to 16 bits.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u16; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * HOST_CHANNELS;
        let mut out = [0u16; 4];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = match &self.data {
                HostPixels::U8(v) => u16::from(v[at + c]),
                HostPixels::U16(v) => v[at + c],
            };
        }
        Some(out)
    }

    /// Copies the `w`x`h` region at `(x, y)`, clipped to the image.
    pub fn copy(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);

        let stride = self.width as usize * HOST_CHANNELS;
        let span = x as usize * HOST_CHANNELS..(x + w) as usize * HOST_CHANNELS;
        let rows = y as usize..(y + h) as usize;

        let data = match &self.data {
            HostPixels::U8(v) => HostPixels::U8(
                rows.flat_map(|row| &v[row * stride + span.start..row * stride + span.end])
                    .copied()
                    .collect(),
            ),
            HostPixels::U16(v) => HostPixels::U16(
                rows.flat_map(|row| &v[row * stride + span.start..row * stride + span.end])
                    .copied()
                    .collect(),
            ),
        };

        Self {
            width: w,
            height: h,
            has_alpha: self.has_alpha,
            data,
        }
    }

    /// Copies a region given in fractions of the image size.
    ///
    /// All four values negative selects the whole image. Otherwise the
    /// origin is floored and the extent grows by one pixel, clipped to the
    /// image, so previews never lose the last row or column.
    pub fn copy_normalized(&self, x: f64, y: f64, w: f64, h: f64) -> Self {
        if x < 0.0 && y < 0.0 && w < 0.0 && h < 0.0 {
            return self.clone();
        }

        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let ix = (x * width).floor().max(0.0) as u32;
        let iy = (y * height).floor().max(0.0) as u32;
        let iw = (1.0 + (w * width).ceil()).max(0.0) as u32;
        let ih = (1.0 + (h * height).ceil()).max(0.0) as u32;

        self.copy(ix, iy, iw, ih)
    }
}

/// Engine image: planar `f32`, channel after channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of channels.
    pub spectrum: u32,
    /// Samples, `spectrum` planes of `width * height` values.
    pub data: Vec<f32>,
}

impl EngineImage {
    /// Creates a zeroed image.
    pub fn new(width: u32, height: u32, spectrum: u32) -> Self {
        Self {
            width,
            height,
            spectrum,
            data: vec![0.0; pixel_count(width, height) * spectrum as usize],
        }
    }

    /// One channel plane.
    pub fn plane(&self, channel: u32) -> Option<&[f32]> {
        let len = pixel_count(self.width, self.height);
        let start = channel as usize * len;
        (channel < self.spectrum).then(|| &self.data[start..start + len])
    }

    /// Mutable channel plane.
    pub fn plane_mut(&mut self, channel: u32) -> Option<&mut [f32]> {
        let len = pixel_count(self.width, self.height);
        let start = channel as usize * len;
        if channel < self.spectrum {
            Some(&mut self.data[start..start + len])
        } else {
            None
        }
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

// ============================================================================
// Conversions
// ============================================================================

/// Host image to engine layout: RGB, plus alpha when the host has one.
pub fn host_to_engine(image: &HostImage) -> EngineImage {
    let spectrum = if image.has_alpha { 4 } else { 3 };
    let len = pixel_count(image.width, image.height);
    let mut out = EngineImage::new(image.width, image.height, spectrum);

    let sample = |i: usize| -> f32 {
        match &image.data {
            HostPixels::U8(v) => f32::from(v[i]),
            HostPixels::U16(v) => f32::from(v[i]) / SIXTEEN_BIT_SCALE,
        }
    };

    for p in 0..len {
        let src = p * HOST_CHANNELS;
        out.data[p] = sample(src + 2);
        out.data[len + p] = sample(src + 1);
        out.data[2 * len + p] = sample(src);
        if spectrum == 4 {
            out.data[3 * len + p] = sample(src + 3);
        }
    }

    out
}

/// Engine image back to host layout at the requested depth.
///
/// Gray images are replicated to the three colour samples; images without
/// alpha get an opaque alpha sample. Values are clamped to 0..255.
pub fn engine_to_host(image: &EngineImage, sixteen_bit: bool) -> BqmResult<HostImage> {
    if !(1..=4).contains(&image.spectrum) {
        return Err(BqmError::Buffer(format!("bad input spectrum ({})", image.spectrum)));
    }
    let len = pixel_count(image.width, image.height);
    if image.data.len() != len * image.spectrum as usize {
        return Err(BqmError::Buffer(format!(
            "{}x{}x{} image needs {} samples, got {}",
            image.width,
            image.height,
            image.spectrum,
            len * image.spectrum as usize,
            image.data.len()
        )));
    }

    let has_alpha = image.spectrum == 2 || image.spectrum == 4;
    let plane = |c: usize, p: usize| image.data[c * len + p].clamp(0.0, 255.0);

    let mut bgra = Vec::with_capacity(len * HOST_CHANNELS);
    for p in 0..len {
        let (r, g, b, a) = match image.spectrum {
            4 => (plane(0, p), plane(1, p), plane(2, p), Some(plane(3, p))),
            3 => (plane(0, p), plane(1, p), plane(2, p), None),
            2 => (plane(0, p), plane(0, p), plane(0, p), Some(plane(1, p))),
            _ => (plane(0, p), plane(0, p), plane(0, p), None),
        };
        bgra.extend([b, g, r, a.unwrap_or(255.0)]);
    }

    let data = if sixteen_bit {
        HostPixels::U16(bgra.into_iter().map(|v| (v * SIXTEEN_BIT_SCALE) as u16).collect())
    } else {
        HostPixels::U8(bgra.into_iter().map(|v| v as u8).collect())
    };

    HostImage::from_pixels(image.width, image.height, has_alpha, data)
}
