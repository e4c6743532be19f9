//! Shared types used across the crate.
//! Includes the `PixelBuffer` every stage borrows, `Rgb` palette entries with hex
//! helpers, crop/boost rectangles, and the CLI-facing enums (`OutputFormat`,
//! `ResampleFilter`, `PaletteSource`).
use clap::ValueEnum;
use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Decoded RGBA image: row-major, top-left origin, 4 bytes per pixel.
///
/// The length invariant `data.len() == width * height * 4` is checked on
/// construction and never changes afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer of the given size with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * 4);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGBA of the pixel at (x, y). Caller guarantees the coordinate is in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    /// `(height, width, channel)` view over the raw bytes.
    pub fn view(&self) -> Result<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, 4),
            self.data.as_slice(),
        )
        .map_err(Error::external)
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// An opaque RGB color.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parses `#rrggbb` or the `#rgb` shorthand; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument {
            arg: "hex",
            value: hex.to_string(),
        };
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(parse(0..2)?, parse(2..4)?, parse(4..6)?))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.r, value.g, value.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Color channel selector. Declaration order is the split tie-break priority.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// Crop rectangle in source-image pixel coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CropCandidate {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropCandidate {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    /// Area shared with a boost rectangle, in square pixels.
    pub fn overlap_area(&self, boost: &BoostRegion) -> f64 {
        let left = (self.x as f64).max(boost.x);
        let top = (self.y as f64).max(boost.y);
        let right = (self.right() as f64).min(boost.x + boost.width);
        let bottom = (self.bottom() as f64).min(boost.y + boost.height);
        if right <= left || bottom <= top {
            0.0
        } else {
            (right - left) * (bottom - top)
        }
    }
}

/// Region whose interestingness is amplified during crop scoring
/// (e.g. a known face location).
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BoostRegion {
    /// Pixels from the left side.
    pub x: f64,
    /// Pixels from the top.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// In the range `[0, 1]`.
    pub weight: f64,
}

impl BoostRegion {
    /// All fields finite, non-negative size and `weight` in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.x, self.y, self.width, self.height, self.weight]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width < 0.0 || self.height < 0.0 || !(0.0..=1.0).contains(&self.weight)
        {
            return Err(Error::InvalidArgument {
                arg: "boost",
                value: format!(
                    "{},{},{},{},{}",
                    self.x, self.y, self.width, self.height, self.weight
                ),
            });
        }
        Ok(())
    }
}

impl std::str::FromStr for BoostRegion {
    type Err = Error;

    /// Parses `x,y,width,height,weight`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument {
            arg: "boost",
            value: s.to_string(),
        };
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<f64>>>()?;
        let [x, y, width, height, weight] = values[..] else {
            return Err(invalid());
        };
        let boost = Self {
            x,
            y,
            width,
            height,
            weight,
        };
        boost.validate().map_err(|_| invalid())?;
        Ok(boost)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg, // Lossy, drops alpha
    Tiff,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tiff",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "PNG"),
            OutputFormat::Jpeg => write!(f, "JPEG"),
            OutputFormat::Tiff => write!(f, "TIFF"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl std::fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleFilter::Nearest => write!(f, "Nearest"),
            ResampleFilter::Bilinear => write!(f, "Bilinear"),
            ResampleFilter::Lanczos3 => write!(f, "Lanczos3"),
        }
    }
}

/// Which buffer the pipeline samples for the palette.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteSource {
    /// The rendered, output-sized crop
    #[default]
    Cropped,
    /// The full source image
    Original,
}
