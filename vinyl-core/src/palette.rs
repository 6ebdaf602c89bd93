//! Now-playing colours derived from the album cover.

use crate::cover::CoverArt;
use image::imageops::FilterType;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness, 0.0..=255.0
    #[must_use]
    pub fn luminance(self) -> f32 {
        0.299 * f32::from(self.r) + 0.587 * f32::from(self.g) + 0.114 * f32::from(self.b)
    }

    /// Black on light colours, white on dark ones.
    #[must_use]
    pub fn contrasting(self) -> Self {
        if self.luminance() > 128.0 {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }

    /// `#rrggbb`
    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Background/text colour pair handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb,
    pub text: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::new(0x20, 0x20, 0x20),
            text: Rgb::WHITE,
        }
    }
}

impl Palette {
    /// Palette for a cover: its average colour plus a readable text colour.
    #[must_use]
    pub fn from_cover(cover: &CoverArt) -> Self {
        match cover {
            CoverArt::Embedded { data, .. } => average_color(data).map_or_else(Self::default, |background| Self {
                background,
                text: background.contrasting(),
            }),
            CoverArt::Placeholder => Self::default(),
        }
    }
}

/// Longest edge a cover is shrunk to before averaging
const SAMPLE_EDGE: u32 = 64;

fn average_color(data: &[u8]) -> Option<Rgb> {
    let img = image::load_from_memory(data).ok()?;
    let img = if img.width() > SAMPLE_EDGE || img.height() > SAMPLE_EDGE {
        img.resize(SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Triangle)
    } else {
        img
    };
    let pixels = img.to_rgb8();

    let count = u64::from(pixels.width()) * u64::from(pixels.height());
    if count == 0 {
        return None;
    }
    let mut sums = [0_u64; 3];
    for pixel in pixels.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }
    let [r, g, b] = sums.map(|sum| u8::try_from(sum / count).unwrap_or(u8::MAX));
    Some(Rgb::new(r, g, b))
}
