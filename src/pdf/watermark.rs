use std::path::PathBuf;
use tracing::{debug, warn};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Image drawn behind every page, with the opacity it is blended at
#[derive(Debug, Clone)]
pub struct Watermark {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    pub opacity: f32,
}

impl Watermark {
    /// Height over width, used to keep the aspect ratio when scaling
    pub fn aspect_ratio(&self) -> f32 {
        self.height_px as f32 / self.width_px as f32
    }
}

/// The watermark is cosmetic: failing to load it skips it, nothing more
#[derive(Debug, Clone)]
pub enum WatermarkOutcome {
    Applied(Watermark),
    Skipped { reason: String },
}

impl WatermarkOutcome {
    pub fn applied(&self) -> Option<&Watermark> {
        match self {
            WatermarkOutcome::Applied(watermark) => Some(watermark),
            WatermarkOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied().is_some()
    }
}

/// Where the watermark image comes from
pub trait WatermarkSource {
    fn load(&self) -> WatermarkOutcome;
}

/// Used when no watermark is configured
pub struct NoWatermark;

impl WatermarkSource for NoWatermark {
    fn load(&self) -> WatermarkOutcome {
        WatermarkOutcome::Skipped {
            reason: "no watermark configured".to_string(),
        }
    }
}

/// PNG or JPEG image read from disk
pub struct FileWatermark {
    pub path: PathBuf,
    pub opacity: f32,
}

impl WatermarkSource for FileWatermark {
    fn load(&self) -> WatermarkOutcome {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = format!("cannot read {}: {e}", self.path.display());
                warn!("Skipping watermark: {reason}");
                return WatermarkOutcome::Skipped { reason };
            }
        };

        let Some((format, width_px, height_px)) = probe_dimensions(&bytes) else {
            let reason = format!("{} is not a readable PNG or JPEG", self.path.display());
            warn!("Skipping watermark: {reason}");
            return WatermarkOutcome::Skipped { reason };
        };

        if !has_end_marker(format, &bytes) {
            let reason = format!("{} is truncated", self.path.display());
            warn!("Skipping watermark: {reason}");
            return WatermarkOutcome::Skipped { reason };
        }

        debug!(
            path = %self.path.display(),
            width_px,
            height_px,
            "Loaded watermark"
        );

        WatermarkOutcome::Applied(Watermark {
            bytes,
            format,
            width_px,
            height_px,
            opacity: self.opacity.clamp(0.0, 1.0),
        })
    }
}

/// Read the image format and pixel size from a PNG or JPEG header
pub fn probe_dimensions(bytes: &[u8]) -> Option<(ImageFormat, u32, u32)> {
    let (format, width, height) = if bytes.starts_with(&PNG_SIGNATURE) {
        probe_png(bytes)?
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        probe_jpeg(bytes)?
    } else {
        return None;
    };

    (width > 0 && height > 0).then_some((format, width, height))
}

/// PNG files close with an IEND chunk, JPEG files with an EOI marker.
/// A file cut short loses it; a damaged body in between is only caught by
/// the PDF compiler.
fn has_end_marker(format: ImageFormat, bytes: &[u8]) -> bool {
    match format {
        ImageFormat::Png => {
            bytes.len() >= 12 && &bytes[bytes.len() - 8..bytes.len() - 4] == b"IEND"
        }
        ImageFormat::Jpeg => bytes.ends_with(&[0xFF, 0xD9]),
    }
}

fn probe_png(bytes: &[u8]) -> Option<(ImageFormat, u32, u32)> {
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
    Some((ImageFormat::Png, width, height))
}

fn probe_jpeg(bytes: &[u8]) -> Option<(ImageFormat, u32, u32)> {
    let be16 = |at: usize| -> Option<u16> {
        Some(u16::from_be_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
    };

    let mut i = 2;
    loop {
        if *bytes.get(i)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(i + 1)?;
        match marker {
            // fill byte
            0xFF => i += 1,
            // markers without a length field
            0x01 | 0xD0..=0xD7 => i += 2,
            0xD9 | 0xDA => return None,
            // start-of-frame markers carry the size
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be16(i + 5)?;
                let width = be16(i + 7)?;
                return Some((ImageFormat::Jpeg, width as u32, height as u32));
            }
            _ => {
                let length = be16(i + 2)? as usize;
                i += 2 + length;
            }
        }
    }
}
