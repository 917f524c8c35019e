use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
    Torch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoFocus {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteBalance {
    #[default]
    Auto,
    Sunny,
    Cloudy,
    Shadow,
    Incandescent,
    Fluorescent,
}

/// Platform whose camera subsystem decides how default picture sizes are picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Reports named quality presets such as "High" alongside concrete sizes
    Ios,
    Android,
    Linux,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Whether the default picture size is a named preset rather than the largest size
    pub fn uses_preset_labels(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

/// Width:height ratio a camera is asked to capture at, written as `"16:9"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const WIDE: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };

    /// Whether a `width x height` frame has exactly this ratio
    pub fn matches(&self, width: u32, height: u32) -> bool {
        width as u64 * self.height as u64 == height as u64 * self.width as u64
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::WIDE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| format!("aspect ratio '{}' must look like 16:9", s))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid aspect ratio width '{}': {}", w, e))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid aspect ratio height '{}': {}", h, e))?;

        if width == 0 || height == 0 {
            return Err(format!("aspect ratio '{}' must not contain zero", s));
        }

        Ok(Self { width, height })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}

/// A still-image size as reported by the camera: either `"WIDTHxHEIGHT"` or a preset label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PictureSize(String);

impl PictureSize {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self(label.into())
    }

    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self(format!("{}x{}", width, height))
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Pixel dimensions, or `None` for preset labels like `"High"`
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.0.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    }
}

impl fmt::Display for PictureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PictureSize {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Snapshot of the parameters a still capture is taken with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub flash_mode: FlashMode,
    pub zoom: f32,
    pub auto_focus: AutoFocus,
    pub facing: Facing,
    pub white_balance: WhiteBalance,
    pub aspect_ratio: AspectRatio,
    pub picture_size: Option<PictureSize>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            flash_mode: FlashMode::Off,
            zoom: 0.0,
            auto_focus: AutoFocus::On,
            facing: Facing::Back,
            white_balance: WhiteBalance::Auto,
            aspect_ratio: AspectRatio::WIDE,
            picture_size: None,
        }
    }
}

/// Image written by the camera to its transient location
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}
