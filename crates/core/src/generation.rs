//! Video generation parameter enums and validation.
//!
//! These map 1:1 onto the values the Veo API accepts. Validation happens
//! here, before any row is written or any provider call is made.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Clip durations (seconds) the provider accepts.
pub const ALLOWED_DURATIONS: &[i32] = &[4, 6, 8];

/// Default clip duration in seconds.
pub const DEFAULT_DURATION_SECS: i32 = 8;

/// Sample count bounds.
pub const MIN_SAMPLE_COUNT: i32 = 1;
pub const MAX_SAMPLE_COUNT: i32 = 4;

/// How a video generation request uses its input media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoMode {
    Auto,
    TextToVideo,
    ImageToVideo,
    ReferencesToVideo,
    FrameInterpolation,
    VideoExtension,
    Inpaint,
}

impl VideoMode {
    /// Database / wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::TextToVideo => "text_to_video",
            Self::ImageToVideo => "image_to_video",
            Self::ReferencesToVideo => "references_to_video",
            Self::FrameInterpolation => "frame_interpolation",
            Self::VideoExtension => "video_extension",
            Self::Inpaint => "inpaint",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "auto" => Ok(Self::Auto),
            "text_to_video" => Ok(Self::TextToVideo),
            "image_to_video" => Ok(Self::ImageToVideo),
            "references_to_video" => Ok(Self::ReferencesToVideo),
            "frame_interpolation" => Ok(Self::FrameInterpolation),
            "video_extension" => Ok(Self::VideoExtension),
            "inpaint" => Ok(Self::Inpaint),
            other => Err(CoreError::Validation(format!(
                "Unknown video mode '{other}'"
            ))),
        }
    }
}

impl Default for VideoMode {
    fn default() -> Self {
        Self::Auto
    }
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(CoreError::Validation(format!(
                "Unknown aspect ratio '{other}'"
            ))),
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::Landscape
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::R720p => "720p",
            Self::R1080p => "1080p",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "720p" => Ok(Self::R720p),
            "1080p" => Ok(Self::R1080p),
            other => Err(CoreError::Validation(format!(
                "Unknown resolution '{other}'"
            ))),
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::R720p
    }
}

/// Validate a requested clip duration.
pub fn validate_duration(secs: i32) -> Result<(), CoreError> {
    if ALLOWED_DURATIONS.contains(&secs) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid duration {secs}s. Must be one of: {ALLOWED_DURATIONS:?}"
        )))
    }
}

/// Validate a requested sample count.
pub fn validate_sample_count(count: i32) -> Result<(), CoreError> {
    if (MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid sample count {count}. Must be between {MIN_SAMPLE_COUNT} and {MAX_SAMPLE_COUNT}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accepts_allowed_values() {
        for secs in [4, 6, 8] {
            assert!(validate_duration(secs).is_ok());
        }
    }

    #[test]
    fn duration_rejects_other_values() {
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(5).is_err());
        assert!(validate_duration(10).is_err());
    }

    #[test]
    fn sample_count_bounds() {
        assert!(validate_sample_count(1).is_ok());
        assert!(validate_sample_count(4).is_ok());
        assert!(validate_sample_count(0).is_err());
        assert!(validate_sample_count(5).is_err());
    }

    #[test]
    fn mode_round_trips_through_name() {
        for mode in [
            VideoMode::Auto,
            VideoMode::TextToVideo,
            VideoMode::ImageToVideo,
            VideoMode::ReferencesToVideo,
            VideoMode::FrameInterpolation,
            VideoMode::VideoExtension,
            VideoMode::Inpaint,
        ] {
            assert_eq!(VideoMode::from_name(mode.as_str()).unwrap(), mode);
        }
        assert!(VideoMode::from_name("slideshow").is_err());
    }

    #[test]
    fn aspect_ratio_and_resolution_names() {
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
        assert_eq!(Resolution::R1080p.as_str(), "1080p");
        assert!(AspectRatio::from_name("4:3").is_err());
        assert!(Resolution::from_name("480p").is_err());
    }
}
