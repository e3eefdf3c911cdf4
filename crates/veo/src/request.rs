//! Request body construction for `predictLongRunning`.
//!
//! Veo takes a single instance object (prompt plus optional media
//! conditioning) and a parameters object. Absent fields must be omitted
//! entirely, not sent as null.

use serde::Serialize;

use vidnova_core::generation::{AspectRatio, Resolution};

/// Veo rejects requests with more than three reference images.
pub const MAX_REFERENCE_IMAGES: usize = 3;

/// A media object already mirrored into provider-readable storage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput {
    pub gcs_uri: String,
    pub mime_type: String,
}

/// Inpaint mask. `mask_mode` selects how the mask is interpreted
/// (e.g. `MASK_MODE_USER_PROVIDED`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskInput {
    pub gcs_uri: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_mode: Option<String>,
}

/// One entry of the instance's `referenceImages` array.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub image: MediaInput,
    pub reference_type: String,
}

impl ReferenceImage {
    /// Reference conveying a subject to keep consistent across frames.
    pub fn asset(image: MediaInput) -> Self {
        Self {
            image,
            reference_type: "asset".to_string(),
        }
    }
}

/// Full generation request. Which media fields are set determines the
/// generation mode the provider runs (image-to-video, interpolation,
/// extension, inpaint).
#[derive(Debug, Clone)]
pub struct GenerateVideoRequest {
    pub prompt: String,
    pub image: Option<MediaInput>,
    pub last_frame: Option<MediaInput>,
    pub video: Option<MediaInput>,
    pub mask: Option<MaskInput>,
    pub reference_images: Vec<ReferenceImage>,
    /// `gs://` prefix the provider writes outputs under.
    pub storage_uri: String,
    pub sample_count: u32,
    pub duration_seconds: u32,
    pub generate_audio: bool,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub negative_prompt: Option<String>,
}

impl GenerateVideoRequest {
    /// Assemble the `{"instances": [...], "parameters": {...}}` body.
    pub fn to_body(&self) -> serde_json::Value {
        let mut instance = serde_json::Map::new();
        instance.insert("prompt".to_string(), serde_json::json!(self.prompt));

        if let Some(image) = &self.image {
            instance.insert("image".to_string(), serde_json::json!(image));
        }
        if let Some(last_frame) = &self.last_frame {
            instance.insert("lastFrame".to_string(), serde_json::json!(last_frame));
        }
        if let Some(video) = &self.video {
            instance.insert("video".to_string(), serde_json::json!(video));
        }
        if let Some(mask) = &self.mask {
            instance.insert("mask".to_string(), serde_json::json!(mask));
        }
        if !self.reference_images.is_empty() {
            instance.insert(
                "referenceImages".to_string(),
                serde_json::json!(self.reference_images),
            );
        }

        let mut parameters = serde_json::Map::new();
        parameters.insert("storageUri".to_string(), serde_json::json!(self.storage_uri));
        parameters.insert("sampleCount".to_string(), serde_json::json!(self.sample_count));
        parameters.insert(
            "durationSeconds".to_string(),
            serde_json::json!(self.duration_seconds),
        );
        parameters.insert(
            "generateAudio".to_string(),
            serde_json::json!(self.generate_audio),
        );
        parameters.insert(
            "aspectRatio".to_string(),
            serde_json::json!(self.aspect_ratio.as_str()),
        );
        parameters.insert(
            "resolution".to_string(),
            serde_json::json!(self.resolution.as_str()),
        );
        if let Some(negative) = &self.negative_prompt {
            parameters.insert("negativePrompt".to_string(), serde_json::json!(negative));
        }

        serde_json::json!({
            "instances": [instance],
            "parameters": parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> GenerateVideoRequest {
        GenerateVideoRequest {
            prompt: "a fox running".to_string(),
            image: None,
            last_frame: None,
            video: None,
            mask: None,
            reference_images: Vec::new(),
            storage_uri: "gs://outputs/u/p/v/1/".to_string(),
            sample_count: 1,
            duration_seconds: 8,
            generate_audio: true,
            aspect_ratio: AspectRatio::Landscape,
            resolution: Resolution::R720p,
            negative_prompt: None,
        }
    }

    #[test]
    fn text_to_video_body_omits_media_fields() {
        let body = minimal().to_body();
        let instance = &body["instances"][0];

        assert_eq!(instance["prompt"], "a fox running");
        assert!(instance.get("image").is_none());
        assert!(instance.get("referenceImages").is_none());
        assert_eq!(body["parameters"]["storageUri"], "gs://outputs/u/p/v/1/");
        assert_eq!(body["parameters"]["durationSeconds"], 8);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert!(body["parameters"].get("negativePrompt").is_none());
    }

    #[test]
    fn media_fields_use_provider_casing() {
        let mut request = minimal();
        request.image = Some(MediaInput {
            gcs_uri: "gs://mirror/a.png".to_string(),
            mime_type: "image/png".to_string(),
        });
        request.last_frame = Some(MediaInput {
            gcs_uri: "gs://mirror/b.png".to_string(),
            mime_type: "image/png".to_string(),
        });
        request.negative_prompt = Some("blurry".to_string());

        let body = request.to_body();
        let instance = &body["instances"][0];

        assert_eq!(instance["image"]["gcsUri"], "gs://mirror/a.png");
        assert_eq!(instance["image"]["mimeType"], "image/png");
        assert_eq!(instance["lastFrame"]["gcsUri"], "gs://mirror/b.png");
        assert_eq!(body["parameters"]["negativePrompt"], "blurry");
    }

    #[test]
    fn reference_images_carry_asset_type() {
        let mut request = minimal();
        request.reference_images = vec![ReferenceImage::asset(MediaInput {
            gcs_uri: "gs://mirror/ref.png".to_string(),
            mime_type: "image/png".to_string(),
        })];

        let body = request.to_body();
        let refs = &body["instances"][0]["referenceImages"];

        assert_eq!(refs.as_array().map(Vec::len), Some(1));
        assert_eq!(refs[0]["image"]["gcsUri"], "gs://mirror/ref.png");
        assert_eq!(refs[0]["referenceType"], "asset");
    }

    #[test]
    fn mask_includes_mode_when_set() {
        let mut request = minimal();
        request.video = Some(MediaInput {
            gcs_uri: "gs://mirror/base.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        });
        request.mask = Some(MaskInput {
            gcs_uri: "gs://mirror/mask.png".to_string(),
            mime_type: "image/png".to_string(),
            mask_mode: Some("MASK_MODE_USER_PROVIDED".to_string()),
        });

        let body = request.to_body();
        let instance = &body["instances"][0];

        assert_eq!(instance["mask"]["gcsUri"], "gs://mirror/mask.png");
        assert_eq!(instance["mask"]["maskMode"], "MASK_MODE_USER_PROVIDED");
    }
}
