//! Reference selection and resolution.
//!
//! A request can name reference subjects three ways, in priority order:
//! pinned tokens carried on the request itself, explicit reference
//! labels, and `@label` mentions mined from the prompt and the last
//! user message. Selection is pure; resolution hits the database and
//! the mirror.

use std::collections::HashMap;

use sqlx::PgPool;

use vidnova_core::mentions::{
    build_asset_registry, build_upload_registry, extract_mentions_in_order, last_user_text,
    AssetRef, ConversationMessage, UploadRef,
};
use vidnova_core::types::DbId;
use vidnova_db::repositories::ElementRepo;
use vidnova_storage::MirrorService;
use vidnova_veo::{MediaInput, ReferenceImage, MAX_REFERENCE_IMAGES};

use crate::generate::GenerationError;

/// Where a reference subject comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSource {
    /// The latest version of an element.
    Element(DbId),
    /// A raw user upload.
    Upload(DbId),
}

/// Parse a pinned reference token (`asset:<id>` or `upload:<id>`).
pub fn parse_pinned_token(token: &str) -> Option<ReferenceSource> {
    let (kind, id) = token.split_once(':')?;
    let id: DbId = id.parse().ok()?;
    match kind {
        "asset" => Some(ReferenceSource::Element(id)),
        "upload" => Some(ReferenceSource::Upload(id)),
        _ => None,
    }
}

/// Select up to `MAX_REFERENCE_IMAGES` reference sources.
///
/// Pinned tokens are taken first and cannot be displaced. Remaining
/// slots fill from explicit labels, then from mentions in the prompt
/// and the last user message. Duplicates keep their first position;
/// labels missing from both registries are ignored.
pub fn collect_reference_sources(
    pinned_tokens: &[String],
    explicit_labels: &[String],
    prompt: &str,
    history: &[ConversationMessage],
    uploads: &HashMap<String, UploadRef>,
    assets: &HashMap<String, AssetRef>,
) -> Vec<ReferenceSource> {
    let mut selected: Vec<ReferenceSource> = Vec::new();

    let mut push = |source: ReferenceSource, selected: &mut Vec<ReferenceSource>| {
        if selected.len() < MAX_REFERENCE_IMAGES && !selected.contains(&source) {
            selected.push(source);
        }
    };

    for token in pinned_tokens {
        if let Some(source) = parse_pinned_token(token) {
            push(source, &mut selected);
        }
    }

    let resolve_label = |label: &str| -> Option<ReferenceSource> {
        if let Some(asset) = assets.get(label) {
            return Some(ReferenceSource::Element(asset.element_id));
        }
        uploads
            .get(label)
            .map(|upload| ReferenceSource::Upload(upload.upload_id))
    };

    for label in explicit_labels {
        if let Some(source) = resolve_label(label) {
            push(source, &mut selected);
        }
    }

    let mined = format!("{prompt}\n{}", last_user_text(history));
    for label in extract_mentions_in_order(&mined) {
        if let Some(source) = resolve_label(&label) {
            push(source, &mut selected);
        }
    }

    selected
}

/// Convenience: build both registries from the history.
pub fn build_registries(
    history: &[ConversationMessage],
) -> (HashMap<String, UploadRef>, HashMap<String, AssetRef>) {
    (build_upload_registry(history), build_asset_registry(history))
}

/// Provider-ready reference images plus the row IDs they came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    pub images: Vec<ReferenceImage>,
    pub asset_ids: Vec<DbId>,
    pub upload_ids: Vec<DbId>,
}

/// Mirror each selected source and produce the `referenceImages`
/// entries. Elements resolve through their latest version's asset.
pub async fn resolve_references(
    pool: &PgPool,
    mirror: &MirrorService,
    user_id: &str,
    project_id: DbId,
    sources: &[ReferenceSource],
) -> Result<ResolvedReferences, GenerationError> {
    let mut resolved = ResolvedReferences::default();

    for source in sources {
        match source {
            ReferenceSource::Element(element_id) => {
                let latest = ElementRepo::find_latest_asset_by_id(pool, *element_id)
                    .await?
                    .ok_or(GenerationError::ElementHasNoAsset(*element_id))?;
                if latest.asset_user_id != user_id {
                    return Err(GenerationError::ElementHasNoAsset(*element_id));
                }
                let mirrored = mirror
                    .ensure_asset_mirrored(pool, latest.asset_id, user_id, project_id)
                    .await?;
                resolved.asset_ids.push(latest.asset_id);
                resolved.images.push(ReferenceImage::asset(MediaInput {
                    gcs_uri: mirrored.gcs_uri,
                    mime_type: mirrored.mime_type,
                }));
            }
            ReferenceSource::Upload(upload_id) => {
                let mirrored = mirror
                    .ensure_upload_mirrored(pool, *upload_id, user_id, project_id)
                    .await?;
                resolved.upload_ids.push(*upload_id);
                resolved.images.push(ReferenceImage::asset(MediaInput {
                    gcs_uri: mirrored.gcs_uri,
                    mime_type: mirrored.mime_type,
                }));
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registries() -> (HashMap<String, UploadRef>, HashMap<String, AssetRef>) {
        let mut uploads = HashMap::new();
        uploads.insert(
            "image-1".to_string(),
            UploadRef {
                label: "image-1".to_string(),
                upload_id: 101,
                mime_type: Some("image/png".to_string()),
            },
        );
        let mut assets = HashMap::new();
        assets.insert(
            "stacy".to_string(),
            AssetRef {
                label: "stacy".to_string(),
                element_id: 7,
            },
        );
        (uploads, assets)
    }

    #[test]
    fn pinned_tokens_parse() {
        assert_eq!(parse_pinned_token("asset:7"), Some(ReferenceSource::Element(7)));
        assert_eq!(parse_pinned_token("upload:101"), Some(ReferenceSource::Upload(101)));
        assert_eq!(parse_pinned_token("asset:abc"), None);
        assert_eq!(parse_pinned_token("frame:3"), None);
        assert_eq!(parse_pinned_token("upload"), None);
    }

    #[test]
    fn pinned_come_first_and_are_never_displaced() {
        let (uploads, assets) = registries();
        let sources = collect_reference_sources(
            &["asset:7".to_string(), "upload:5".to_string()],
            &[],
            "use @image-1 and @stacy please",
            &[],
            &uploads,
            &assets,
        );
        assert_eq!(
            sources,
            vec![
                ReferenceSource::Element(7),
                ReferenceSource::Upload(5),
                ReferenceSource::Upload(101),
            ]
        );
    }

    #[test]
    fn mentions_dedupe_against_pinned() {
        let (uploads, assets) = registries();
        let sources = collect_reference_sources(
            &["asset:7".to_string()],
            &["stacy".to_string()],
            "@stacy again",
            &[],
            &uploads,
            &assets,
        );
        assert_eq!(sources, vec![ReferenceSource::Element(7)]);
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let (uploads, assets) = registries();
        let sources = collect_reference_sources(
            &[],
            &["nope".to_string()],
            "ping @missing and @image-1",
            &[],
            &uploads,
            &assets,
        );
        assert_eq!(sources, vec![ReferenceSource::Upload(101)]);
    }

    #[test]
    fn selection_caps_at_provider_limit() {
        let (mut uploads, assets) = registries();
        for n in 2..6 {
            uploads.insert(
                format!("image-{n}"),
                UploadRef {
                    label: format!("image-{n}"),
                    upload_id: 100 + n,
                    mime_type: None,
                },
            );
        }
        let sources = collect_reference_sources(
            &[],
            &[],
            "@image-1 @image-2 @image-3 @image-4 @image-5",
            &[],
            &uploads,
            &assets,
        );
        assert_eq!(sources.len(), MAX_REFERENCE_IMAGES);
        assert_eq!(sources[0], ReferenceSource::Upload(101));
    }
}
