//! Client for the Vertex AI Veo video generation API.
//!
//! Veo runs generations as long-running operations: a submit call
//! returns an operation name, and the caller polls
//! `fetchPredictOperation` until the operation reports done.

pub mod client;
pub mod poll;
pub mod request;

pub use client::{
    MetadataTokenProvider, OperationClient, OperationStatus, OutputVideo, StaticTokenProvider,
    TokenProvider, VeoApiError, VeoClient, VeoConfig, VEO_MODEL_ID,
};
pub use poll::{poll_until_done, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use request::{GenerateVideoRequest, MaskInput, MediaInput, ReferenceImage, MAX_REFERENCE_IMAGES};
