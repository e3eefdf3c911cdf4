//! Row models and request/response DTOs, one module per table.

pub mod asset;
pub mod element;
pub mod element_version;
pub mod project;
pub mod status;
pub mod upload;
pub mod video;
pub mod video_job;
pub mod video_version;
