//! Repository structs, one per table. All methods take a `&PgPool`
//! (or an open transaction) and return `sqlx::Error`.

pub mod asset_repo;
pub mod element_repo;
pub mod element_version_repo;
pub mod project_repo;
pub mod upload_repo;
pub mod video_job_repo;
pub mod video_repo;
pub mod video_version_repo;

pub use asset_repo::AssetRepo;
pub use element_repo::ElementRepo;
pub use element_version_repo::ElementVersionRepo;
pub use project_repo::ProjectRepo;
pub use upload_repo::UploadRepo;
pub use video_job_repo::VideoJobRepo;
pub use video_repo::VideoRepo;
pub use video_version_repo::VideoVersionRepo;
