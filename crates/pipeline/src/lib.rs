//! Generation pipeline: reference resolution, the synchronous
//! generate-and-poll flow, and the out-of-band job sweeper.

pub mod generate;
pub mod references;
pub mod sweeper;

pub use generate::{GenerateVideoParams, GenerationError, JobHandle, VideoGenerator};
pub use references::{collect_reference_sources, ReferenceSource, ResolvedReferences};
pub use sweeper::{sweep, SweepReport, MAX_CONSECUTIVE_POLL_ERRORS};
