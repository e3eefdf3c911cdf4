//! Domain errors shared by every crate in the workspace.
//!
//! Only errors that domain logic itself can produce live here. Transport
//! concerns (database, storage, provider) carry their own error types and
//! are classified by the API layer.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced row does not exist. Owner-scoped lookups also land
    /// here so callers cannot distinguish missing from foreign rows.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input rejected before any state changed.
    #[error("{0}")]
    Validation(String),

    /// Missing or unusable credentials.
    #[error("{0}")]
    Unauthorized(String),
}
