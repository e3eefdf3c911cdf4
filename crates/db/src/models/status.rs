//! Status helper enums mapping to SMALLINT columns.
//!
//! Each enum variant's discriminant is the value stored in the status
//! column of the corresponding table.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Wire/display name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Parse from a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Element (logical creative asset) lifecycle status.
    ElementStatus {
        Draft = 1 => "draft",
        Generating = 2 => "generating",
        Ready = 3 => "ready",
        Failed = 4 => "failed",
        Archived = 5 => "archived",
    }
}

define_status_enum! {
    /// Element version lifecycle status.
    ElementVersionStatus {
        Draft = 1 => "draft",
        Processing = 2 => "processing",
        Ready = 3 => "ready",
        Failed = 4 => "failed",
    }
}

define_status_enum! {
    /// Video generation attempt status, shared by versions and jobs.
    VideoStatus {
        Queued = 1 => "queued",
        Running = 2 => "running",
        Succeeded = 3 => "succeeded",
        Failed = 4 => "failed",
    }
}

impl VideoStatus {
    /// True for `succeeded` and `failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_status_ids_and_names() {
        assert_eq!(VideoStatus::Queued.id(), 1);
        assert_eq!(VideoStatus::Failed.name(), "failed");
        assert_eq!(VideoStatus::from_id(3), Some(VideoStatus::Succeeded));
        assert_eq!(VideoStatus::from_id(9), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!VideoStatus::Queued.is_terminal());
        assert!(!VideoStatus::Running.is_terminal());
        assert!(VideoStatus::Succeeded.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
    }
}
