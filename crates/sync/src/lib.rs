//! Best-effort mirror of register data into an external low-code
//! tables app.
//!
//! The mirror is write-only and advisory: every failure is logged and
//! collapsed into `None` row ids, never an error the caller must
//! handle. Handlers keep going whether or not the mirror is reachable.

pub mod export;
pub mod glide;

mod disabled;

use async_trait::async_trait;

pub use disabled::SyncDisabled;
pub use export::{AttendanceExport, OrientationExport};
pub use glide::{GlideConfig, GlideTables};

/// Row ids assigned by the mirror for one orientation completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrientationRowIds {
    pub member_row_id: Option<String>,
    pub orientation_row_id: Option<String>,
    pub attendance_row_id: Option<String>,
}

/// External mirror seam. Implementations must swallow their own
/// failures; a `None` id means "not mirrored", nothing more.
#[async_trait]
pub trait ExternalSync: Send + Sync {
    /// Mirror one attendance row, returning its external row id.
    async fn append_attendance(&self, export: &AttendanceExport) -> Option<String>;

    /// Mirror a completed orientation: member row first, then the
    /// orientation and attendance rows threaded with the member's row
    /// id.
    async fn append_orientation_bundle(&self, export: &OrientationExport) -> OrientationRowIds;
}
