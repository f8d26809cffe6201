//! No-op mirror used when external sync is switched off.

use async_trait::async_trait;

use crate::export::{AttendanceExport, OrientationExport};
use crate::{ExternalSync, OrientationRowIds};

/// Mirror that records nothing and returns empty ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncDisabled;

#[async_trait]
impl ExternalSync for SyncDisabled {
    async fn append_attendance(&self, _export: &AttendanceExport) -> Option<String> {
        tracing::debug!("external sync disabled; skipping attendance mirror");
        None
    }

    async fn append_orientation_bundle(&self, _export: &OrientationExport) -> OrientationRowIds {
        tracing::debug!("external sync disabled; skipping orientation mirror");
        OrientationRowIds::default()
    }
}
