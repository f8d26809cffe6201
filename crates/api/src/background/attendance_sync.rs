//! Fire-and-forget attendance mirroring.
//!
//! Check-in responds as soon as the local attendance row exists; the
//! external mirror write happens here, with the returned row id written
//! back when it arrives.

use std::sync::Arc;

use tokio::task::JoinHandle;

use register_core::types::Id;
use register_db::repositories::AttendanceRepo;
use register_db::DbPool;
use register_sync::{AttendanceExport, ExternalSync};

/// Spawn the mirror write for one attendance row.
pub fn spawn(
    pool: DbPool,
    sync: Arc<dyn ExternalSync>,
    attendance_id: Id,
    export: AttendanceExport,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(row_id) = sync.append_attendance(&export).await else {
            return;
        };
        if let Err(error) = AttendanceRepo::set_row_id(&pool, attendance_id, &row_id).await {
            tracing::warn!(%error, attendance_id = %attendance_id, "attendance row-id writeback failed");
        }
    })
}
