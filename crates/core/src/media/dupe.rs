use async_trait::async_trait;

use super::MediaError;
use crate::orchestrator::JobContext;

/// Checks whether a tracker already carries this release.
///
/// `Ok(true)` means a dupe was found and the upload to that tracker is
/// recorded as failed. An `Err` aborts the whole job.
#[async_trait]
pub trait DupeChecker: Send + Sync {
    async fn is_dupe(&self, tracker: &str, context: &JobContext) -> Result<bool, MediaError>;
}

/// Dupe checker that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDupeChecker;

#[async_trait]
impl DupeChecker for NoopDupeChecker {
    async fn is_dupe(&self, _tracker: &str, _context: &JobContext) -> Result<bool, MediaError> {
        Ok(false)
    }
}
