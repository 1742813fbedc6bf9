//! RAII guard that removes a pending request when its waiter goes away.

use std::sync::Arc;

use super::session::Session;

/// Forgets `id` when dropped. After a normal resolution the entry is already
/// gone and this is a no-op.
pub(super) struct PendingGuard {
    pub(super) session: Arc<Session>,
    pub(super) id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.session.correlator().forget(self.id) {
            tracing::debug!(request_id = self.id, "pending request abandoned by caller");
        }
    }
}
