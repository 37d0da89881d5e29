//! Hook for the external view layer.

use crate::session::BookingSession;

/// Receives the session after every visible change.
///
/// Called while the session write lock is held: implementations must not
/// try to lock the session again and should only copy what they need.
pub trait Renderer: Send + Sync {
    fn render(&self, session: &BookingSession);
}

/// Renderer that ignores updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&self, _session: &BookingSession) {}
}
