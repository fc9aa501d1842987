//! Handler für Viewport-Operationen.

use crate::app::use_cases;
use crate::app::EditSession;
use glam::DVec2;

/// Verschiebt den Viewport.
pub fn pan(session: &mut EditSession, delta_px: DVec2) {
    use_cases::viewport::pan(session, delta_px);
}

/// Zoomt den Viewport.
pub fn zoom(session: &mut EditSession, factor: f64) {
    use_cases::viewport::zoom(session, factor);
}
