//! Handler für Selektion.

use crate::app::use_cases;
use crate::app::EditSession;
use crate::core::FeatureId;
use glam::DVec2;

/// Selektiert ein Feature per ID.
pub fn select(session: &mut EditSession, id: &FeatureId) {
    use_cases::selection::select(session, id);
}

/// Selektiert das Feature unter dem Cursor.
pub fn select_at(session: &mut EditSession, position: DVec2, radius_px: f64) {
    let position_px = session.viewport().world_to_screen(position);
    match use_cases::selection::select_at(session, position_px, radius_px) {
        Some(id) => log::debug!("{} selektiert", id),
        None => log::debug!("Kein Feature unter dem Cursor"),
    }
}

/// Hebt die Selektion auf.
pub fn clear(session: &mut EditSession) {
    use_cases::selection::unselect(session);
}
