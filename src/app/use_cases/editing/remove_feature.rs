//! Use-Case: Feature löschen.

use crate::app::EditSession;
use crate::core::{EditResult, FeatureId};

/// Löscht ein Feature samt abhängiger Referenzen.
///
/// Routing-Punkte auf einem gelöschten Link werden umgehängt oder
/// gelöscht, Abbiegeverbote auf ihn entfernt. Unbekannte IDs sind ein
/// No-op (`false`).
pub fn remove_feature(session: &mut EditSession, id: &FeatureId) -> EditResult<bool> {
    if !session.accepts("remove_feature") {
        return Ok(false);
    }
    if !session.map().contains(id) {
        log::debug!("Feature {} nicht vorhanden, nichts zu löschen", id);
        return Ok(false);
    }
    session.run(&format!("Feature {} löschen", id), |tx, _, _| {
        tx.remove_feature(id)?;
        Ok(true)
    })
}
