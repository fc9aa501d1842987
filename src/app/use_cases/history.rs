//! Use-Case: Navigation im Undo/Redo-Stack.
//!
//! Ein laufender Shape-Drag wird vorher abgebrochen.

use super::drag::cancel_drag;
use crate::app::EditSession;
use crate::core::{EditResult, FeatureChange};

/// Nimmt bis zu `steps` Steps zurück.
pub fn undo(session: &mut EditSession, steps: usize) -> EditResult<bool> {
    if !session.accepts("undo") {
        return Ok(false);
    }
    cancel_drag(session);
    if !session.history.can_undo() || steps == 0 {
        log::debug!("Undo: nichts zu tun");
        return Ok(false);
    }
    let changes = session.history.undo(&mut session.map, steps)?;
    session.publish_changes(&changes);
    session.emit_history();
    log::info!("Undo ausgeführt (Stand {})", session.history.current());
    Ok(true)
}

/// Wendet bis zu `steps` Steps erneut an.
pub fn redo(session: &mut EditSession, steps: usize) -> EditResult<bool> {
    if !session.accepts("redo") {
        return Ok(false);
    }
    cancel_drag(session);
    if !session.history.can_redo() || steps == 0 {
        log::debug!("Redo: nichts zu tun");
        return Ok(false);
    }
    let changes = session.history.redo(&mut session.map, steps)?;
    session.publish_changes(&changes);
    session.emit_history();
    log::info!("Redo ausgeführt (Stand {})", session.history.current());
    Ok(true)
}

/// Verwirft alle ungespeicherten Änderungen; danach ist kein Redo möglich.
///
/// Stellt die Arbeitskopie aus der Baseline wieder her, damit auch Steps
/// erfasst sind, die bei voller History-Tiefe schon herausgefallen sind.
pub fn revert(session: &mut EditSession) -> EditResult<bool> {
    if !session.accepts("revert") {
        return Ok(false);
    }
    cancel_drag(session);
    if session.history.is_empty() && session.touched.is_empty() {
        log::debug!("Revert: nichts zu tun");
        return Ok(false);
    }
    let touched = std::mem::take(&mut session.touched);
    let changes: Vec<FeatureChange> = touched
        .into_iter()
        .filter_map(|id| {
            match (session.map.feature(&id), session.baseline.feature(&id)) {
                (None, None) => None,
                (Some(_), None) => Some(FeatureChange::Removed(id)),
                (None, Some(_)) => Some(FeatureChange::Added(id)),
                (Some(now), Some(before)) if now.geometry() != before.geometry() => {
                    Some(FeatureChange::CoordinatesChanged(id))
                }
                (Some(now), Some(before)) if now != before => {
                    Some(FeatureChange::PropertiesChanged(id))
                }
                _ => None,
            }
        })
        .collect();
    session.map = (*session.baseline).clone();
    session.history.clear();
    session.publish_changes(&changes);
    session.emit_history();
    log::info!("Alle Änderungen verworfen ({} Features)", changes.len());
    Ok(true)
}
