//! Handler für Undo/Redo-Operationen.

use crate::app::use_cases;
use crate::app::EditSession;

/// Führt bis zu `steps` Undo-Schritte aus.
pub fn undo(session: &mut EditSession, steps: usize) -> anyhow::Result<()> {
    if !use_cases::history::undo(session, steps)? {
        log::debug!("Undo: nichts zu tun");
    }
    Ok(())
}

/// Führt bis zu `steps` Redo-Schritte aus.
pub fn redo(session: &mut EditSession, steps: usize) -> anyhow::Result<()> {
    if !use_cases::history::redo(session, steps)? {
        log::debug!("Redo: nichts zu tun");
    }
    Ok(())
}

/// Verwirft alle ungespeicherten Änderungen.
pub fn revert(session: &mut EditSession) -> anyhow::Result<()> {
    use_cases::history::revert(session)?;
    Ok(())
}
