//! Use-Case: Zweiphasiger Submit an einen Provider.
//!
//! `prepare_submit` friert die ungespeicherten Änderungen als Batch ein; bis
//! `complete_submit` ist die Session nicht bereit, unabhängig davon, ob
//! zwischendurch ein Nachladen endet. Bei Erfolg werden temporäre IDs
//! ersetzt und genau der eingefrorene Batch in die Baseline übernommen, bei
//! Fehler bleibt alles wie vor dem Submit.

use super::drag::end_drag;
use crate::app::provider::{FeatureProvider, PermanentIdMap, SubmitBatch};
use crate::app::{EditSession, EditorEvent};
use crate::core::FeatureId;
use anyhow::Context;
use std::collections::HashMap;

/// Erste Phase: Batch bilden. `None` ohne Änderungen oder ohne `ready`.
pub fn prepare_submit(session: &mut EditSession) -> Option<SubmitBatch> {
    if !session.accepts("submit") {
        return None;
    }
    if session.is_dragging() {
        if let Err(e) = end_drag(session) {
            log::warn!("Laufender Drag vor Submit verworfen: {}", e);
        }
    }
    let batch = session.pending_batch();
    if batch.is_empty() {
        log::debug!("Submit: keine Änderungen");
        return None;
    }
    session.begin_submit();
    log::info!(
        "Submit vorbereitet: {} neu, {} geändert, {} gelöscht",
        batch.added.len(),
        batch.modified.len(),
        batch.removed.len()
    );
    Some(batch)
}

/// Zweite Phase: Ergebnis des Providers übernehmen.
pub fn complete_submit(
    session: &mut EditSession,
    batch: &SubmitBatch,
    provider_id: &str,
    result: anyhow::Result<HashMap<FeatureId, FeatureId>>,
) -> anyhow::Result<PermanentIdMap> {
    session.end_submit();
    let mapping = result.with_context(|| {
        format!("Submit von {} Änderungen an {} fehlgeschlagen", batch.len(), provider_id)
    })?;

    session.map.remap_ids(&mapping);
    let renamed_selection = session
        .selection
        .as_ref()
        .and_then(|id| mapping.get(id))
        .cloned();
    if renamed_selection.is_some() {
        session.set_selection(renamed_selection);
    }
    let mut renamed: Vec<_> = mapping.iter().collect();
    renamed.sort();
    for (temporary, permanent) in renamed {
        session.emit(EditorEvent::FeatureRemoved(temporary.clone()));
        if let Some(feature) = session.map.feature(permanent) {
            session.emit(EditorEvent::FeatureAdded(feature));
        }
    }
    session.rebase_onto(batch, &mapping)?;
    session.emit_history();
    log::info!("Submit an {} abgeschlossen ({} neue IDs)", provider_id, mapping.len());

    let mut permanent_ids = PermanentIdMap::new();
    permanent_ids.insert(provider_id.to_string(), mapping.into_iter().collect());
    Ok(permanent_ids)
}

/// Beide Phasen synchron gegen einen Provider.
///
/// `Ok(None)`, wenn nichts zu übertragen war.
pub fn submit(
    session: &mut EditSession,
    provider: &mut dyn FeatureProvider,
) -> anyhow::Result<Option<PermanentIdMap>> {
    let Some(batch) = prepare_submit(session) else {
        return Ok(None);
    };
    let result = provider.commit(&batch);
    let provider_id = provider.id().to_string();
    complete_submit(session, &batch, &provider_id, result).map(Some)
}
