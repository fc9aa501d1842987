//! Edit-Session: expliziter Kontext aller Editor-Operationen.
//!
//! Hält Arbeitskopie, Baseline des letzten Submits, History, Selektion,
//! laufenden Drag und die Gründe, aus denen sie gerade nicht bereit ist. Mutierende Operationen laufen über
//! `run`: eine Transaktion pro Aufruf, Abgleich der Abhängigen, genau ein
//! Step bei Erfolg, vollständiger Rollback bei Fehler.

use super::events::{EditorEvent, HistoryInfo};
use super::history::EditHistory;
use super::provider::{search_map, SearchQuery, SubmitBatch};
use crate::core::reconcile::reconcile_links;
use crate::core::{
    EditResult, Feature, FeatureChange, FeatureId, IdAllocator, NetworkMap, ShapeDrag, Step,
    Tolerances, Transaction, Viewport,
};
use crate::shared::EditorOptions;
use glam::DVec2;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Beobachter-Callback für Session-Events.
pub type Observer = Box<dyn FnMut(&EditorEvent)>;

/// Kontextobjekt einer Edit-Session.
pub struct EditSession {
    pub(crate) map: NetworkMap,
    /// Zustand beim Laden bzw. letzten Submit (geteilt, Copy-on-Write)
    pub(crate) baseline: Arc<NetworkMap>,
    pub(crate) history: EditHistory,
    pub(crate) options: EditorOptions,
    pub(crate) viewport: Viewport,
    pub(crate) ids: IdAllocator,
    pub(crate) selection: Option<FeatureId>,
    pub(crate) drag: Option<ShapeDrag>,
    /// Seit der Baseline berührte Features
    pub(crate) touched: BTreeSet<FeatureId>,
    submit_in_flight: bool,
    /// Offene Viewport-Nachladevorgänge
    reloads: usize,
    observers: Vec<Observer>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("features", &self.map.feature_count())
            .field("history", &self.history)
            .field("selection", &self.selection)
            .field("submit_in_flight", &self.submit_in_flight)
            .field("reloads", &self.reloads)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EditSession {
    /// Leere, bereite Session.
    pub fn new(options: EditorOptions) -> Self {
        let map = NetworkMap::new();
        Self {
            baseline: Arc::new(map.clone()),
            map,
            history: EditHistory::new_with_capacity(options.history_max_depth),
            options,
            viewport: Viewport::default(),
            ids: IdAllocator::default(),
            selection: None,
            drag: None,
            touched: BTreeSet::new(),
            submit_in_flight: false,
            reloads: 0,
            observers: Vec::new(),
        }
    }

    /// Session mit Anfangsbestand.
    pub fn with_features(
        options: EditorOptions,
        features: impl IntoIterator<Item = Feature>,
    ) -> EditResult<Self> {
        let mut session = Self::new(options);
        session.load_features(features)?;
        Ok(session)
    }

    /// Ersetzt die Arbeitskopie ohne History (neue Baseline).
    pub fn load_features(&mut self, features: impl IntoIterator<Item = Feature>) -> EditResult<()> {
        let map = NetworkMap::from_features(features)?;
        self.drag = None;
        self.baseline = Arc::new(map.clone());
        self.map = map;
        self.history = EditHistory::new_with_capacity(self.options.history_max_depth);
        self.touched.clear();
        self.ids.reset();
        self.set_selection(None);
        log::info!("{} Features geladen", self.map.feature_count());
        self.emit_history();
        Ok(())
    }

    // ── Zugriff ─────────────────────────────────────────────────────

    /// Aktuelle Arbeitskopie.
    pub fn map(&self) -> &NetworkMap {
        &self.map
    }

    /// Zustand des letzten Submits.
    pub fn baseline(&self) -> &NetworkMap {
        &self.baseline
    }

    /// Laufzeit-Optionen.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Ersetzt die Optionen; `history_max_depth` greift ab dem nächsten Laden.
    pub fn set_options(&mut self, options: EditorOptions) {
        self.options = options;
    }

    /// Viewport, aus dem die Pixel-Toleranzen abgeleitet werden.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Veränderbarer Viewport (Pan, Zoom, Größe).
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Undo/Redo-Stack.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Selektiertes Feature.
    pub fn selected(&self) -> Option<&FeatureId> {
        self.selection.as_ref()
    }

    /// Gibt `true` zurück, solange ein Shape-Drag läuft.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// `false`, solange ein Nachladen oder ein Submit läuft.
    pub fn is_ready(&self) -> bool {
        !self.submit_in_flight && self.reloads == 0
    }

    /// Toleranzen in Welteinheiten für den aktuellen Viewport.
    pub fn tolerances(&self) -> Tolerances {
        self.options.tolerances(&self.viewport)
    }

    /// Rechnet ein Gesten-Delta von Pixeln in Welteinheiten um.
    pub fn px_to_world_delta(&self, delta_px: DVec2) -> DVec2 {
        delta_px * self.viewport.world_per_pixel()
    }

    /// History-Zähler.
    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            current: self.history.current(),
            length: self.history.len(),
            changes: self.pending_batch().len(),
        }
    }

    /// Ungespeicherte Änderungen gegenüber der Baseline.
    pub fn pending_batch(&self) -> SubmitBatch {
        let mut batch = SubmitBatch::default();
        for id in &self.touched {
            match (self.baseline.feature(id), self.map.feature(id)) {
                (None, Some(feature)) => batch.added.push(feature),
                (Some(_), None) => batch.removed.push(id.clone()),
                (Some(before), Some(after)) if before != after => batch.modified.push(after),
                _ => {}
            }
        }
        batch
    }

    /// Sucht in der Arbeitskopie.
    pub fn search(&self, query: &SearchQuery) -> Vec<Feature> {
        search_map(&self.map, query)
    }

    /// Registriert einen Beobachter.
    pub fn subscribe(&mut self, observer: impl FnMut(&EditorEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ── Interne Bausteine der Use-Cases ─────────────────────────────

    /// Prüft die Bereitschaft; ohne sie ist jede Mutation ein No-op.
    pub(crate) fn accepts(&self, operation: &str) -> bool {
        let ready = self.is_ready();
        if !ready {
            log::debug!("Session nicht bereit, {} ignoriert", operation);
        }
        ready
    }

    pub(crate) fn begin_submit(&mut self) {
        self.update_busy(|session| session.submit_in_flight = true);
    }

    pub(crate) fn end_submit(&mut self) {
        self.update_busy(|session| session.submit_in_flight = false);
    }

    pub(crate) fn begin_reload(&mut self) {
        self.update_busy(|session| session.reloads += 1);
    }

    pub(crate) fn end_reload(&mut self) {
        self.update_busy(|session| session.reloads = session.reloads.saturating_sub(1));
    }

    /// Ändert einen Belegt-Grund; `ReadyChanged` nur bei Wechsel der Bereitschaft.
    fn update_busy(&mut self, change: impl FnOnce(&mut Self)) {
        let was_ready = self.is_ready();
        change(self);
        let ready = self.is_ready();
        if ready != was_ready {
            self.emit(EditorEvent::ReadyChanged(ready));
        }
    }

    /// Führt eine Operation als eine Transaktion aus.
    ///
    /// Nach der Operation werden die Abhängigen aller berührten Features
    /// abgeglichen. Bei Fehler wird alles zurückgerollt und nichts
    /// aufgezeichnet; ohne Änderung entsteht kein Step.
    pub(crate) fn run<T>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Transaction<'_>, &mut IdAllocator, &Tolerances) -> EditResult<T>,
    ) -> EditResult<T> {
        let tolerances = self.tolerances();
        let mut tx = Transaction::new(&mut self.map);
        let result = op(&mut tx, &mut self.ids, &tolerances).and_then(|value| {
            let touched = tx.changes().affected_ids();
            reconcile_links(&mut tx, &touched, &tolerances).map(|()| value)
        });
        match result {
            Ok(value) => {
                if let Some(step) = tx.commit(label) {
                    log::info!("{} ({} Mutationen)", label, step.forward.len());
                    self.record(step);
                }
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                log::warn!("{} abgebrochen: {}", label, e);
                Err(e)
            }
        }
    }

    /// Legt einen fertigen Step auf den Stack und benachrichtigt.
    pub(crate) fn record(&mut self, step: Step) {
        self.touched.extend(step.affected_ids());
        let changes = step.forward_changes();
        self.history.record(step);
        self.publish_changes(&changes);
        self.emit_history();
    }

    /// Meldet Feature-Änderungen (eine Meldung pro Feature, Endzustand).
    pub(crate) fn publish_changes(&mut self, changes: &[FeatureChange]) {
        let mut seen = BTreeSet::new();
        let mut events = Vec::new();
        for change in changes {
            let id = change_id(change);
            if !seen.insert(id.clone()) {
                continue;
            }
            let event = match self.map.feature(id) {
                None => EditorEvent::FeatureRemoved(id.clone()),
                Some(feature) => {
                    let related = |wanted: fn(&FeatureChange) -> bool| {
                        changes.iter().any(|c| wanted(c) && change_id(c) == id)
                    };
                    if related(|c| matches!(c, FeatureChange::Added(_))) {
                        EditorEvent::FeatureAdded(feature)
                    } else if related(|c| matches!(c, FeatureChange::CoordinatesChanged(_))) {
                        EditorEvent::CoordinatesChanged(feature)
                    } else {
                        EditorEvent::PropertiesChanged(feature)
                    }
                }
            };
            events.push(event);
        }
        for event in &events {
            self.emit(event.clone());
        }
        let selection_gone = self
            .selection
            .as_ref()
            .is_some_and(|id| !self.map.contains(id));
        if selection_gone {
            self.set_selection(None);
        }
    }

    pub(crate) fn set_selection(&mut self, id: Option<FeatureId>) {
        if self.selection != id {
            self.selection = id.clone();
            self.emit(EditorEvent::SelectionChanged(id));
        }
    }

    pub(crate) fn emit_history(&mut self) {
        let info = self.info();
        self.emit(EditorEvent::HistoryChanged(info));
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    /// Übernimmt einen bestätigten Batch in die Baseline.
    ///
    /// Nur die Features des Batches wandern in die Baseline; was seit
    /// `prepare_submit` dazukam, bleibt ungespeichert. Die History wird
    /// geleert, da ihre Steps noch temporäre IDs referenzieren.
    pub(crate) fn rebase_onto(
        &mut self,
        batch: &SubmitBatch,
        mapping: &HashMap<FeatureId, FeatureId>,
    ) -> EditResult<()> {
        let mut baseline = (*self.baseline).clone();
        for id in &batch.removed {
            baseline.remove_feature(id);
        }
        for feature in batch.added.iter().chain(&batch.modified) {
            baseline.remove_feature(feature.id());
            baseline.add_feature(feature.clone())?;
        }
        baseline.remap_ids(mapping);
        self.baseline = Arc::new(baseline);

        let touched = std::mem::take(&mut self.touched);
        self.touched = touched
            .into_iter()
            .map(|id| mapping.get(&id).cloned().unwrap_or(id))
            .filter(|id| self.baseline.feature(id) != self.map.feature(id))
            .collect();
        if !self.touched.is_empty() {
            log::warn!(
                "{} Änderungen nach dem Einfrieren bleiben ungespeichert",
                self.touched.len()
            );
        }
        self.history.clear();
        self.ids.reset();
        Ok(())
    }
}

fn change_id(change: &FeatureChange) -> &FeatureId {
    match change {
        FeatureChange::Added(id)
        | FeatureChange::Removed(id)
        | FeatureChange::CoordinatesChanged(id)
        | FeatureChange::PropertiesChanged(id) => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EditError, Link, Property, ShapePoint};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> EditSession {
        EditSession::with_features(
            EditorOptions::default(),
            [Feature::Link(Link::new(
                "l1",
                vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0)],
            ))],
        )
        .unwrap()
    }

    #[test]
    fn run_records_one_step_and_counts_changes() {
        let mut session = session();
        session
            .run("move", |tx, _, _| {
                tx.move_vertex(&ShapePoint::new("l1", 1), DVec2::new(100.0, 10.0))?;
                tx.set_property(
                    &"l1".into(),
                    Property::Attribute {
                        key: "name".into(),
                        value: Some("Hauptstraße".into()),
                    },
                )
            })
            .unwrap();
        assert_eq!(
            session.info(),
            HistoryInfo {
                current: 1,
                length: 1,
                changes: 1
            }
        );
        assert_eq!(session.pending_batch().modified.len(), 1);
    }

    #[test]
    fn failed_run_rolls_back() {
        let mut session = session();
        let before = session.map().features();
        let result: EditResult<()> = session.run("broken", |tx, _, _| {
            tx.move_vertex(&ShapePoint::new("l1", 1), DVec2::new(50.0, 50.0))?;
            tx.remove_vertex(&"l1".into(), 0).map(|_| ())
        });
        assert!(matches!(result, Err(EditError::MinimumVertexCount { .. })));
        assert_eq!(session.map().features(), before);
        assert_eq!(session.info(), HistoryInfo::default());
    }

    #[test]
    fn observers_see_changes_and_history() {
        let mut session = session();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        session
            .run("move", |tx, _, _| {
                tx.move_vertex(&ShapePoint::new("l1", 0), DVec2::new(0.0, 5.0))
            })
            .unwrap();
        let events = events.borrow();
        assert!(matches!(
            events[0],
            EditorEvent::CoordinatesChanged(Feature::Link(ref l)) if l.id.as_str() == "l1"
        ));
        assert!(matches!(
            events[1],
            EditorEvent::HistoryChanged(HistoryInfo { current: 1, .. })
        ));
    }

    #[test]
    fn change_that_returns_to_baseline_is_not_counted() {
        let mut session = session();
        for y in [5.0, 0.0] {
            session
                .run("move", |tx, _, _| {
                    tx.move_vertex(&ShapePoint::new("l1", 0), DVec2::new(0.0, y))
                })
                .unwrap();
        }
        let info = session.info();
        assert_eq!((info.current, info.changes), (2, 0));
    }
}
