//! Linearer Undo/Redo-Stack aus invertierbaren Steps.

use crate::core::{EditResult, FeatureChange, NetworkMap, Step, Transaction};

/// Undo/Redo-Manager über einen linearen Stack von Steps.
///
/// `current` zeigt hinter den zuletzt angewendeten Step. Steps ab `current`
/// bilden den Redo-Schwanz, der beim nächsten `record` verworfen wird.
#[derive(Debug, Default)]
pub struct EditHistory {
    steps: Vec<Step>,
    current: usize,
    max_depth: usize,
}

impl EditHistory {
    /// Erstellt einen neuen History-Manager mit maximaler Tiefe.
    pub fn new_with_capacity(max_depth: usize) -> Self {
        Self {
            steps: Vec::with_capacity(max_depth.min(64)),
            current: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Hängt einen Step an und verwirft den Redo-Schwanz.
    ///
    /// Bei voller Tiefe fällt der älteste Step heraus.
    pub fn record(&mut self, step: Step) {
        self.steps.truncate(self.current);
        if self.steps.len() >= self.max_depth {
            self.steps.remove(0);
        }
        self.steps.push(step);
        self.current = self.steps.len();
    }

    /// Aktueller Index (Anzahl angewendeter Steps).
    pub fn current(&self) -> usize {
        self.current
    }

    /// Länge des Stacks inklusive Redo-Schwanz.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Gibt `true` zurück, wenn der Stack leer ist.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        self.current < self.steps.len()
    }

    /// Nimmt bis zu `n` Steps zurück (begrenzt auf 0).
    ///
    /// Alle Steps laufen in einer Transaktion: scheitert einer, wird die Map
    /// vollständig zurückgerollt und `current` bleibt stehen. Gibt die
    /// beobachtbaren Änderungen in Anwendungsreihenfolge zurück.
    pub fn undo(&mut self, map: &mut NetworkMap, n: usize) -> EditResult<Vec<FeatureChange>> {
        let count = n.min(self.current);
        let steps = &self.steps[self.current - count..self.current];
        let mut tx = Transaction::new(map);
        let mut changes = Vec::new();
        for step in steps.iter().rev() {
            if let Err(e) = step.replay_backward(&mut tx) {
                log::warn!("Undo von '{}' fehlgeschlagen: {}", step.label, e);
                tx.rollback();
                return Err(e);
            }
            changes.extend(step.backward_changes());
            log::debug!("Undo: {}", step.label);
        }
        self.current -= count;
        Ok(changes)
    }

    /// Wendet bis zu `n` Steps erneut an (begrenzt auf die Stack-Länge).
    pub fn redo(&mut self, map: &mut NetworkMap, n: usize) -> EditResult<Vec<FeatureChange>> {
        let count = n.min(self.steps.len() - self.current);
        let steps = &self.steps[self.current..self.current + count];
        let mut tx = Transaction::new(map);
        let mut changes = Vec::new();
        for step in steps {
            if let Err(e) = step.replay_forward(&mut tx) {
                log::warn!("Redo von '{}' fehlgeschlagen: {}", step.label, e);
                tx.rollback();
                return Err(e);
            }
            changes.extend(step.forward_changes());
            log::debug!("Redo: {}", step.label);
        }
        self.current += count;
        Ok(changes)
    }

    /// Leert den Stack ohne die Map anzufassen (nach Submit).
    pub fn clear(&mut self) {
        self.steps.clear();
        self.current = 0;
    }
}
