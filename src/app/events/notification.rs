use crate::core::{Feature, FeatureId};

/// Zähler des Change/History-Managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryInfo {
    /// Anzahl angewendeter Steps
    pub current: usize,
    /// Länge des Stacks inklusive Redo-Schwanz
    pub length: usize,
    /// Features mit ungespeicherter Änderung gegenüber der Baseline
    pub changes: usize,
}

/// Benachrichtigungen an Beobachter der Session (Renderer, UI).
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Feature ist neu in der Map
    FeatureAdded(Feature),
    /// Feature wurde entfernt
    FeatureRemoved(FeatureId),
    /// Geometrie eines Features hat sich geändert
    CoordinatesChanged(Feature),
    /// Attribute eines Features haben sich geändert
    PropertiesChanged(Feature),
    /// History-Zähler haben sich geändert
    HistoryChanged(HistoryInfo),
    /// `ready`-Flag hat gewechselt
    ReadyChanged(bool),
    /// Selektion hat sich geändert
    SelectionChanged(Option<FeatureId>),
}
