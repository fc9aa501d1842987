//! Link Topology Editor Library.
//! Topologie-bewusstes Editieren von Link-Netzwerken mit Places, Flächen,
//! Abbiegeverboten und Undo/Redo.

pub mod app;
pub mod core;
pub mod shared;

pub use app::{
    EditCommand, EditController, EditHistory, EditSession, EditorEvent, FeatureProvider,
    HistoryInfo, LocalProvider, SearchQuery, SubmitBatch,
};
pub use core::{
    Area, EditError, EditResult, Feature, FeatureId, Link, NetworkMap, Place, PlaceKind,
    ShapePoint, TurnRestriction, Viewport,
};
pub use shared::EditorOptions;
