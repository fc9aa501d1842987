//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Enthält die Konfiguration, die `app` und die Binary gemeinsam nutzen.

pub mod options;

pub use options::EditorOptions;
pub use options::{AUTO_CONNECT_SHAPE_DISTANCE, MAX_ROUTING_POINT_DISTANCE};
