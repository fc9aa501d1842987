//! Use-Cases der Application-Layer-Orchestrierung.
//!
//! Jede Funktion nimmt die `EditSession` als expliziten Kontext.

pub mod drag;
pub mod editing;
pub mod history;
pub mod selection;
pub mod submit;
pub mod topology;
pub mod viewport;
