//! Application-Layer: Session, Controller, Events und Use-Cases.

pub mod command_log;
pub mod controller;
pub mod events;
pub mod handlers;
pub mod history;
pub mod provider;
/// Editier-Session
///
/// Hält Arbeitskopie, Baseline, History, Selektion und Beobachter.
pub mod session;
pub mod use_cases;

pub use command_log::{CommandLog, LoggedCommand};
pub use controller::EditController;
pub use events::{EditCommand, EditorEvent, HistoryInfo};
pub use history::EditHistory;
pub use provider::{FeatureProvider, LocalProvider, PermanentIdMap, SearchQuery, SubmitBatch};
pub use session::EditSession;
