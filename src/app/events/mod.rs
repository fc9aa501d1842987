//! EditCommand- und EditorEvent-Enums für den Command/Event-Datenfluss.

mod command;
mod notification;

pub use command::EditCommand;
pub use notification::{EditorEvent, HistoryInfo};
