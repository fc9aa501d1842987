//! Protokoll des `EditController`.
//!
//! Gegenstück zur FIFO-Warteschlange des Controllers: jeder Command landet
//! hier in der Reihenfolge, in der er tatsächlich ausgeführt wurde. Einträge
//! aus `flush` sind als aufgeschoben markiert, so dass sich nachvollziehen
//! lässt, welche Commands auf eine bereite Session warten mussten.

use super::EditCommand;
use std::collections::VecDeque;

/// Ein ausgeführter Command.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedCommand {
    pub command: EditCommand,
    /// `true`, wenn der Command zuerst in der Warteschlange lag
    pub deferred: bool,
}

/// Begrenztes Ausführungsprotokoll; der älteste Eintrag fällt zuerst heraus.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: VecDeque<LoggedCommand>,
}

impl CommandLog {
    /// Obergrenze der gehaltenen Einträge.
    pub const CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Hält einen ausgeführten Command fest.
    pub fn record(&mut self, command: &EditCommand, deferred: bool) {
        if self.entries.len() == Self::CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(LoggedCommand {
            command: command.clone(),
            deferred,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Einträge in Ausführungsreihenfolge.
    pub fn entries(&self) -> impl Iterator<Item = &LoggedCommand> {
        self.entries.iter()
    }

    /// Anzahl der Commands, die über die Warteschlange liefen.
    pub fn deferred(&self) -> usize {
        self.entries.iter().filter(|entry| entry.deferred).count()
    }
}
