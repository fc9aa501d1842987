//! Application Controller für zentrale Command-Verarbeitung.
//!
//! Strukturelle Commands, die eintreffen, solange die Session nicht bereit
//! ist, werden in FIFO-Reihenfolge aufgestaut und mit `flush` ausgeführt.

use super::{CommandLog, EditCommand, EditSession};
use std::collections::VecDeque;

/// Orchestriert Commands und Use-Cases auf der EditSession.
#[derive(Debug, Default)]
pub struct EditController {
    queue: VecDeque<EditCommand>,
    command_log: CommandLog,
}

impl EditController {
    /// Erstellt einen neuen Controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anzahl aufgestauter Commands.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Ausgeführte Commands.
    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    /// Führt einen Command aus oder staut ihn auf.
    ///
    /// Solange Commands aufgestaut sind, reihen sich neue strukturelle
    /// Commands dahinter ein.
    pub fn handle_command(
        &mut self,
        session: &mut EditSession,
        command: EditCommand,
    ) -> anyhow::Result<()> {
        if command.is_structural() && (!session.is_ready() || !self.queue.is_empty()) {
            log::debug!("Command aufgestaut: {:?}", command);
            self.queue.push_back(command);
            return self.flush(session).map(|_| ());
        }
        self.execute(session, command, false)
    }

    /// Führt aufgestaute Commands aus, solange die Session bereit ist.
    ///
    /// Gibt die Anzahl ausgeführter Commands zurück. Ein fehlschlagender
    /// Command wird verworfen und der Fehler zurückgegeben.
    pub fn flush(&mut self, session: &mut EditSession) -> anyhow::Result<usize> {
        let mut executed = 0;
        while session.is_ready() {
            let Some(command) = self.queue.pop_front() else {
                break;
            };
            self.execute(session, command, true)?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Führt mutierende Commands auf der EditSession aus.
    /// Dispatcht an Feature-Handler in `handlers/`.
    fn execute(
        &mut self,
        session: &mut EditSession,
        command: EditCommand,
        deferred: bool,
    ) -> anyhow::Result<()> {
        self.command_log.record(&command, deferred);
        use super::handlers;

        match command {
            // === Selektion ===
            EditCommand::Select { id } => handlers::selection::select(session, &id),
            EditCommand::SelectAt {
                position,
                radius_px,
            } => handlers::selection::select_at(session, position, radius_px),
            EditCommand::Unselect => handlers::selection::clear(session),

            // === Drag ===
            EditCommand::BeginDrag { shape_point } => handlers::drag::begin(session, shape_point)?,
            EditCommand::DragFrame { delta_px } => handlers::drag::frame(session, delta_px)?,
            EditCommand::EndDrag => handlers::drag::end(session)?,
            EditCommand::CancelDrag => handlers::drag::cancel(session),
            EditCommand::DragShape {
                shape_point,
                delta_px,
            } => handlers::drag::shape(session, shape_point, delta_px)?,
            EditCommand::DragFeature { id, delta_px } => {
                handlers::drag::feature(session, &id, delta_px)?
            }

            // === Topologie ===
            EditCommand::Connect {
                shape_point,
                target,
            } => handlers::topology::connect(session, &shape_point, &target)?,
            EditCommand::Disconnect { shape_point } => {
                handlers::topology::disconnect(session, &shape_point)?
            }
            EditCommand::SplitLink { shape_point } => handlers::topology::split(session, &shape_point)?,
            EditCommand::ConnectCrossing { link, index } => {
                handlers::topology::connect_crossing(session, &link, index)?
            }
            EditCommand::MergeLinks { first, second } => {
                handlers::topology::merge(session, &first, &second)?
            }

            // === Editing ===
            EditCommand::AddShape {
                link,
                vertex,
                index,
            } => handlers::editing::add_shape(session, &link, vertex, index)?,
            EditCommand::RemoveShape { shape_point } => {
                handlers::editing::remove_shape(session, &shape_point)?
            }
            EditCommand::AddLink {
                coordinates,
                properties,
            } => handlers::editing::add_link(session, coordinates, properties)?,
            EditCommand::AddPlace {
                kind,
                position,
                properties,
            } => handlers::editing::add_place(session, kind, position, properties)?,
            EditCommand::AddArea { rings, properties } => {
                handlers::editing::add_area(session, rings, properties)?
            }
            EditCommand::RemoveFeature { id } => handlers::editing::remove_feature(session, &id)?,
            EditCommand::SetAttribute { id, key, value } => {
                handlers::editing::set_attribute(session, &id, &key, value)?
            }
            EditCommand::SetTurnRestriction { link, restriction } => {
                handlers::editing::set_turn_restriction(session, &link, restriction)?
            }
            EditCommand::SetZLevels { link, z_levels } => {
                handlers::editing::set_z_levels(session, &link, z_levels)?
            }
            EditCommand::SetEditable { link, editable } => {
                handlers::editing::set_editable(session, &link, editable)?
            }

            // === History ===
            EditCommand::Undo { steps } => handlers::history::undo(session, steps)?,
            EditCommand::Redo { steps } => handlers::history::redo(session, steps)?,
            EditCommand::Revert => handlers::history::revert(session)?,

            // === Viewport ===
            EditCommand::PanViewport { delta_px } => handlers::view::pan(session, delta_px),
            EditCommand::ZoomViewport { factor } => handlers::view::zoom(session, factor),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::use_cases::viewport::{begin_viewport_reload, finish_viewport_reload};
    use crate::core::{Feature, Link, Properties, ShapePoint};
    use crate::shared::EditorOptions;
    use glam::DVec2;

    fn session() -> EditSession {
        EditSession::with_features(
            EditorOptions::default(),
            [Feature::Link(Link::new(
                "a",
                vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0)],
            ))],
        )
        .unwrap()
    }

    #[test]
    fn structural_commands_queue_while_not_ready() {
        let mut session = session();
        let mut controller = EditController::new();
        begin_viewport_reload(&mut session);

        controller
            .handle_command(
                &mut session,
                EditCommand::AddShape {
                    link: "a".into(),
                    vertex: DVec2::new(50.0, 0.0),
                    index: None,
                },
            )
            .unwrap();
        controller
            .handle_command(
                &mut session,
                EditCommand::SplitLink {
                    shape_point: ShapePoint::new("a", 1),
                },
            )
            .unwrap();
        controller
            .handle_command(
                &mut session,
                EditCommand::DragShape {
                    shape_point: ShapePoint::new("a", 0),
                    delta_px: DVec2::new(0.0, 10.0),
                },
            )
            .unwrap();
        assert_eq!(controller.pending(), 2);
        assert_eq!(session.info().length, 0);

        finish_viewport_reload(&mut session, []).unwrap();
        assert_eq!(controller.flush(&mut session).unwrap(), 2);
        assert!(session.map().link(&"a".into()).is_none());
        assert_eq!(session.info().length, 2);
        assert_eq!(controller.command_log().len(), 3);
        assert_eq!(controller.command_log().deferred(), 2);
    }

    #[test]
    fn failing_command_reports_error() {
        let mut session = session();
        let mut controller = EditController::new();
        let result = controller.handle_command(
            &mut session,
            EditCommand::RemoveShape {
                shape_point: ShapePoint::new("a", 0),
            },
        );
        assert!(result.is_err());
        controller
            .handle_command(
                &mut session,
                EditCommand::AddLink {
                    coordinates: vec![DVec2::ZERO, DVec2::Y],
                    properties: Properties::new(),
                },
            )
            .unwrap();
        assert_eq!(session.info().length, 1);
    }
}
