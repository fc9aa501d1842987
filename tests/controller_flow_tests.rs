//! Integrationstests für den Command-Fluss über den EditController.

use glam::DVec2;
use link_topology_editor::app::use_cases::submit::{complete_submit, prepare_submit};
use link_topology_editor::app::use_cases::viewport::{begin_viewport_reload, finish_viewport_reload};
use link_topology_editor::core::Properties;
use link_topology_editor::{
    EditCommand, EditController, EditError, EditSession, EditorEvent, EditorOptions, Feature,
    FeatureId, HistoryInfo, Link, ShapePoint,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Zwei getrennte Links: `a` horizontal mit drei Vertices, `b` vertikal daneben.
fn make_test_session() -> EditSession {
    EditSession::with_features(
        EditorOptions::default(),
        [
            Feature::Link(Link::new(
                "a",
                vec![
                    DVec2::new(0.0, 0.0),
                    DVec2::new(100.0, 0.0),
                    DVec2::new(200.0, 0.0),
                ],
            )),
            Feature::Link(Link::new(
                "b",
                vec![DVec2::new(300.0, 0.0), DVec2::new(300.0, 200.0)],
            )),
        ],
    )
    .expect("gültiges Netzwerk")
}

fn connect_a_end_to_b_start() -> EditCommand {
    EditCommand::Connect {
        shape_point: ShapePoint::new("a", 2),
        target: ShapePoint::new("b", 0),
    }
}

#[test]
fn test_connect_ist_symmetrisch_und_idempotent() {
    let mut controller = EditController::new();
    let mut session = make_test_session();

    controller
        .handle_command(&mut session, connect_a_end_to_b_start())
        .expect("Connect darf nicht fehlschlagen");
    controller
        .handle_command(&mut session, connect_a_end_to_b_start())
        .expect("zweites Connect darf nicht fehlschlagen");

    assert_eq!(session.info().length, 1, "zweites Connect erzeugt keinen Step");
    assert_eq!(
        session.map().connections_of(&ShapePoint::new("a", 2), 1e-9),
        vec![ShapePoint::new("b", 0)]
    );
    assert_eq!(
        session.map().connections_of(&ShapePoint::new("b", 0), 1e-9),
        vec![ShapePoint::new("a", 2)]
    );
    assert_eq!(controller.command_log().len(), 2);
}

#[test]
fn test_undo_redo_stellt_geometrie_exakt_wieder_her() {
    let mut controller = EditController::new();
    let mut session = make_test_session();
    let before = session.map().link(&"a".into()).cloned();

    controller
        .handle_command(
            &mut session,
            EditCommand::AddShape {
                link: "a".into(),
                vertex: DVec2::new(50.0, 10.0),
                index: None,
            },
        )
        .unwrap();
    controller
        .handle_command(
            &mut session,
            EditCommand::Connect {
                shape_point: ShapePoint::new("a", 3),
                target: ShapePoint::new("b", 0),
            },
        )
        .unwrap();
    let after = session.map().link(&"a".into()).cloned();

    controller
        .handle_command(&mut session, EditCommand::Undo { steps: 2 })
        .unwrap();
    assert_eq!(session.map().link(&"a".into()).cloned(), before);
    assert_eq!(session.info().changes, 0);

    controller
        .handle_command(&mut session, EditCommand::Redo { steps: 2 })
        .unwrap();
    assert_eq!(session.map().link(&"a".into()).cloned(), after);
    assert_eq!(
        session.info(),
        HistoryInfo {
            current: 2,
            length: 2,
            changes: 1
        }
    );
}

#[test]
fn test_remove_shape_am_minimum_schlaegt_fehl_ohne_step() {
    let mut controller = EditController::new();
    let mut session = make_test_session();

    controller
        .handle_command(
            &mut session,
            EditCommand::RemoveShape {
                shape_point: ShapePoint::new("a", 1),
            },
        )
        .expect("dritter Vertex darf entfernt werden");
    assert_eq!(session.map().link(&"a".into()).unwrap().len(), 2);

    let err = controller
        .handle_command(
            &mut session,
            EditCommand::RemoveShape {
                shape_point: ShapePoint::new("a", 0),
            },
        )
        .expect_err("zwei Vertices sind das Minimum");
    assert!(matches!(
        err.downcast_ref::<EditError>(),
        Some(EditError::MinimumVertexCount { .. })
    ));
    assert_eq!(session.map().link(&"a".into()).unwrap().len(), 2);
    assert_eq!(session.info().length, 1);
}

#[test]
fn test_strukturelle_commands_warten_bis_session_bereit() {
    let mut controller = EditController::new();
    let mut session = make_test_session();
    begin_viewport_reload(&mut session);

    controller
        .handle_command(&mut session, connect_a_end_to_b_start())
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
        .handle_command(&mut session, EditCommand::Undo { steps: 1 })
        .unwrap();
    assert_eq!(controller.pending(), 3);
    assert_eq!(session.info(), HistoryInfo::default());

    finish_viewport_reload(&mut session, []).unwrap();
    assert_eq!(controller.flush(&mut session).unwrap(), 3);

    // Split ist rückgängig gemacht, Connect bleibt.
    assert!(session.map().link(&"a".into()).is_some());
    assert_eq!(
        session.info(),
        HistoryInfo {
            current: 1,
            length: 2,
            changes: 1
        }
    );
}

#[test]
fn test_navigation_laeuft_auch_ohne_bereitschaft() {
    let mut controller = EditController::new();
    let mut session = make_test_session();
    begin_viewport_reload(&mut session);

    controller
        .handle_command(&mut session, EditCommand::ZoomViewport { factor: 2.0 })
        .unwrap();
    controller
        .handle_command(&mut session, EditCommand::Select { id: "b".into() })
        .unwrap();

    assert_eq!(controller.pending(), 0);
    assert_eq!(session.selected(), Some(&FeatureId::from("b")));
    assert_eq!(session.viewport().zoom, 2.0);
}

#[test]
fn test_split_der_selektion_selektiert_ersten_teil() {
    let mut controller = EditController::new();
    let mut session = make_test_session();

    controller
        .handle_command(
            &mut session,
            EditCommand::SelectAt {
                position: DVec2::new(150.0, 2.0),
                radius_px: 5.0,
            },
        )
        .unwrap();
    assert_eq!(session.selected(), Some(&FeatureId::from("a")));

    controller
        .handle_command(
            &mut session,
            EditCommand::SplitLink {
                shape_point: ShapePoint::new("a", 1),
            },
        )
        .unwrap();
    let selected = session.selected().cloned().expect("Selektion bleibt bestehen");
    assert!(selected.is_temporary());
    assert_eq!(
        session.map().link(&selected).unwrap().coordinates[0],
        DVec2::new(0.0, 0.0)
    );
}

#[test]
fn test_fehlgeschlagener_submit_laesst_stack_unveraendert() {
    let mut controller = EditController::new();
    let mut session = make_test_session();
    controller
        .handle_command(
            &mut session,
            EditCommand::AddLink {
                coordinates: vec![DVec2::new(0.0, 100.0), DVec2::new(100.0, 100.0)],
                properties: Properties::new(),
            },
        )
        .unwrap();
    let before = session.info();

    let batch = prepare_submit(&mut session).expect("Batch mit einem neuen Link");
    assert_eq!(batch.added.len(), 1);

    // Während des Submits aufgestaute Commands laufen erst danach.
    controller
        .handle_command(&mut session, EditCommand::Undo { steps: 1 })
        .unwrap();
    assert_eq!(controller.pending(), 1);

    let result = complete_submit(
        &mut session,
        &batch,
        "remote",
        Err(anyhow::anyhow!("Timeout")),
    );
    assert!(result.is_err());
    assert_eq!(session.info(), before);
    assert!(batch.added[0].id().is_temporary());
    assert!(session.map().contains(batch.added[0].id()));

    controller.flush(&mut session).unwrap();
    assert_eq!(session.info().current, 0);
}

#[test]
fn test_beobachter_erhalten_events_in_reihenfolge() {
    let mut controller = EditController::new();
    let mut session = make_test_session();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    controller
        .handle_command(&mut session, EditCommand::RemoveFeature { id: "b".into() })
        .unwrap();

    let events = events.borrow();
    assert!(matches!(&events[0], EditorEvent::FeatureRemoved(id) if id == &FeatureId::from("b")));
    assert!(matches!(
        events.last(),
        Some(EditorEvent::HistoryChanged(HistoryInfo {
            current: 1,
            length: 1,
            changes: 1
        }))
    ));
}
