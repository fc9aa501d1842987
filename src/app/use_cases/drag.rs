//! Use-Case: Drag-Lifecycle für Shape-Points und ganze Features.
//!
//! Gesten-Deltas kommen in Pixeln und werden über den Viewport in
//! Welteinheiten umgerechnet. Ohne `ready` sind alle Drags wirkungslos.

use crate::app::EditSession;
use crate::core::topology::{drag_feature as translate_feature, ShapeDrag};
use crate::core::{EditResult, FeatureChange, FeatureId, ShapePoint};
use glam::DVec2;

/// Greift einen Shape-Point. Ein noch laufender Drag wird vorher abgeschlossen.
pub fn begin_drag(session: &mut EditSession, shape_point: ShapePoint) -> EditResult<bool> {
    if !session.accepts("begin_drag") {
        return Ok(false);
    }
    if session.drag.is_some() {
        end_drag(session)?;
    }
    let tolerances = session.tolerances();
    let drag = ShapeDrag::begin(&session.map, shape_point, &tolerances)?;
    log::debug!("Drag von {} begonnen", drag.shape_point());
    session.drag = Some(drag);
    Ok(true)
}

/// Verarbeitet einen Drag-Frame.
///
/// Schlägt der Frame fehl, wird der ganze Drag abgebrochen.
pub fn drag_frame(session: &mut EditSession, delta_px: DVec2) -> EditResult<bool> {
    if !session.accepts("drag_frame") {
        return Ok(false);
    }
    let delta = session.px_to_world_delta(delta_px);
    let tolerances = session.tolerances();
    let Some(drag) = session.drag.as_mut() else {
        log::debug!("Drag-Frame ohne aktiven Drag");
        return Ok(false);
    };
    if let Err(e) = drag.update(&mut session.map, delta, &tolerances) {
        log::warn!("Drag abgebrochen: {}", e);
        cancel_drag(session);
        return Err(e);
    }
    let changes = coordinate_changes(drag.affected_ids());
    session.publish_changes(&changes);
    Ok(true)
}

/// Schließt den Drag ab und zeichnet genau einen Step auf.
pub fn end_drag(session: &mut EditSession) -> EditResult<bool> {
    let Some(drag) = session.drag.take() else {
        log::debug!("Kein aktiver Drag zum Beenden");
        return Ok(false);
    };
    let affected = drag.affected_ids();
    let tolerances = session.tolerances();
    match drag.finish(&mut session.map, &tolerances) {
        Ok(Some(step)) => {
            log::info!("{} abgeschlossen", step.label);
            session.record(step);
            Ok(true)
        }
        Ok(None) => {
            log::debug!("Drag ohne Änderung beendet");
            Ok(false)
        }
        Err(e) => {
            log::warn!("Drag verworfen: {}", e);
            session.publish_changes(&coordinate_changes(affected));
            Err(e)
        }
    }
}

/// Bricht einen laufenden Drag ab und stellt den Ausgangszustand wieder her.
pub fn cancel_drag(session: &mut EditSession) -> bool {
    let Some(drag) = session.drag.take() else {
        return false;
    };
    let affected = drag.affected_ids();
    drag.cancel(&mut session.map);
    session.publish_changes(&coordinate_changes(affected));
    log::debug!("Drag abgebrochen");
    true
}

/// Zieht einen Shape-Point in einem Schritt (Begin, ein Frame, End).
pub fn drag_shape(
    session: &mut EditSession,
    shape_point: ShapePoint,
    delta_px: DVec2,
) -> EditResult<bool> {
    if !begin_drag(session, shape_point)? {
        return Ok(false);
    }
    drag_frame(session, delta_px)?;
    end_drag(session)
}

/// Verschiebt ein ganzes Feature.
pub fn drag_feature(session: &mut EditSession, id: &FeatureId, delta_px: DVec2) -> EditResult<bool> {
    if !session.accepts("drag_feature") {
        return Ok(false);
    }
    let delta = session.px_to_world_delta(delta_px);
    session.run(&format!("Drag {}", id), |tx, _, tolerances| {
        translate_feature(tx, id, delta, tolerances)?;
        Ok(delta != DVec2::ZERO)
    })
}

fn coordinate_changes(ids: Vec<FeatureId>) -> Vec<FeatureChange> {
    ids.into_iter().map(FeatureChange::CoordinatesChanged).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Feature, Link};
    use crate::shared::EditorOptions;

    fn session() -> EditSession {
        EditSession::with_features(
            EditorOptions::default(),
            [
                Feature::Link(Link::new(
                    "l1",
                    vec![DVec2::new(100.0, 300.0), DVec2::new(400.0, 300.0)],
                )),
                Feature::Link(Link::new(
                    "l2",
                    vec![DVec2::new(100.0, 300.0), DVec2::new(100.0, 100.0)],
                )),
            ],
        )
        .unwrap()
    }

    #[test]
    fn lifecycle_records_single_step() {
        let mut session = session();
        assert!(begin_drag(&mut session, ShapePoint::new("l2", 0)).unwrap());
        for _ in 0..5 {
            drag_frame(&mut session, DVec2::new(0.0, 4.0)).unwrap();
        }
        assert!(end_drag(&mut session).unwrap());
        assert_eq!(session.info().length, 1);
        assert_eq!(
            session.map().vertex(&ShapePoint::new("l1", 0)).unwrap(),
            DVec2::new(100.0, 320.0)
        );
    }

    #[test]
    fn cancel_restores_geometry() {
        let mut session = session();
        begin_drag(&mut session, ShapePoint::new("l2", 0)).unwrap();
        drag_frame(&mut session, DVec2::new(30.0, 0.0)).unwrap();
        assert!(cancel_drag(&mut session));
        assert_eq!(
            session.map().vertex(&ShapePoint::new("l2", 0)).unwrap(),
            DVec2::new(100.0, 300.0)
        );
        assert_eq!(session.info().length, 0);
    }

    #[test]
    fn drag_respects_zoom() {
        let mut session = session();
        session.viewport_mut().zoom_by(2.0);
        drag_feature(&mut session, &"l1".into(), DVec2::new(0.0, 20.0)).unwrap();
        assert_eq!(
            session.map().vertex(&ShapePoint::new("l1", 0)).unwrap(),
            DVec2::new(100.0, 310.0)
        );
    }

    #[test]
    fn frames_without_drag_are_ignored() {
        let mut session = session();
        assert!(!drag_frame(&mut session, DVec2::ONE).unwrap());
        assert!(!end_drag(&mut session).unwrap());
    }
}
