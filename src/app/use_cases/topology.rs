//! Use-Case: Topologie-Operationen (Connect, Disconnect, Split, Kreuzungen, Merge).

use crate::app::EditSession;
use crate::core::topology::{
    check_crossings as find_crossings, connect_shape_points, default_disconnect_offset,
    disconnect_shape_point, merge_candidates as find_merge_candidates,
    merge_links as merge, split_link as split,
};
use crate::core::{Crossing, EditResult, FeatureId, MergeCandidate, ShapePoint};

/// Setzt `shape_point` exakt auf die Position von `target`.
pub fn connect(
    session: &mut EditSession,
    shape_point: &ShapePoint,
    target: &ShapePoint,
) -> EditResult<bool> {
    if !session.accepts("connect") {
        return Ok(false);
    }
    session.run(&format!("{} mit {} verbinden", shape_point, target), |tx, _, tolerances| {
        connect_shape_points(tx, shape_point, target, tolerances)
    })
}

/// Löst einen Shape-Point von seinen Nachbarn (No-op ohne Verbindung).
pub fn disconnect(session: &mut EditSession, shape_point: &ShapePoint) -> EditResult<bool> {
    if !session.accepts("disconnect") {
        return Ok(false);
    }
    session.run(&format!("{} lösen", shape_point), |tx, _, tolerances| {
        if tx.map().connections_of(shape_point, tolerances.epsilon).is_empty() {
            log::debug!("{} ist nicht verbunden", shape_point);
            return Ok(false);
        }
        let offset = default_disconnect_offset(tx, shape_point, tolerances)?;
        disconnect_shape_point(tx, shape_point, offset, tolerances)
    })
}

/// Teilt einen Link an einem inneren Shape-Point.
pub fn split_link(
    session: &mut EditSession,
    shape_point: &ShapePoint,
) -> EditResult<Option<(FeatureId, FeatureId)>> {
    if !session.accepts("split_link") {
        return Ok(None);
    }
    let parts = session.run(&format!("{} teilen", shape_point), |tx, ids, tolerances| {
        split(tx, shape_point, ids, tolerances)
    })?;
    if session.selected() == Some(&shape_point.link) {
        session.set_selection(Some(parts.0.clone()));
    }
    Ok(Some(parts))
}

/// Kreuzungskandidaten eines Links, aufsteigend nach Pixel-Distanz.
pub fn check_crossings(session: &EditSession, link: &FeatureId) -> EditResult<Vec<Crossing>> {
    find_crossings(session.map(), link, &session.tolerances())
}

/// Verbindet eine Kreuzung; Positionen werden erst jetzt aufgelöst.
pub fn connect_crossing(
    session: &mut EditSession,
    crossing: &Crossing,
) -> EditResult<Option<ShapePoint>> {
    if !session.accepts("connect_crossing") {
        return Ok(None);
    }
    session.run(
        &format!("Kreuzung {} / {} verbinden", crossing.link, crossing.candidate_link),
        |tx, ids, tolerances| crossing.connect(tx, ids, tolerances),
    )
}

/// Links, mit denen `link` an einem Endpunkt zusammengeführt werden kann.
pub fn merge_candidates(session: &EditSession, link: &FeatureId) -> EditResult<Vec<MergeCandidate>> {
    find_merge_candidates(session.map(), link, &session.tolerances())
}

/// Führt zwei Links zu einem neuen zusammen.
pub fn merge_links(
    session: &mut EditSession,
    first: &FeatureId,
    second: &FeatureId,
) -> EditResult<Option<FeatureId>> {
    if !session.accepts("merge_links") {
        return Ok(None);
    }
    session.run(&format!("{} und {} zusammenführen", first, second), |tx, ids, tolerances| {
        merge(tx, first, second, ids, tolerances)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EditError, Feature, Link};
    use crate::shared::EditorOptions;
    use glam::DVec2;

    fn session() -> EditSession {
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
                    vec![DVec2::new(200.0, 0.0), DVec2::new(200.0, 100.0)],
                )),
                Feature::Link(Link::new(
                    "c",
                    vec![DVec2::new(50.0, 5.0), DVec2::new(50.0, 100.0)],
                )),
            ],
        )
        .unwrap()
    }

    #[test]
    fn disconnect_unconnected_point_is_noop() {
        let mut session = session();
        assert!(!disconnect(&mut session, &ShapePoint::new("c", 0)).unwrap());
        assert_eq!(session.info().length, 0);
    }

    #[test]
    fn disconnect_moves_only_own_vertex() {
        let mut session = session();
        assert!(disconnect(&mut session, &ShapePoint::new("b", 0)).unwrap());
        assert_eq!(
            session.map().vertex(&ShapePoint::new("a", 2)).unwrap(),
            DVec2::new(200.0, 0.0)
        );
        assert_ne!(
            session.map().vertex(&ShapePoint::new("b", 0)).unwrap(),
            DVec2::new(200.0, 0.0)
        );
        assert_eq!(session.info().changes, 1);
    }

    #[test]
    fn split_creates_one_step() {
        let mut session = session();
        let (first, second) = split_link(&mut session, &ShapePoint::new("a", 1))
            .unwrap()
            .expect("geteilt");
        assert!(session.map().link(&"a".into()).is_none());
        assert_eq!(session.map().link(&first).unwrap().coordinates.len(), 2);
        assert_eq!(session.map().link(&second).unwrap().coordinates.len(), 2);
        assert_eq!(session.info().current, 1);
        assert!(matches!(
            split_link(&mut session, &ShapePoint::new(first, 0)),
            Err(EditError::SplitAtEndpoint { .. })
        ));
        assert_eq!(session.info().current, 1);
    }

    #[test]
    fn crossing_connects_and_splits_target() {
        let mut session = session();
        let crossings = check_crossings(&session, &"c".into()).unwrap();
        let first = crossings.first().expect("Kreuzung erwartet").clone();
        assert_eq!(first.candidate_link, FeatureId::from("a"));
        connect_crossing(&mut session, &first).unwrap().expect("verbunden");
        assert_eq!(
            session.map().vertex(&ShapePoint::new("c", 0)).unwrap(),
            DVec2::new(50.0, 0.0)
        );
        assert_eq!(session.info().length, 1);
    }

    #[test]
    fn merge_joins_exclusive_neighbours() {
        let mut session = session();
        let candidates = merge_candidates(&session, &"a".into()).unwrap();
        assert_eq!(candidates.len(), 1);
        let merged = merge_links(&mut session, &"a".into(), &"b".into())
            .unwrap()
            .expect("zusammengeführt");
        assert_eq!(session.map().link(&merged).unwrap().coordinates.len(), 4);
        assert_eq!(session.info().changes, 3);
    }
}
