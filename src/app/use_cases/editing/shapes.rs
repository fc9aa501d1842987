//! Use-Case: Vertices einzelner Features bearbeiten.

use crate::app::EditSession;
use crate::core::geometry::project_onto_polyline;
use crate::core::topology::ensure_editable;
use crate::core::{EditError, EditResult, FeatureId, Geometry, Mutation, ShapePoint};
use glam::DVec2;

/// Fügt einen Vertex in einen Link ein und liefert dessen Index.
///
/// Ohne `index` landet der Vertex im nächstgelegenen Segment; projiziert
/// er über ein Ende hinaus, wird der Link dort verlängert.
pub fn add_shape(
    session: &mut EditSession,
    link: &FeatureId,
    vertex: DVec2,
    index: Option<usize>,
) -> EditResult<Option<usize>> {
    if !session.accepts("add_shape") {
        return Ok(None);
    }
    session.run(&format!("Vertex in {} einfügen", link), |tx, _, _| {
        ensure_editable(tx.map(), link)?;
        let index = match index {
            Some(index) => index,
            None => insertion_index(tx.map().coordinates(link)?, vertex),
        };
        tx.insert_vertex(link, index, vertex)?;
        Ok(Some(index))
    })
}

fn insertion_index(coordinates: &[DVec2], vertex: DVec2) -> usize {
    let Some(projection) = project_onto_polyline(vertex, coordinates) else {
        return coordinates.len();
    };
    match projection.vertex_index() {
        Some(0) => 0,
        Some(i) if i + 1 == coordinates.len() => coordinates.len(),
        _ => projection.segment_index + 1,
    }
}

/// Entfernt einen Vertex; ein Link behält mindestens zwei Vertices.
pub fn remove_shape(session: &mut EditSession, shape_point: &ShapePoint) -> EditResult<bool> {
    if !session.accepts("remove_shape") {
        return Ok(false);
    }
    session.run(&format!("Vertex {} entfernen", shape_point), |tx, _, _| {
        ensure_editable(tx.map(), &shape_point.link)?;
        tx.remove_vertex(&shape_point.link, shape_point.index)?;
        Ok(true)
    })
}

/// Ersetzt die Vertex-Folge eines Links (Z-Level bleiben erhalten).
pub fn set_coordinates(
    session: &mut EditSession,
    link: &FeatureId,
    coordinates: Vec<DVec2>,
) -> EditResult<bool> {
    if !session.accepts("set_coordinates") {
        return Ok(false);
    }
    session.run(&format!("Geometrie von {} ersetzen", link), |tx, _, _| {
        ensure_editable(tx.map(), link)?;
        tx.set_coordinates(link, coordinates)?;
        Ok(true)
    })
}

/// Ersetzt die Ringe einer Fläche.
pub fn set_area_rings(
    session: &mut EditSession,
    area: &FeatureId,
    rings: Vec<Vec<DVec2>>,
) -> EditResult<bool> {
    if !session.accepts("set_area_rings") {
        return Ok(false);
    }
    session.run(&format!("Ringe von {} ersetzen", area), |tx, _, _| {
        if tx.map().area(area).is_none() {
            return Err(EditError::UnknownFeature(area.clone()));
        }
        if rings.first().is_none_or(|outer| outer.len() < 3) {
            return Err(EditError::MinimumVertexCount { link: area.clone() });
        }
        tx.apply(Mutation::SetCoordinates {
            id: area.clone(),
            geometry: Geometry::Polygon(rings),
        })?;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Area, Feature, Link, Properties};
    use crate::shared::EditorOptions;

    fn session() -> EditSession {
        let mut bent = Link::new(
            "l",
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(100.0, 100.0),
            ],
        );
        bent.z_levels = Some(vec![0, 1, 2]);
        EditSession::with_features(
            EditorOptions::default(),
            [
                Feature::Link(bent),
                Feature::Link(Link::new(
                    "short",
                    vec![DVec2::new(0.0, 50.0), DVec2::new(50.0, 50.0)],
                )),
                Feature::Area(Area {
                    id: "park".into(),
                    rings: vec![vec![DVec2::ZERO, DVec2::X, DVec2::Y]],
                    properties: Properties::new(),
                }),
            ],
        )
        .unwrap()
    }

    #[test]
    fn add_shape_picks_nearest_segment() {
        let mut session = session();
        let index = add_shape(&mut session, &"l".into(), DVec2::new(110.0, 40.0), None)
            .unwrap()
            .unwrap();
        assert_eq!(index, 2);
        let link = session.map().link(&"l".into()).unwrap();
        assert_eq!(link.coordinates[2], DVec2::new(110.0, 40.0));
        assert_eq!(link.z_levels.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn add_shape_beyond_start_extends_link() {
        let mut session = session();
        let index = add_shape(&mut session, &"l".into(), DVec2::new(-20.0, 0.0), None)
            .unwrap()
            .unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn remove_shape_on_two_vertex_link_fails() {
        let mut session = session();
        let before = session.map().link(&"short".into()).cloned();
        let result = remove_shape(&mut session, &ShapePoint::new("short", 0));
        assert!(matches!(result, Err(EditError::MinimumVertexCount { .. })));
        assert_eq!(session.map().link(&"short".into()).cloned(), before);
        assert_eq!(session.info().length, 0);
    }

    #[test]
    fn remove_shape_keeps_z_levels_parallel() {
        let mut session = session();
        assert!(remove_shape(&mut session, &ShapePoint::new("l", 1)).unwrap());
        let link = session.map().link(&"l".into()).unwrap();
        assert_eq!(link.coordinates.len(), 2);
        assert_eq!(link.z_levels, Some(vec![0, 2]));
    }

    #[test]
    fn set_coordinates_respects_editable_flag() {
        let mut session = session();
        let coordinates = vec![DVec2::new(0.0, 60.0), DVec2::new(80.0, 60.0)];
        assert!(set_coordinates(&mut session, &"short".into(), coordinates.clone()).unwrap());
        assert_eq!(
            session.map().link(&"short".into()).unwrap().coordinates,
            coordinates
        );

        session.map.set_editable(&"short".into(), false).unwrap();
        let result = set_coordinates(&mut session, &"short".into(), vec![DVec2::ZERO, DVec2::X]);
        assert!(matches!(result, Err(EditError::NotEditable(_))));
        assert_eq!(session.info().length, 1);
    }

    #[test]
    fn area_rings_are_replaced() {
        let mut session = session();
        let rings = vec![vec![DVec2::ZERO, DVec2::new(5.0, 0.0), DVec2::new(5.0, 5.0)]];
        assert!(set_area_rings(&mut session, &"park".into(), rings.clone()).unwrap());
        assert_eq!(session.map().area(&"park".into()).unwrap().rings, rings);
        assert!(set_area_rings(&mut session, &"l".into(), rings).is_err());
    }
}
