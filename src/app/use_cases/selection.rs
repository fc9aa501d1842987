//! Use-Case: Feature-Selektion.

use crate::app::EditSession;
use crate::core::geometry::point_in_ring;
use crate::core::FeatureId;
use glam::DVec2;

/// Selektiert ein vorhandenes Feature.
pub fn select(session: &mut EditSession, id: &FeatureId) -> bool {
    if !session.map().contains(id) {
        log::debug!("Feature {} nicht vorhanden, Selektion unverändert", id);
        return false;
    }
    session.set_selection(Some(id.clone()));
    true
}

/// Selektiert das Feature unter einer Bildschirmposition.
///
/// Places haben Vorrang vor Links, Links vor Flächen. Ist
/// `feature_selection_by_default` aus, bleibt die Selektion unverändert.
/// Ein Klick ins Leere hebt die Selektion auf.
pub fn select_at(session: &mut EditSession, position_px: DVec2, radius_px: f64) -> Option<FeatureId> {
    if !session.options().feature_selection_by_default {
        log::debug!("Klick-Selektion deaktiviert");
        return None;
    }
    let position = session.viewport().screen_to_world(position_px);
    let radius = session.viewport().px_to_world(radius_px);
    let map = session.map();
    let hit = map
        .places_within_radius(position, radius)
        .into_iter()
        .next()
        .or_else(|| map.nearest_link(position, radius, |_| true).map(|hit| hit.link))
        .or_else(|| {
            let mut areas: Vec<&FeatureId> = map
                .areas_iter()
                .filter(|area| {
                    area.rings
                        .first()
                        .is_some_and(|outer| point_in_ring(position, outer))
                })
                .map(|area| &area.id)
                .collect();
            areas.sort();
            areas.first().map(|id| (*id).clone())
        });
    session.set_selection(hit.clone());
    hit
}

/// Hebt die Selektion auf.
pub fn unselect(session: &mut EditSession) {
    session.set_selection(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Area, Feature, Link, Place, PlaceKind, Properties};
    use crate::shared::EditorOptions;

    fn session(feature_selection_by_default: bool) -> EditSession {
        EditSession::with_features(
            EditorOptions {
                feature_selection_by_default,
                ..EditorOptions::default()
            },
            [
                Feature::Link(Link::new(
                    "road",
                    vec![DVec2::new(0.0, 100.0), DVec2::new(300.0, 100.0)],
                )),
                Feature::Place(Place::new("poi", PlaceKind::Poi, DVec2::new(150.0, 104.0))),
                Feature::Area(Area {
                    id: "park".into(),
                    rings: vec![vec![
                        DVec2::new(400.0, 0.0),
                        DVec2::new(600.0, 0.0),
                        DVec2::new(600.0, 200.0),
                        DVec2::new(400.0, 200.0),
                    ]],
                    properties: Properties::new(),
                }),
            ],
        )
        .unwrap()
    }

    #[test]
    fn click_prefers_places_then_links_then_areas() {
        let mut session = session(true);
        let hit = select_at(&mut session, DVec2::new(150.0, 100.0), 8.0);
        assert_eq!(hit, Some("poi".into()));
        let hit = select_at(&mut session, DVec2::new(50.0, 103.0), 8.0);
        assert_eq!(hit, Some("road".into()));
        let hit = select_at(&mut session, DVec2::new(500.0, 100.0), 8.0);
        assert_eq!(hit, Some("park".into()));
        assert_eq!(select_at(&mut session, DVec2::new(50.0, 400.0), 8.0), None);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn click_selection_can_be_disabled() {
        let mut session = session(false);
        assert_eq!(select_at(&mut session, DVec2::new(150.0, 100.0), 8.0), None);
        assert!(select(&mut session, &"road".into()));
        assert_eq!(session.selected(), Some(&"road".into()));
    }

    #[test]
    fn removed_feature_is_unselected() {
        let mut session = session(true);
        select(&mut session, &"road".into());
        crate::app::use_cases::editing::remove_feature(&mut session, &"road".into()).unwrap();
        assert_eq!(session.selected(), None);
        unselect(&mut session);
        assert!(!select(&mut session, &"ghost".into()));
    }
}
