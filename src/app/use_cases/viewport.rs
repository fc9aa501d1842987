//! Use-Case-Funktionen für Viewport-Zustand und Nachladen.

use crate::app::{EditSession, EditorEvent};
use crate::core::{EditResult, Feature};
use glam::DVec2;
use std::sync::Arc;

/// Aktualisiert die Viewport-Größe.
pub fn resize(session: &mut EditSession, size_px: DVec2) {
    session.viewport_mut().size = size_px;
}

/// Verschiebt den Viewport um ein Pixel-Delta.
pub fn pan(session: &mut EditSession, delta_px: DVec2) {
    session.viewport_mut().pan(delta_px);
}

/// Zoomt den Viewport; Toleranzen folgen beim nächsten Aufruf.
pub fn zoom(session: &mut EditSession, factor: f64) {
    session.viewport_mut().zoom_by(factor);
}

/// Beginnt ein Nachladen: bis zum Abschluss ist die Session nicht bereit.
pub fn begin_viewport_reload(session: &mut EditSession) {
    log::debug!("Viewport-Nachladen begonnen");
    session.begin_reload();
}

/// Schließt das Nachladen ab und übernimmt bisher unbekannte Features.
///
/// Nachgeladene Features gehen ohne History in Arbeitskopie und Baseline.
/// Features, die die Session schon kennt (auch lokal gelöschte), bleiben
/// unangetastet. Gibt die Anzahl übernommener Features zurück.
pub fn finish_viewport_reload(
    session: &mut EditSession,
    loaded: impl IntoIterator<Item = Feature>,
) -> EditResult<usize> {
    let result = merge_loaded(session, loaded);
    session.end_reload();
    log::debug!("Viewport-Nachladen abgeschlossen");
    result
}

fn merge_loaded(
    session: &mut EditSession,
    loaded: impl IntoIterator<Item = Feature>,
) -> EditResult<usize> {
    let mut added = 0;
    for feature in loaded {
        let id = feature.id().clone();
        if session.map.contains(&id) || session.baseline.contains(&id) {
            continue;
        }
        session.map.add_feature(feature.clone())?;
        Arc::make_mut(&mut session.baseline).add_feature(feature.clone())?;
        session.emit(EditorEvent::FeatureAdded(feature));
        added += 1;
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::use_cases::drag::drag_shape;
    use crate::app::use_cases::editing::remove_feature;
    use crate::core::{Link, ShapePoint};
    use crate::shared::EditorOptions;

    fn link(id: &str, y: f64) -> Feature {
        Feature::Link(Link::new(
            id,
            vec![DVec2::new(0.0, y), DVec2::new(100.0, y)],
        ))
    }

    #[test]
    fn drags_are_ignored_while_reloading() {
        let mut session =
            EditSession::with_features(EditorOptions::default(), [link("a", 0.0)]).unwrap();
        begin_viewport_reload(&mut session);
        assert!(!drag_shape(&mut session, ShapePoint::new("a", 0), DVec2::new(5.0, 5.0)).unwrap());
        assert_eq!(
            session.map().vertex(&ShapePoint::new("a", 0)).unwrap(),
            DVec2::new(0.0, 0.0)
        );
        finish_viewport_reload(&mut session, []).unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn reload_adds_only_unknown_features() {
        let mut session = EditSession::with_features(
            EditorOptions::default(),
            [link("a", 0.0), link("b", 50.0)],
        )
        .unwrap();
        remove_feature(&mut session, &"b".into()).unwrap();
        begin_viewport_reload(&mut session);
        let added =
            finish_viewport_reload(&mut session, [link("a", 9.0), link("b", 50.0), link("c", 90.0)])
                .unwrap();
        assert_eq!(added, 1);
        assert!(session.map().contains(&"c".into()));
        assert!(!session.map().contains(&"b".into()));
        assert_eq!(session.info().changes, 1);
    }

    #[test]
    fn pan_and_zoom_change_tolerances() {
        let mut session = EditSession::default();
        zoom(&mut session, 4.0);
        pan(&mut session, DVec2::new(40.0, 0.0));
        resize(&mut session, DVec2::new(800.0, 600.0));
        assert_eq!(session.tolerances().auto_connect, 20.0);
        assert_eq!(session.viewport().size, DVec2::new(800.0, 600.0));
    }
}
