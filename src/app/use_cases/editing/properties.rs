//! Use-Case: Attribute von Features setzen.

use crate::app::EditSession;
use crate::core::{EditError, EditResult, FeatureId, Property, TurnRestriction};

fn set_property(
    session: &mut EditSession,
    operation: &str,
    id: &FeatureId,
    property: Property,
) -> EditResult<bool> {
    if !session.accepts(operation) {
        return Ok(false);
    }
    session.run(&format!("{} für {}", operation, id), |tx, _, _| {
        tx.set_property(id, property)?;
        Ok(true)
    })
}

/// Setzt ein freies Attribut (`None` entfernt es).
pub fn set_attribute(
    session: &mut EditSession,
    id: &FeatureId,
    key: &str,
    value: Option<serde_json::Value>,
) -> EditResult<bool> {
    let property = Property::Attribute {
        key: key.to_string(),
        value,
    };
    set_property(session, "set_attribute", id, property)
}

/// Ersetzt die Abbiegeverbote eines Links.
pub fn set_turn_restriction(
    session: &mut EditSession,
    link: &FeatureId,
    restriction: TurnRestriction,
) -> EditResult<bool> {
    session.map().require_link(link)?;
    set_property(
        session,
        "set_turn_restriction",
        link,
        Property::TurnRestriction(restriction),
    )
}

/// Ersetzt die Z-Level eines Links (Länge muss zur Vertex-Folge passen).
pub fn set_z_levels(
    session: &mut EditSession,
    link: &FeatureId,
    z_levels: Option<Vec<i32>>,
) -> EditResult<bool> {
    let len = session.map().require_link(link)?.len();
    if let Some(z) = &z_levels {
        if z.len() != len {
            return Err(EditError::ZLevelLengthMismatch {
                link: link.clone(),
                expected: len,
                actual: z.len(),
            });
        }
    }
    set_property(session, "set_z_levels", link, Property::ZLevels(z_levels))
}

/// Setzt das Editierbar-Flag eines Links.
pub fn set_editable(session: &mut EditSession, link: &FeatureId, editable: bool) -> EditResult<bool> {
    session.map().require_link(link)?;
    set_property(session, "set_editable", link, Property::Editable(editable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Feature, Link};
    use crate::shared::EditorOptions;
    use glam::DVec2;

    fn session() -> EditSession {
        EditSession::with_features(
            EditorOptions::default(),
            [Feature::Link(Link::new(
                "l",
                vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)],
            ))],
        )
        .unwrap()
    }

    #[test]
    fn attribute_set_and_removed() {
        let mut session = session();
        set_attribute(&mut session, &"l".into(), "name", Some("Ring".into())).unwrap();
        assert_eq!(
            session.map().link(&"l".into()).unwrap().properties["name"],
            "Ring"
        );
        set_attribute(&mut session, &"l".into(), "name", None).unwrap();
        assert!(session.map().link(&"l".into()).unwrap().properties.is_empty());
        assert_eq!(session.info().current, 2);
        assert_eq!(session.info().changes, 0);
    }

    #[test]
    fn z_levels_must_match_vertex_count() {
        let mut session = session();
        let result = set_z_levels(&mut session, &"l".into(), Some(vec![1]));
        assert!(matches!(
            result,
            Err(EditError::ZLevelLengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(set_z_levels(&mut session, &"l".into(), Some(vec![1, 0])).unwrap());
    }

    #[test]
    fn editable_flag_round_trips_through_undo() {
        let mut session = session();
        set_editable(&mut session, &"l".into(), false).unwrap();
        assert!(!session.map().link(&"l".into()).unwrap().editable);
        crate::app::use_cases::history::undo(&mut session, 1).unwrap();
        assert!(session.map().link(&"l".into()).unwrap().editable);
    }
}
