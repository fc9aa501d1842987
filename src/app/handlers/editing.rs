//! Handler für Feature-Editing (Anlegen, Löschen, Vertices, Attribute).

use crate::app::use_cases;
use crate::app::EditSession;
use crate::core::{FeatureId, PlaceKind, Properties, ShapePoint, TurnRestriction};
use anyhow::Context;
use glam::DVec2;

/// Legt einen Link an.
pub fn add_link(
    session: &mut EditSession,
    coordinates: Vec<DVec2>,
    properties: Properties,
) -> anyhow::Result<()> {
    use_cases::editing::add_link(session, coordinates, properties)
        .context("Link konnte nicht angelegt werden")?;
    Ok(())
}

/// Legt einen POI bzw. eine Adresse an.
pub fn add_place(
    session: &mut EditSession,
    kind: PlaceKind,
    position: DVec2,
    properties: Properties,
) -> anyhow::Result<()> {
    if use_cases::editing::add_place(session, kind, position, properties)?.is_none() {
        log::debug!("Place bei {:?} nicht angelegt", position);
    }
    Ok(())
}

/// Legt eine Fläche an.
pub fn add_area(
    session: &mut EditSession,
    rings: Vec<Vec<DVec2>>,
    properties: Properties,
) -> anyhow::Result<()> {
    use_cases::editing::add_area(session, rings, properties)
        .context("Fläche konnte nicht angelegt werden")?;
    Ok(())
}

/// Löscht ein Feature.
pub fn remove_feature(session: &mut EditSession, id: &FeatureId) -> anyhow::Result<()> {
    use_cases::editing::remove_feature(session, id)?;
    Ok(())
}

/// Fügt einen Vertex ein.
pub fn add_shape(
    session: &mut EditSession,
    link: &FeatureId,
    vertex: DVec2,
    index: Option<usize>,
) -> anyhow::Result<()> {
    use_cases::editing::add_shape(session, link, vertex, index)
        .with_context(|| format!("Vertex in {} nicht eingefügt", link))?;
    Ok(())
}

/// Entfernt einen Vertex.
pub fn remove_shape(session: &mut EditSession, shape_point: &ShapePoint) -> anyhow::Result<()> {
    use_cases::editing::remove_shape(session, shape_point)
        .with_context(|| format!("Vertex {} nicht entfernt", shape_point))?;
    Ok(())
}

/// Setzt ein freies Attribut.
pub fn set_attribute(
    session: &mut EditSession,
    id: &FeatureId,
    key: &str,
    value: Option<serde_json::Value>,
) -> anyhow::Result<()> {
    use_cases::editing::set_attribute(session, id, key, value)?;
    Ok(())
}

/// Ersetzt die Abbiegeverbote eines Links.
pub fn set_turn_restriction(
    session: &mut EditSession,
    link: &FeatureId,
    restriction: TurnRestriction,
) -> anyhow::Result<()> {
    use_cases::editing::set_turn_restriction(session, link, restriction)?;
    Ok(())
}

/// Ersetzt die Z-Level eines Links.
pub fn set_z_levels(
    session: &mut EditSession,
    link: &FeatureId,
    z_levels: Option<Vec<i32>>,
) -> anyhow::Result<()> {
    use_cases::editing::set_z_levels(session, link, z_levels)?;
    Ok(())
}

/// Setzt das Editierbar-Flag eines Links.
pub fn set_editable(session: &mut EditSession, link: &FeatureId, editable: bool) -> anyhow::Result<()> {
    use_cases::editing::set_editable(session, link, editable)?;
    Ok(())
}
