//! Use-Case: Neue Features anlegen.

use crate::app::EditSession;
use crate::core::reconcile::routing::routing_for_new_place;
use crate::core::{
    Area, EditError, EditResult, Feature, FeatureId, Link, Place, PlaceKind, Properties,
};
use glam::DVec2;

/// Legt einen neuen Link mit temporärer ID an.
pub fn add_link(
    session: &mut EditSession,
    coordinates: Vec<DVec2>,
    properties: Properties,
) -> EditResult<Option<FeatureId>> {
    if !session.accepts("add_link") {
        return Ok(None);
    }
    session.run("Link hinzufügen", |tx, ids, _| {
        let id = ids.allocate(tx.map());
        let mut link = Link::new(id.clone(), coordinates);
        link.properties = properties;
        tx.add_feature(Feature::Link(link))?;
        Ok(Some(id))
    })
}

/// Legt einen POI bzw. eine Adresse an und bindet ihn an den nächsten Link.
///
/// Verlangt die Policy einen Routing-Link und liegt keiner in Reichweite,
/// wird nichts angelegt (`None`).
pub fn add_place(
    session: &mut EditSession,
    kind: PlaceKind,
    position: DVec2,
    properties: Properties,
) -> EditResult<Option<FeatureId>> {
    if !session.accepts("add_place") {
        return Ok(None);
    }
    session.run("Place hinzufügen", |tx, ids, tolerances| {
        let Some(routing) = routing_for_new_place(tx.map(), position, tolerances) else {
            return Ok(None);
        };
        let id = ids.allocate(tx.map());
        let mut place = Place::new(id.clone(), kind, position);
        place.routing = routing;
        place.properties = properties;
        tx.add_feature(Feature::Place(place))?;
        Ok(Some(id))
    })
}

/// Legt eine Fläche an; der äußere Ring braucht mindestens drei Punkte.
pub fn add_area(
    session: &mut EditSession,
    rings: Vec<Vec<DVec2>>,
    properties: Properties,
) -> EditResult<Option<FeatureId>> {
    if !session.accepts("add_area") {
        return Ok(None);
    }
    session.run("Fläche hinzufügen", |tx, ids, _| {
        let id = ids.allocate(tx.map());
        if rings.first().is_none_or(|outer| outer.len() < 3) {
            return Err(EditError::MinimumVertexCount { link: id });
        }
        tx.add_feature(Feature::Area(Area {
            id: id.clone(),
            rings,
            properties,
        }))?;
        Ok(Some(id))
    })
}
