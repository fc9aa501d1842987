//! Routing-Punkte von POIs und Adressen.
//!
//! Invariante nach jedem Abgleich: ist `routing_link` gesetzt, existiert der
//! Link und `routing_point` liegt auf ihm.

use crate::core::error::EditResult;
use crate::core::geometry::project_onto_polyline;
use crate::core::topology::Tolerances;
use crate::core::{FeatureId, NetworkMap, Property, RoutingPoint, Transaction};
use glam::DVec2;

/// Sucht den nächsten editierbaren Link im Routing-Radius.
///
/// `None`, wenn kein Link erreichbar ist.
pub fn find_routing(
    map: &NetworkMap,
    position: DVec2,
    tolerances: &Tolerances,
    exclude: Option<&FeatureId>,
) -> Option<RoutingPoint> {
    map.nearest_link(position, tolerances.max_routing, |link| {
        link.editable && Some(&link.id) != exclude
    })
    .map(|hit| RoutingPoint::attached(hit.link, hit.projection.point))
}

/// Routing für einen neu angelegten Place.
///
/// Liefert `None`, wenn kein Link erreichbar ist und die Policy einen
/// Routing-Link verlangt; sonst die (ggf. leere) Anbindung.
pub fn routing_for_new_place(
    map: &NetworkMap,
    position: DVec2,
    tolerances: &Tolerances,
) -> Option<RoutingPoint> {
    match find_routing(map, position, tolerances, None) {
        Some(routing) => Some(routing),
        None if tolerances.require_routing_link => {
            log::debug!("Kein Link im Routing-Radius um {:?}", position);
            None
        }
        None => Some(RoutingPoint::default()),
    }
}

/// Projiziert Routing-Punkte nach einer Geometrie-Änderung neu.
///
/// Liegt der alte Routing-Punkt nicht mehr im Radius, wird der nächste
/// alternative Link gesucht, sonst die Anbindung gelöscht.
pub fn reconcile_link_geometry(
    tx: &mut Transaction<'_>,
    link: &FeatureId,
    tolerances: &Tolerances,
) -> EditResult<()> {
    for place_id in tx.map().places_routed_to(link) {
        let Some(place) = tx.map().place(&place_id) else {
            continue;
        };
        let anchor = place.routing.routing_point.unwrap_or(place.position);
        let current = tx.map().link(link).and_then(|l| {
            project_onto_polyline(anchor, &l.coordinates)
                .filter(|proj| proj.distance <= tolerances.max_routing)
        });
        let routing = match current {
            Some(projection) => RoutingPoint::attached(link.clone(), projection.point),
            None => find_routing(tx.map(), anchor, tolerances, Some(link)).unwrap_or_default(),
        };
        set_routing(tx, &place_id, routing)?;
    }
    Ok(())
}

/// Hängt Routing-Punkte eines entfernten Links um oder löscht sie.
pub fn reconcile_link_removed(
    tx: &mut Transaction<'_>,
    removed: &FeatureId,
    tolerances: &Tolerances,
) -> EditResult<()> {
    for place_id in tx.map().places_routed_to(removed) {
        let Some(place) = tx.map().place(&place_id) else {
            continue;
        };
        let anchor = place.routing.routing_point.unwrap_or(place.position);
        let routing = find_routing(tx.map(), anchor, tolerances, Some(removed));
        match &routing {
            Some(r) => log::debug!(
                "Routing von {} auf {:?} umgehängt",
                place_id,
                r.routing_link
            ),
            None => log::debug!("Routing von {} gelöscht", place_id),
        }
        set_routing(tx, &place_id, routing.unwrap_or_default())?;
    }
    Ok(())
}

/// Ordnet Routing-Punkte nach einem Split dem geometrisch nächsten Teil zu.
///
/// Bei Gleichstand gewinnt der erste Teil.
pub fn reassign_to_parts(
    tx: &mut Transaction<'_>,
    original: &FeatureId,
    parts: &[FeatureId],
) -> EditResult<()> {
    for place_id in tx.map().places_routed_to(original) {
        let Some(place) = tx.map().place(&place_id) else {
            continue;
        };
        let anchor = place.routing.routing_point.unwrap_or(place.position);
        let mut best: Option<(FeatureId, DVec2, f64)> = None;
        for part in parts {
            let Some(projection) = tx
                .map()
                .link(part)
                .and_then(|l| project_onto_polyline(anchor, &l.coordinates))
            else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |(_, _, d)| projection.distance < *d)
            {
                best = Some((part.clone(), projection.point, projection.distance));
            }
        }
        let routing = best
            .map(|(link, point, _)| RoutingPoint::attached(link, point))
            .unwrap_or_default();
        set_routing(tx, &place_id, routing)?;
    }
    Ok(())
}

/// Gleicht das Routing eines verschobenen Places ab.
///
/// Ein erreichbarer Link wird übernommen; ohne Treffer bleibt die bisherige
/// Anbindung bestehen.
pub fn reconcile_place(
    tx: &mut Transaction<'_>,
    place_id: &FeatureId,
    tolerances: &Tolerances,
) -> EditResult<()> {
    let Some(place) = tx.map().place(place_id) else {
        return Ok(());
    };
    if let Some(routing) = find_routing(tx.map(), place.position, tolerances, None) {
        set_routing(tx, place_id, routing)?;
    }
    Ok(())
}

fn set_routing(
    tx: &mut Transaction<'_>,
    place_id: &FeatureId,
    routing: RoutingPoint,
) -> EditResult<()> {
    let unchanged = tx
        .map()
        .place(place_id)
        .is_some_and(|place| place.routing == routing);
    if unchanged {
        return Ok(());
    }
    tx.set_property(place_id, Property::Routing(routing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Feature, Link, Place, PlaceKind};

    fn map_with_address() -> NetworkMap {
        let mut address = Place::new("addr", PlaceKind::Address, DVec2::new(50.0, 10.0));
        address.routing = RoutingPoint::attached("l1".into(), DVec2::new(50.0, 0.0));
        NetworkMap::from_features([
            Feature::Link(Link::new(
                "l1",
                vec![DVec2::new(0.0, 0.0), DVec2::new(100.0, 0.0)],
            )),
            Feature::Link(Link::new(
                "l2",
                vec![DVec2::new(0.0, 30.0), DVec2::new(100.0, 30.0)],
            )),
            Feature::Place(address),
        ])
        .unwrap()
    }

    #[test]
    fn removed_link_reattaches_to_alternative() {
        let mut map = map_with_address();
        let mut tx = Transaction::new(&mut map);
        tx.remove_feature(&"l1".into()).unwrap();
        reconcile_link_removed(&mut tx, &"l1".into(), &Tolerances::default()).unwrap();
        tx.commit("remove");

        let place = map.place(&"addr".into()).unwrap();
        assert_eq!(place.routing.routing_link, Some(FeatureId::from("l2")));
        assert_eq!(place.routing.routing_point, Some(DVec2::new(50.0, 30.0)));
    }

    #[test]
    fn removed_link_without_alternative_clears_routing() {
        let mut map = map_with_address();
        let tolerances = Tolerances {
            max_routing: 20.0,
            ..Tolerances::default()
        };
        let mut tx = Transaction::new(&mut map);
        tx.remove_feature(&"l1".into()).unwrap();
        reconcile_link_removed(&mut tx, &"l1".into(), &tolerances).unwrap();
        tx.commit("remove");

        let place = map.place(&"addr".into()).unwrap();
        assert_eq!(place.routing, RoutingPoint::default());
    }

    #[test]
    fn moved_link_reprojects_routing_point() {
        let mut map = map_with_address();
        let mut tx = Transaction::new(&mut map);
        tx.set_coordinates(
            &"l1".into(),
            vec![DVec2::new(0.0, 5.0), DVec2::new(100.0, 5.0)],
        )
        .unwrap();
        reconcile_link_geometry(&mut tx, &"l1".into(), &Tolerances::default()).unwrap();
        tx.commit("move");

        let place = map.place(&"addr".into()).unwrap();
        assert_eq!(place.routing.routing_link, Some(FeatureId::from("l1")));
        assert_eq!(place.routing.routing_point, Some(DVec2::new(50.0, 5.0)));
    }

    #[test]
    fn new_place_policy() {
        let map = map_with_address();
        let far = DVec2::new(500.0, 500.0);
        let lenient = Tolerances::default();
        assert_eq!(
            routing_for_new_place(&map, far, &lenient),
            Some(RoutingPoint::default())
        );
        let strict = Tolerances {
            require_routing_link: true,
            ..Tolerances::default()
        };
        assert_eq!(routing_for_new_place(&map, far, &strict), None);

        let near = routing_for_new_place(&map, DVec2::new(20.0, 4.0), &strict)
            .expect("Link in Reichweite");
        assert_eq!(near.routing_link, Some(FeatureId::from("l1")));
    }
}
