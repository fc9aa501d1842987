//! Zusammenführen zweier Links, die sich an einem Endpunkt exklusiv berühren.

use super::{IdAllocator, Tolerances};
use crate::core::error::EditResult;
use crate::core::reconcile::{routing, turn_restrictions};
use crate::core::{Feature, FeatureId, Link, LinkEnd, NetworkMap, Transaction, TurnRestriction};
use glam::DVec2;

/// Ein Link, mit dem `link` an `end` zusammengeführt werden kann.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCandidate {
    /// Geprüfter Link
    pub link: FeatureId,
    /// Ende des geprüften Links
    pub end: LinkEnd,
    /// Nachbar-Link
    pub other: FeatureId,
    /// Ende des Nachbar-Links am selben Punkt
    pub other_end: LinkEnd,
    /// Gemeinsamer Endpunkt
    pub position: DVec2,
}

/// Listet alle Links, die genau an einem Endpunkt von `link` anschließen,
/// ohne dass ein dritter Link denselben Punkt berührt.
pub fn merge_candidates(
    map: &NetworkMap,
    link_id: &FeatureId,
    tolerances: &Tolerances,
) -> EditResult<Vec<MergeCandidate>> {
    let link = map.require_link(link_id)?;
    let mut candidates = Vec::new();
    if !link.editable {
        return Ok(candidates);
    }
    for end in [LinkEnd::Start, LinkEnd::End] {
        let position = link.coordinates[link.end_index(end)];
        let at_point = map.shape_points_at(position, tolerances.epsilon);
        let own = at_point.iter().filter(|sp| &sp.link == link_id).count();
        let others: Vec<_> = at_point.iter().filter(|sp| &sp.link != link_id).collect();
        if own != 1 || others.len() != 1 {
            continue;
        }
        let Some(other) = map.link(&others[0].link) else {
            continue;
        };
        let Some(other_end) = other.end_at(others[0].index) else {
            continue;
        };
        if !other.editable {
            continue;
        }
        candidates.push(MergeCandidate {
            link: link_id.clone(),
            end,
            other: other.id.clone(),
            other_end,
            position,
        });
    }
    Ok(candidates)
}

/// Führt `a` und `b` zu einem neuen Link zusammen.
///
/// Der neue Link übernimmt die Attribute von `a`, `parent_link` zeigt auf
/// `a`. Abbiegeverbote der äußeren Enden bleiben erhalten, Referenzen und
/// Routing-Punkte werden auf den neuen Link umgehängt. `None`, wenn die
/// beiden Links nicht zusammengeführt werden können.
pub fn merge_links(
    tx: &mut Transaction<'_>,
    a: &FeatureId,
    b: &FeatureId,
    ids: &mut IdAllocator,
    tolerances: &Tolerances,
) -> EditResult<Option<FeatureId>> {
    let Some(candidate) = merge_candidates(tx.map(), a, tolerances)?
        .into_iter()
        .find(|c| &c.other == b)
    else {
        log::debug!("{} und {} sind nicht zusammenführbar", a, b);
        return Ok(None);
    };
    let first = tx.map().require_link(a)?.clone();
    let second = tx.map().require_link(b)?.clone();

    let (head, head_z) = oriented(&first, candidate.end == LinkEnd::Start);
    let (tail, tail_z) = oriented(&second, candidate.other_end == LinkEnd::End);
    let start_restriction = first.turn_restriction.side(opposite(candidate.end)).to_vec();
    let end_restriction = second
        .turn_restriction
        .side(opposite(candidate.other_end))
        .to_vec();
    let head_len = head.len();

    let mut coordinates = head;
    coordinates.extend_from_slice(&tail[1..]);
    let z_levels = match (head_z, tail_z) {
        (None, None) => None,
        (head_z, tail_z) => {
            let mut z = head_z.unwrap_or_else(|| vec![0; head_len]);
            let tail_z = tail_z.unwrap_or_else(|| vec![0; tail.len()]);
            z.extend_from_slice(&tail_z[1..]);
            Some(z)
        }
    };
    let outer = |ids: Vec<FeatureId>| -> Vec<FeatureId> {
        ids.into_iter().filter(|id| id != a && id != b).collect()
    };

    tx.remove_feature(a)?;
    tx.remove_feature(b)?;
    let merged_id = ids.allocate(tx.map());
    tx.add_feature(Feature::Link(Link {
        id: merged_id.clone(),
        coordinates,
        z_levels,
        editable: true,
        turn_restriction: TurnRestriction {
            start: outer(start_restriction),
            end: outer(end_restriction),
        },
        origin_link: Some(first.origin_link.clone().unwrap_or_else(|| first.id.clone())),
        parent_link: Some(first.id.clone()),
        properties: first.properties.clone(),
    }))?;

    turn_restrictions::repoint_after_merge(tx, &[a.clone(), b.clone()], &merged_id)?;
    routing::reassign_to_parts(tx, a, std::slice::from_ref(&merged_id))?;
    routing::reassign_to_parts(tx, b, std::slice::from_ref(&merged_id))?;

    log::info!("Links {} und {} zu {} zusammengeführt", a, b, merged_id);
    Ok(Some(merged_id))
}

fn opposite(end: LinkEnd) -> LinkEnd {
    match end {
        LinkEnd::Start => LinkEnd::End,
        LinkEnd::End => LinkEnd::Start,
    }
}

/// Vertex-Folge und Z-Level, bei Bedarf umgedreht.
fn oriented(link: &Link, reverse: bool) -> (Vec<DVec2>, Option<Vec<i32>>) {
    let mut coordinates = link.coordinates.clone();
    let mut z_levels = link.z_levels.clone();
    if reverse {
        coordinates.reverse();
        if let Some(z) = z_levels.as_mut() {
            z.reverse();
        }
    }
    (coordinates, z_levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Place, PlaceKind, RoutingPoint};

    fn chain() -> NetworkMap {
        let mut a = Link::new("a", vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)])
            .with_property("name", "A-Weg");
        a.turn_restriction.start = vec!["x".into()];
        a.turn_restriction.end = vec!["b".into()];
        // b ist entgegen der Laufrichtung gespeichert
        let mut b = Link::new(
            "b",
            vec![
                DVec2::new(30.0, 0.0),
                DVec2::new(20.0, 0.0),
                DVec2::new(10.0, 0.0),
            ],
        );
        b.z_levels = Some(vec![2, 1, 0]);
        b.turn_restriction.start = vec!["y".into()];
        let mut x = Link::new("x", vec![DVec2::new(0.0, 0.0), DVec2::new(0.0, -10.0)]);
        x.turn_restriction.start = vec!["a".into()];
        let y = Link::new("y", vec![DVec2::new(30.0, 0.0), DVec2::new(30.0, 10.0)]);
        let mut poi = Place::new("poi", PlaceKind::Poi, DVec2::new(25.0, 2.0));
        poi.routing = RoutingPoint::attached("b".into(), DVec2::new(25.0, 0.0));
        NetworkMap::from_features([
            Feature::Link(a),
            Feature::Link(b),
            Feature::Link(x),
            Feature::Link(y),
            Feature::Place(poi),
        ])
        .unwrap()
    }

    #[test]
    fn candidates_require_exclusive_endpoint() {
        let map = chain();
        let candidates = merge_candidates(&map, &"a".into(), &Tolerances::default()).unwrap();
        let others: Vec<&str> = candidates.iter().map(|c| c.other.as_str()).collect();
        assert_eq!(others, vec!["x", "b"]);

        let mut blocked = chain();
        blocked
            .add_feature(Feature::Link(Link::new(
                "c",
                vec![DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)],
            )))
            .unwrap();
        let candidates = merge_candidates(&blocked, &"a".into(), &Tolerances::default()).unwrap();
        assert!(candidates.iter().all(|c| c.other != FeatureId::from("b")));
    }

    #[test]
    fn merge_orients_geometry_and_rewires_dependents() {
        let mut map = chain();
        let mut ids = IdAllocator::default();
        let mut tx = Transaction::new(&mut map);
        let merged = merge_links(&mut tx, &"a".into(), &"b".into(), &mut ids, &Tolerances::default())
            .unwrap()
            .expect("zusammenführbar");
        tx.commit("merge");

        let link = map.link(&merged).unwrap();
        assert_eq!(
            link.coordinates,
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(10.0, 0.0),
                DVec2::new(20.0, 0.0),
                DVec2::new(30.0, 0.0)
            ]
        );
        assert_eq!(link.z_levels, Some(vec![0, 0, 1, 2]));
        assert_eq!(link.turn_restriction.start, vec![FeatureId::from("x")]);
        assert_eq!(link.turn_restriction.end, vec![FeatureId::from("y")]);
        assert_eq!(link.parent_link, Some(FeatureId::from("a")));
        assert_eq!(link.properties["name"], "A-Weg");

        let x = map.link(&"x".into()).unwrap();
        assert_eq!(x.turn_restriction.start, vec![merged.clone()]);
        let poi = map.place(&"poi".into()).unwrap();
        assert_eq!(poi.routing.routing_link, Some(merged));
    }

    #[test]
    fn unrelated_links_are_not_merged() {
        let mut map = chain();
        let mut ids = IdAllocator::default();
        let mut tx = Transaction::new(&mut map);
        let merged = merge_links(&mut tx, &"x".into(), &"y".into(), &mut ids, &Tolerances::default())
            .unwrap();
        assert!(merged.is_none());
        assert!(tx.commit("merge").is_none());
    }
}
