//! Kreuzungserkennung: noch nicht verbundene Beinahe-Schnitte eines Links
//! mit fremden Links.
//!
//! Kandidaten werden nicht automatisch angewendet. `Crossing::connect`
//! berechnet Ziel und Position erst beim Aufruf aus der aktuellen Geometrie,
//! sodass mehrere Kreuzungen einer Abfrage unabhängig voneinander bleiben.

use super::{connect_shape_points, ensure_editable, split_link, IdAllocator, Tolerances};
use crate::core::error::EditResult;
use crate::core::geometry::{distance_to_polyline, project_onto_polyline, segment_intersection};
use crate::core::{FeatureId, NetworkMap, ShapePoint, Transaction};
use glam::DVec2;

/// Parameter-Toleranz, unterhalb der ein Schnitt als Segment-Endpunkt gilt.
const SEGMENT_END_EPSILON: f64 = 1e-9;

/// Woher eine Kreuzung stammt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrossingKind {
    /// Vertex `index` des geprüften Links liegt nahe an fremder Geometrie
    Vertex {
        /// Vertex-Index im geprüften Link
        index: usize,
    },
    /// Segment `segment_index` des geprüften Links schneidet fremde Geometrie
    Segment {
        /// Segment-Index im geprüften Link
        segment_index: usize,
    },
}

/// Kandidat für eine Verbindung zwischen zwei Links.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    /// Geprüfter Link
    pub link: FeatureId,
    /// Art des Kandidaten
    pub kind: CrossingKind,
    /// Distanz in Pixeln (0 = exakt auf der fremden Geometrie)
    pub distance: f64,
    /// Verbindungspunkt auf dem Kandidaten-Link
    pub position: DVec2,
    /// Fremder Link
    pub candidate_link: FeatureId,
    /// Segment des Kandidaten-Links
    pub candidate_segment_index: usize,
    anchor: DVec2,
}

impl Crossing {
    /// X-Koordinate des Verbindungspunkts.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Y-Koordinate des Verbindungspunkts.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Verbindet den geprüften Link mit dem Kandidaten.
    ///
    /// Liegt der Verbindungspunkt im Inneren des Kandidaten, wird dort ein
    /// Vertex eingefügt und der Kandidat geteilt. Wurden Links seit der
    /// Abfrage geteilt, wird der Nachfolger über die Provenienz gefunden.
    /// Gibt den verbundenen Shape-Point des geprüften Links zurück, oder
    /// `None`, wenn die Kreuzung nicht mehr existiert.
    pub fn connect(
        &self,
        tx: &mut Transaction<'_>,
        ids: &mut IdAllocator,
        tolerances: &Tolerances,
    ) -> EditResult<Option<ShapePoint>> {
        let Some(source) = resolve_link(tx.map(), &self.link, self.anchor, None) else {
            log::debug!("Link {} existiert nicht mehr", self.link);
            return Ok(None);
        };
        let Some(target) =
            resolve_link(tx.map(), &self.candidate_link, self.position, Some(&source))
        else {
            log::debug!("Kandidat {} existiert nicht mehr", self.candidate_link);
            return Ok(None);
        };
        ensure_editable(tx.map(), &source)?;
        ensure_editable(tx.map(), &target)?;

        match self.kind {
            CrossingKind::Vertex { .. } => {
                let index = nearest_vertex_index(&tx.map().require_link(&source)?.coordinates, self.anchor);
                let shape_point = ShapePoint::new(source.clone(), index);
                let vertex = tx.map().vertex(&shape_point)?;
                let Some(projection) =
                    project_onto_polyline(vertex, &tx.map().require_link(&target)?.coordinates)
                else {
                    return Ok(None);
                };
                let target_point = attach_point(tx, &target, projection.point, ids, tolerances)?;
                connect_shape_points(tx, &shape_point, &target_point, tolerances)?;
                Ok(Some(shape_point))
            }
            CrossingKind::Segment { .. } => {
                let Some((point, segment_index)) =
                    nearest_intersection(tx.map(), &source, &target, self.anchor)
                else {
                    return Ok(None);
                };
                let target_point = attach_point(tx, &target, point, ids, tolerances)?;
                let point = tx.map().vertex(&target_point)?;
                let existing = tx
                    .map()
                    .require_link(&source)?
                    .coordinates
                    .iter()
                    .position(|c| c.distance(point) <= tolerances.epsilon);
                let index = match existing {
                    Some(index) => index,
                    None => {
                        tx.insert_vertex(&source, segment_index + 1, point)?;
                        segment_index + 1
                    }
                };
                Ok(Some(ShapePoint::new(source, index)))
            }
        }
    }
}

/// Liefert alle Kreuzungskandidaten eines Links, sortiert nach Distanz
/// (in Pixeln) und bei Gleichstand nach Kandidaten-ID.
///
/// Bereits koinzidente Vertices gelten als verbunden und werden übersprungen.
pub fn check_crossings(
    map: &NetworkMap,
    link_id: &FeatureId,
    tolerances: &Tolerances,
) -> EditResult<Vec<Crossing>> {
    let link = map.require_link(link_id)?;
    let radius = tolerances.crossing;
    let epsilon = tolerances.epsilon;
    let mut crossings = Vec::new();

    for (index, &vertex) in link.coordinates.iter().enumerate() {
        for candidate_id in map.spatial_index().links_near_point(vertex, radius) {
            if &candidate_id == link_id {
                continue;
            }
            let Some(candidate) = map.link(&candidate_id) else {
                continue;
            };
            if candidate
                .coordinates
                .iter()
                .any(|c| c.distance(vertex) <= epsilon)
            {
                continue;
            }
            let Some(projection) = project_onto_polyline(vertex, &candidate.coordinates) else {
                continue;
            };
            if projection.distance > radius {
                continue;
            }
            // Nächster Punkt ist bereits ein gemeinsamer Vertex
            if link
                .coordinates
                .iter()
                .any(|c| c.distance(projection.point) <= epsilon)
            {
                continue;
            }
            crossings.push(Crossing {
                link: link_id.clone(),
                kind: CrossingKind::Vertex { index },
                distance: tolerances.to_px(projection.distance),
                position: projection.point,
                candidate_link: candidate_id.clone(),
                candidate_segment_index: projection.segment_index,
                anchor: vertex,
            });
        }
    }

    for (segment_index, a1, a2) in link.segments() {
        for candidate_id in map.links_in_rect(a1.min(a2), a1.max(a2), 0.0) {
            if &candidate_id == link_id {
                continue;
            }
            let Some(candidate) = map.link(&candidate_id) else {
                continue;
            };
            for (candidate_segment_index, b1, b2) in candidate.segments() {
                let Some((point, t, _)) = segment_intersection(a1, a2, b1, b2) else {
                    continue;
                };
                if t <= SEGMENT_END_EPSILON || t >= 1.0 - SEGMENT_END_EPSILON {
                    continue;
                }
                crossings.push(Crossing {
                    link: link_id.clone(),
                    kind: CrossingKind::Segment { segment_index },
                    distance: 0.0,
                    position: point,
                    candidate_link: candidate_id.clone(),
                    candidate_segment_index,
                    anchor: point,
                });
            }
        }
    }

    crossings.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.candidate_link.cmp(&b.candidate_link))
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.candidate_segment_index.cmp(&b.candidate_segment_index))
    });
    // Schnitte durch einen Kandidaten-Vertex werden von beiden Nachbarsegmenten gemeldet
    crossings.dedup_by(|later, earlier| {
        later.kind == earlier.kind
            && later.candidate_link == earlier.candidate_link
            && later.position.distance(earlier.position) <= epsilon
    });
    Ok(crossings)
}

/// Findet den Link oder seinen Split-Nachfolger, der `near` am nächsten liegt.
fn resolve_link(
    map: &NetworkMap,
    id: &FeatureId,
    near: DVec2,
    exclude: Option<&FeatureId>,
) -> Option<FeatureId> {
    if map.link(id).is_some() {
        return (Some(id) != exclude).then(|| id.clone());
    }
    map.links_iter()
        .filter(|l| Some(&l.id) != exclude)
        .filter(|l| l.parent_link.as_ref() == Some(id) || l.origin_link.as_ref() == Some(id))
        .map(|l| (distance_to_polyline(near, &l.coordinates), &l.id))
        .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, id)| id.clone())
}

fn nearest_vertex_index(coordinates: &[DVec2], anchor: DVec2) -> usize {
    coordinates
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.distance(anchor).total_cmp(&b.1.distance(anchor)))
        .map_or(0, |(index, _)| index)
}

/// Schnittpunkt von `source` und `target`, der `anchor` am nächsten liegt,
/// samt Segment-Index in `source`.
fn nearest_intersection(
    map: &NetworkMap,
    source: &FeatureId,
    target: &FeatureId,
    anchor: DVec2,
) -> Option<(DVec2, usize)> {
    let source = map.link(source)?;
    let target = map.link(target)?;
    let mut best: Option<(DVec2, usize)> = None;
    for (segment_index, a1, a2) in source.segments() {
        for (_, b1, b2) in target.segments() {
            let Some((point, _, _)) = segment_intersection(a1, a2, b1, b2) else {
                continue;
            };
            if best.map_or(true, |(p, _)| point.distance(anchor) < p.distance(anchor)) {
                best = Some((point, segment_index));
            }
        }
    }
    best
}

/// Stellt sicher, dass `target` bei `point` einen Vertex hat, und teilt den
/// Link dort, falls der Vertex im Inneren liegt.
fn attach_point(
    tx: &mut Transaction<'_>,
    target: &FeatureId,
    point: DVec2,
    ids: &mut IdAllocator,
    tolerances: &Tolerances,
) -> EditResult<ShapePoint> {
    let link = tx.map().require_link(target)?;
    let existing = link
        .coordinates
        .iter()
        .position(|c| c.distance(point) <= tolerances.epsilon);
    let index = match existing {
        Some(index) => index,
        None => {
            let Some(projection) = project_onto_polyline(point, &link.coordinates) else {
                return Ok(ShapePoint::new(target.clone(), 0));
            };
            let index = projection.segment_index + 1;
            tx.insert_vertex(target, index, projection.point)?;
            index
        }
    };
    let len = tx.map().require_link(target)?.len();
    if index == 0 || index == len - 1 {
        return Ok(ShapePoint::new(target.clone(), index));
    }
    let (first, _) = split_link(tx, &ShapePoint::new(target.clone(), index), ids, tolerances)?;
    let end = tx.map().require_link(&first)?.len() - 1;
    Ok(ShapePoint::new(first, end))
}
