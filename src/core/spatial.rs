//! Spatial-Index (KD-Tree) über Link-Vertices, Place-Positionen und Link-Bounds.

use std::collections::HashMap;

use glam::DVec2;
use kiddo::{KdTree, SquaredEuclidean};

use super::geometry::bounds_of;
use super::{FeatureId, Link, Place, ShapePoint};

/// Treffer einer Vertex-Abfrage.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexMatch {
    /// Gefundener Shape-Point
    pub shape_point: ShapePoint,
    /// Position des Vertex
    pub position: DVec2,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

/// Treffer einer Place-Abfrage.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    /// ID des Places
    pub place_id: FeatureId,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct LinkBounds {
    id: FeatureId,
    min: DVec2,
    max: DVec2,
}

/// Read-only Spatial-Index über alle Links und Places einer NetworkMap.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    vertex_tree: KdTree<f64, 2>,
    shape_points: Vec<ShapePoint>,
    vertex_positions: Vec<DVec2>,
    place_tree: KdTree<f64, 2>,
    place_ids: Vec<FeatureId>,
    link_bounds: Vec<LinkBounds>,
}

impl SpatialIndex {
    /// Erstellt einen leeren Spatial-Index.
    pub fn empty() -> Self {
        Self {
            vertex_tree: (&Vec::<[f64; 2]>::new()).into(),
            shape_points: Vec::new(),
            vertex_positions: Vec::new(),
            place_tree: (&Vec::<[f64; 2]>::new()).into(),
            place_ids: Vec::new(),
            link_bounds: Vec::new(),
        }
    }

    /// Baut einen neuen Index aus Links und Places.
    pub fn build(links: &HashMap<FeatureId, Link>, places: &HashMap<FeatureId, Place>) -> Self {
        let mut link_ids: Vec<&FeatureId> = links.keys().collect();
        link_ids.sort_unstable();

        let mut shape_points = Vec::new();
        let mut vertex_positions = Vec::new();
        let mut link_bounds = Vec::with_capacity(link_ids.len());
        for id in link_ids {
            let link = &links[id];
            for (index, pos) in link.coordinates.iter().enumerate() {
                shape_points.push(ShapePoint::new(id.clone(), index));
                vertex_positions.push(*pos);
            }
            if let Some((min, max)) = bounds_of(&link.coordinates) {
                link_bounds.push(LinkBounds {
                    id: id.clone(),
                    min,
                    max,
                });
            }
        }
        let entries: Vec<[f64; 2]> = vertex_positions.iter().map(|p| [p.x, p.y]).collect();
        let vertex_tree: KdTree<f64, 2> = (&entries).into();

        let mut place_ids: Vec<FeatureId> = places.keys().cloned().collect();
        place_ids.sort_unstable();
        let place_entries: Vec<[f64; 2]> = place_ids
            .iter()
            .map(|id| {
                let p = places[id].position;
                [p.x, p.y]
            })
            .collect();
        let place_tree: KdTree<f64, 2> = (&place_entries).into();

        Self {
            vertex_tree,
            shape_points,
            vertex_positions,
            place_tree,
            place_ids,
            link_bounds,
        }
    }

    /// Anzahl indexierter Link-Vertices.
    pub fn vertex_count(&self) -> usize {
        self.shape_points.len()
    }

    /// Gibt `true` zurück, wenn weder Vertices noch Places indexiert sind.
    pub fn is_empty(&self) -> bool {
        self.shape_points.is_empty() && self.place_ids.is_empty()
    }

    /// Findet den nächsten Link-Vertex zur Weltposition.
    pub fn nearest_vertex(&self, query: DVec2) -> Option<VertexMatch> {
        if self.shape_points.is_empty() {
            return None;
        }
        let result = self
            .vertex_tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y]);
        self.vertex_match(result.item as usize, result.distance)
    }

    /// Findet alle Link-Vertices innerhalb eines Radius, sortiert nach Distanz.
    pub fn vertices_within_radius(&self, query: DVec2, radius: f64) -> Vec<VertexMatch> {
        if self.shape_points.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .vertex_tree
            .within::<SquaredEuclidean>(&[query.x, query.y], radius * radius)
            .into_iter()
            .filter_map(|entry| self.vertex_match(entry.item as usize, entry.distance))
            .collect::<Vec<_>>();

        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.shape_point.cmp(&b.shape_point))
        });
        results
    }

    fn vertex_match(&self, slot: usize, distance_sq: f64) -> Option<VertexMatch> {
        Some(VertexMatch {
            shape_point: self.shape_points.get(slot)?.clone(),
            position: *self.vertex_positions.get(slot)?,
            distance: distance_sq.sqrt(),
        })
    }

    /// Findet alle Places innerhalb eines Radius, sortiert nach Distanz.
    pub fn places_within_radius(&self, query: DVec2, radius: f64) -> Vec<PlaceMatch> {
        if self.place_ids.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .place_tree
            .within::<SquaredEuclidean>(&[query.x, query.y], radius * radius)
            .into_iter()
            .filter_map(|entry| {
                Some(PlaceMatch {
                    place_id: self.place_ids.get(entry.item as usize)?.clone(),
                    distance: entry.distance.sqrt(),
                })
            })
            .collect::<Vec<_>>();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }

    /// Liefert alle Links, deren (um `margin` erweitertes) Begrenzungsrechteck
    /// das Rechteck `min`–`max` schneidet. Sortiert nach ID.
    pub fn links_intersecting_rect(&self, min: DVec2, max: DVec2, margin: f64) -> Vec<FeatureId> {
        let margin = DVec2::splat(margin.max(0.0));
        self.link_bounds
            .iter()
            .filter(|b| {
                let bmin = b.min - margin;
                let bmax = b.max + margin;
                bmin.x <= max.x && bmax.x >= min.x && bmin.y <= max.y && bmax.y >= min.y
            })
            .map(|b| b.id.clone())
            .collect()
    }

    /// Liefert alle Links, die einem Punkt bis auf `radius` nahe kommen können.
    pub fn links_near_point(&self, query: DVec2, radius: f64) -> Vec<FeatureId> {
        self.links_intersecting_rect(query, query, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaceKind;

    fn sample() -> SpatialIndex {
        let mut links = HashMap::new();
        links.insert(
            FeatureId::from("a"),
            Link::new("a", vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)]),
        );
        links.insert(
            FeatureId::from("b"),
            Link::new("b", vec![DVec2::new(0.0, 0.0), DVec2::new(4.0, 3.0)]),
        );
        let mut places = HashMap::new();
        places.insert(
            FeatureId::from("p"),
            Place::new("p", PlaceKind::Poi, DVec2::new(5.0, 1.0)),
        );
        SpatialIndex::build(&links, &places)
    }

    #[test]
    fn radius_query_returns_coincident_vertices_sorted() {
        let index = sample();
        let matches = index.vertices_within_radius(DVec2::ZERO, 0.5);
        let points: Vec<ShapePoint> = matches.into_iter().map(|m| m.shape_point).collect();
        assert_eq!(points, vec![ShapePoint::new("a", 0), ShapePoint::new("b", 0)]);
    }

    #[test]
    fn nearest_vertex_returns_expected_shape_point() {
        let index = sample();
        let nearest = index
            .nearest_vertex(DVec2::new(3.9, 2.9))
            .expect("Treffer erwartet");
        assert_eq!(nearest.shape_point, ShapePoint::new("b", 1));
        assert!(nearest.distance < 0.2);
    }

    #[test]
    fn place_query_finds_place() {
        let index = sample();
        let matches = index.places_within_radius(DVec2::new(5.0, 0.0), 2.0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].place_id, FeatureId::from("p"));
    }

    #[test]
    fn bounds_query_respects_margin() {
        let index = sample();
        assert_eq!(
            index.links_near_point(DVec2::new(8.0, 2.0), 0.5),
            Vec::<FeatureId>::new()
        );
        assert_eq!(
            index.links_near_point(DVec2::new(8.0, 2.0), 2.5),
            vec![FeatureId::from("a")]
        );
    }

    #[test]
    fn empty_index_has_no_entries() {
        let index = SpatialIndex::empty();
        assert!(index.is_empty());
        assert_eq!(index.vertex_count(), 0);
        assert!(index.nearest_vertex(DVec2::ZERO).is_none());
    }
}
