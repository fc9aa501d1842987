//! Die zentrale NetworkMap-Datenstruktur mit Links, Places, Flächen und Spatial-Index.
//!
//! Konnektivität wird nie gespeichert, sondern immer aus der Lage der
//! Vertices abgeleitet (`connections_of`).

use super::error::{EditError, EditResult};
use super::geometry::{project_onto_polyline, PolylineProjection};
use super::{
    Area, Feature, FeatureId, Geometry, Link, Place, Properties, RoutingPoint, ShapePoint,
    SpatialIndex, TurnRestriction, VertexMatch,
};
use glam::DVec2;
use std::collections::HashMap;

/// Nächster Link zu einem Punkt samt Projektion.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkProjection {
    /// Gefundener Link
    pub link: FeatureId,
    /// Projektion auf die Link-Geometrie
    pub projection: PolylineProjection,
}

/// Arbeitskopie des gesamten Netzwerks.
#[derive(Debug, Clone)]
pub struct NetworkMap {
    links: HashMap<FeatureId, Link>,
    places: HashMap<FeatureId, Place>,
    areas: HashMap<FeatureId, Area>,
    /// Persistenter Spatial-Index fuer schnelle Vertex-Abfragen
    spatial_index: SpatialIndex,
}

impl Default for NetworkMap {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkMap {
    /// Erstellt eine neue leere NetworkMap
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            places: HashMap::new(),
            areas: HashMap::new(),
            spatial_index: SpatialIndex::empty(),
        }
    }

    /// Baut eine NetworkMap aus einer Feature-Liste (ohne History).
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> EditResult<Self> {
        let mut map = Self::new();
        for feature in features {
            map.insert_unindexed(feature)?;
        }
        map.rebuild_spatial_index();
        Ok(map)
    }

    // ── Features ────────────────────────────────────────────────────

    /// Fügt ein Feature hinzu (validiert Link-Invarianten).
    pub fn add_feature(&mut self, feature: Feature) -> EditResult<()> {
        self.insert_unindexed(feature)?;
        self.rebuild_spatial_index();
        Ok(())
    }

    fn insert_unindexed(&mut self, feature: Feature) -> EditResult<()> {
        if self.contains(feature.id()) {
            return Err(EditError::DuplicateFeature(feature.id().clone()));
        }
        match feature {
            Feature::Link(link) => {
                validate_link_geometry(&link.id, &link.coordinates, link.z_levels.as_deref())?;
                self.links.insert(link.id.clone(), link);
            }
            Feature::Place(place) => {
                self.places.insert(place.id.clone(), place);
            }
            Feature::Area(area) => {
                self.areas.insert(area.id.clone(), area);
            }
        }
        Ok(())
    }

    /// Entfernt ein Feature und gibt es zurück.
    pub fn remove_feature(&mut self, id: &FeatureId) -> Option<Feature> {
        let removed = if let Some(link) = self.links.remove(id) {
            Some(Feature::Link(link))
        } else if let Some(place) = self.places.remove(id) {
            Some(Feature::Place(place))
        } else {
            self.areas.remove(id).map(Feature::Area)
        };
        if matches!(removed, Some(Feature::Link(_)) | Some(Feature::Place(_))) {
            self.rebuild_spatial_index();
        }
        removed
    }

    /// Prüft ob ein Feature existiert.
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.links.contains_key(id) || self.places.contains_key(id) || self.areas.contains_key(id)
    }

    /// Liefert eine Kopie des Features.
    pub fn feature(&self, id: &FeatureId) -> Option<Feature> {
        if let Some(link) = self.links.get(id) {
            return Some(Feature::Link(link.clone()));
        }
        if let Some(place) = self.places.get(id) {
            return Some(Feature::Place(place.clone()));
        }
        self.areas.get(id).map(|a| Feature::Area(a.clone()))
    }

    /// Alle Features, sortiert nach ID.
    pub fn features(&self) -> Vec<Feature> {
        let mut features: Vec<Feature> = self
            .links
            .values()
            .cloned()
            .map(Feature::Link)
            .chain(self.places.values().cloned().map(Feature::Place))
            .chain(self.areas.values().cloned().map(Feature::Area))
            .collect();
        features.sort_by(|a, b| a.id().cmp(b.id()));
        features
    }

    /// Link nach ID.
    pub fn link(&self, id: &FeatureId) -> Option<&Link> {
        self.links.get(id)
    }

    /// Link nach ID, Fehler falls nicht vorhanden oder kein Link.
    pub fn require_link(&self, id: &FeatureId) -> EditResult<&Link> {
        match self.links.get(id) {
            Some(link) => Ok(link),
            None if self.contains(id) => Err(EditError::NotALink(id.clone())),
            None => Err(EditError::UnknownFeature(id.clone())),
        }
    }

    fn require_link_mut(&mut self, id: &FeatureId) -> EditResult<&mut Link> {
        if !self.links.contains_key(id) {
            return Err(if self.contains(id) {
                EditError::NotALink(id.clone())
            } else {
                EditError::UnknownFeature(id.clone())
            });
        }
        self.links
            .get_mut(id)
            .ok_or_else(|| EditError::UnknownFeature(id.clone()))
    }

    /// Place nach ID.
    pub fn place(&self, id: &FeatureId) -> Option<&Place> {
        self.places.get(id)
    }

    /// Fläche nach ID.
    pub fn area(&self, id: &FeatureId) -> Option<&Area> {
        self.areas.get(id)
    }

    /// Iterator über alle Links (read-only).
    pub fn links_iter(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Iterator über alle Places (read-only).
    pub fn places_iter(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    /// Iterator über alle Flächen (read-only).
    pub fn areas_iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    /// Gibt die Anzahl der Links zurück
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Gibt die Anzahl der Places zurück
    pub fn place_count(&self) -> usize {
        self.places.len()
    }

    /// Gibt die Anzahl aller Features zurück
    pub fn feature_count(&self) -> usize {
        self.links.len() + self.places.len() + self.areas.len()
    }

    // ── Geometrie ───────────────────────────────────────────────────

    /// Vertex-Folge eines Links.
    pub fn coordinates(&self, link: &FeatureId) -> EditResult<&[DVec2]> {
        Ok(&self.require_link(link)?.coordinates)
    }

    /// Ersetzt die komplette Vertex-Folge eines Links und gibt die alte zurück.
    ///
    /// Vorhandene Z-Level müssen zur neuen Länge passen.
    pub fn set_coordinates(
        &mut self,
        link: &FeatureId,
        coordinates: Vec<DVec2>,
    ) -> EditResult<Vec<DVec2>> {
        let current = self.require_link(link)?;
        validate_link_geometry(link, &coordinates, current.z_levels.as_deref())?;
        let old = std::mem::replace(&mut self.require_link_mut(link)?.coordinates, coordinates);
        self.rebuild_spatial_index();
        Ok(old)
    }

    /// Fügt einen Vertex an `index` ein (`0..=len`).
    ///
    /// Eine Koinzidenz mit fremden Vertices erzeugt hier keine Verbindung.
    pub fn insert_vertex(&mut self, link: &FeatureId, index: usize, vertex: DVec2) -> EditResult<()> {
        let current = self.require_link(link)?;
        let len = current.len();
        if index > len {
            return Err(EditError::InvalidIndex {
                link: link.clone(),
                index,
                len,
            });
        }
        let mut coordinates = current.coordinates.clone();
        coordinates.insert(index, vertex);
        let z_levels = current.z_levels.clone().map(|mut z| {
            let neighbor = z.get(index.min(len.saturating_sub(1))).copied().unwrap_or(0);
            z.insert(index, neighbor);
            z
        });
        validate_link_geometry(link, &coordinates, z_levels.as_deref())?;

        let entry = self.require_link_mut(link)?;
        entry.coordinates = coordinates;
        entry.z_levels = z_levels;
        self.rebuild_spatial_index();
        Ok(())
    }

    /// Entfernt den Vertex an `index` (`0..len`) und gibt ihn zurück.
    pub fn remove_vertex(&mut self, link: &FeatureId, index: usize) -> EditResult<DVec2> {
        let current = self.require_link(link)?;
        let len = current.len();
        if index >= len {
            return Err(EditError::InvalidIndex {
                link: link.clone(),
                index,
                len,
            });
        }
        if len <= 2 {
            return Err(EditError::MinimumVertexCount { link: link.clone() });
        }
        let mut coordinates = current.coordinates.clone();
        let removed = coordinates.remove(index);
        let z_levels = current.z_levels.clone().map(|mut z| {
            z.remove(index);
            z
        });
        validate_link_geometry(link, &coordinates, z_levels.as_deref())?;

        let entry = self.require_link_mut(link)?;
        entry.coordinates = coordinates;
        entry.z_levels = z_levels;
        self.rebuild_spatial_index();
        Ok(removed)
    }

    /// Setzt die Z-Level eines Links (`None` entfernt sie).
    pub fn set_z_levels(
        &mut self,
        link: &FeatureId,
        z_levels: Option<Vec<i32>>,
    ) -> EditResult<Option<Vec<i32>>> {
        let current = self.require_link(link)?;
        if let Some(z) = &z_levels {
            if z.len() != current.len() {
                return Err(EditError::ZLevelLengthMismatch {
                    link: link.clone(),
                    expected: current.len(),
                    actual: z.len(),
                });
            }
        }
        Ok(std::mem::replace(
            &mut self.require_link_mut(link)?.z_levels,
            z_levels,
        ))
    }

    /// Position eines Shape-Points.
    pub fn vertex(&self, shape_point: &ShapePoint) -> EditResult<DVec2> {
        let link = self.require_link(&shape_point.link)?;
        link.coordinates
            .get(shape_point.index)
            .copied()
            .ok_or_else(|| EditError::InvalidIndex {
                link: shape_point.link.clone(),
                index: shape_point.index,
                len: link.len(),
            })
    }

    /// Verschiebt einen einzelnen Shape-Point.
    pub fn set_vertex(&mut self, shape_point: &ShapePoint, position: DVec2) -> EditResult<DVec2> {
        let old = self.vertex(shape_point)?;
        let mut coordinates = self.coordinates(&shape_point.link)?.to_vec();
        coordinates[shape_point.index] = position;
        self.set_coordinates(&shape_point.link, coordinates)?;
        Ok(old)
    }

    /// Ersetzt die Geometrie eines beliebigen Features und gibt die alte zurück.
    pub fn set_geometry(&mut self, id: &FeatureId, geometry: Geometry) -> EditResult<Geometry> {
        if self.links.contains_key(id) {
            let Geometry::LineString {
                coordinates,
                z_levels,
            } = geometry
            else {
                return Err(EditError::NotALink(id.clone()));
            };
            validate_link_geometry(id, &coordinates, z_levels.as_deref())?;
            let link = self.require_link_mut(id)?;
            let old = Geometry::LineString {
                coordinates: std::mem::replace(&mut link.coordinates, coordinates),
                z_levels: std::mem::replace(&mut link.z_levels, z_levels),
            };
            self.rebuild_spatial_index();
            return Ok(old);
        }
        if let Some(place) = self.places.get_mut(id) {
            let Geometry::Point(position) = geometry else {
                return Err(EditError::UnknownFeature(id.clone()));
            };
            let old = Geometry::Point(std::mem::replace(&mut place.position, position));
            self.rebuild_spatial_index();
            return Ok(old);
        }
        if let Some(area) = self.areas.get_mut(id) {
            let Geometry::Polygon(rings) = geometry else {
                return Err(EditError::UnknownFeature(id.clone()));
            };
            return Ok(Geometry::Polygon(std::mem::replace(&mut area.rings, rings)));
        }
        Err(EditError::UnknownFeature(id.clone()))
    }

    // ── Attribute ───────────────────────────────────────────────────

    /// Setzt oder entfernt ein freies Attribut und gibt den alten Wert zurück.
    pub fn set_attribute(
        &mut self,
        id: &FeatureId,
        key: &str,
        value: Option<serde_json::Value>,
    ) -> EditResult<Option<serde_json::Value>> {
        let properties = self.properties_mut(id)?;
        Ok(match value {
            Some(value) => properties.insert(key.to_string(), value),
            None => properties.remove(key),
        })
    }

    fn properties_mut(&mut self, id: &FeatureId) -> EditResult<&mut Properties> {
        if let Some(link) = self.links.get_mut(id) {
            return Ok(&mut link.properties);
        }
        if let Some(place) = self.places.get_mut(id) {
            return Ok(&mut place.properties);
        }
        if let Some(area) = self.areas.get_mut(id) {
            return Ok(&mut area.properties);
        }
        Err(EditError::UnknownFeature(id.clone()))
    }

    /// Setzt die Routing-Anbindung eines Places.
    pub fn set_routing(&mut self, id: &FeatureId, routing: RoutingPoint) -> EditResult<RoutingPoint> {
        let place = self
            .places
            .get_mut(id)
            .ok_or_else(|| EditError::UnknownFeature(id.clone()))?;
        Ok(std::mem::replace(&mut place.routing, routing))
    }

    /// Setzt die Abbiegeverbote eines Links.
    pub fn set_turn_restriction(
        &mut self,
        id: &FeatureId,
        restriction: TurnRestriction,
    ) -> EditResult<TurnRestriction> {
        Ok(std::mem::replace(
            &mut self.require_link_mut(id)?.turn_restriction,
            restriction,
        ))
    }

    /// Setzt das Editierbar-Flag eines Links.
    pub fn set_editable(&mut self, id: &FeatureId, editable: bool) -> EditResult<bool> {
        Ok(std::mem::replace(
            &mut self.require_link_mut(id)?.editable,
            editable,
        ))
    }

    /// Setzt die Provenienz (origin/parent) eines Links.
    pub fn set_provenance(
        &mut self,
        id: &FeatureId,
        origin: Option<FeatureId>,
        parent: Option<FeatureId>,
    ) -> EditResult<(Option<FeatureId>, Option<FeatureId>)> {
        let link = self.require_link_mut(id)?;
        let old_origin = std::mem::replace(&mut link.origin_link, origin);
        let old_parent = std::mem::replace(&mut link.parent_link, parent);
        Ok((old_origin, old_parent))
    }

    // ── Abgeleitete Konnektivität ───────────────────────────────────

    /// Alle Shape-Points fremder Links, deren Vertex mit `shape_point` zusammenfällt.
    pub fn connections_of(&self, shape_point: &ShapePoint, epsilon: f64) -> Vec<ShapePoint> {
        let Ok(position) = self.vertex(shape_point) else {
            return Vec::new();
        };
        self.shape_points_at(position, epsilon)
            .into_iter()
            .filter(|sp| sp.link != shape_point.link)
            .collect()
    }

    /// IDs aller Links, die an `shape_point` angeschlossen sind.
    pub fn connected_links(&self, shape_point: &ShapePoint, epsilon: f64) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .connections_of(shape_point, epsilon)
            .into_iter()
            .map(|sp| sp.link)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Alle Shape-Points, deren Vertex innerhalb `epsilon` um `position` liegt.
    pub fn shape_points_at(&self, position: DVec2, epsilon: f64) -> Vec<ShapePoint> {
        self.spatial_index
            .vertices_within_radius(position, epsilon)
            .into_iter()
            .map(|m| m.shape_point)
            .collect()
    }

    /// Alle Link-Vertices innerhalb eines Radius, sortiert nach Distanz.
    pub fn vertices_within_radius(&self, position: DVec2, radius: f64) -> Vec<VertexMatch> {
        self.spatial_index.vertices_within_radius(position, radius)
    }

    /// Nächster Link innerhalb `radius`, der den Filter erfüllt.
    ///
    /// Gleichstand wird über die aufsteigende Link-ID aufgelöst.
    pub fn nearest_link(
        &self,
        position: DVec2,
        radius: f64,
        filter: impl Fn(&Link) -> bool,
    ) -> Option<LinkProjection> {
        let mut best: Option<LinkProjection> = None;
        for id in self.spatial_index.links_near_point(position, radius) {
            let Some(link) = self.links.get(&id) else {
                continue;
            };
            if !filter(link) {
                continue;
            }
            let Some(projection) = project_onto_polyline(position, &link.coordinates) else {
                continue;
            };
            if projection.distance > radius {
                continue;
            }
            let better = best.as_ref().map_or(true, |b| {
                projection.distance < b.projection.distance
                    || (projection.distance == b.projection.distance && id < b.link)
            });
            if better {
                best = Some(LinkProjection {
                    link: id,
                    projection,
                });
            }
        }
        best
    }

    /// Links, deren Begrenzungsrechteck (plus `margin`) das Rechteck schneidet.
    pub fn links_in_rect(&self, min: DVec2, max: DVec2, margin: f64) -> Vec<FeatureId> {
        self.spatial_index.links_intersecting_rect(min, max, margin)
    }

    /// Places innerhalb eines Radius, sortiert nach Distanz.
    pub fn places_within_radius(&self, position: DVec2, radius: f64) -> Vec<FeatureId> {
        self.spatial_index
            .places_within_radius(position, radius)
            .into_iter()
            .map(|m| m.place_id)
            .collect()
    }

    /// Places, deren Routing-Link `link` ist (sortiert nach ID).
    pub fn places_routed_to(&self, link: &FeatureId) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .places
            .values()
            .filter(|p| p.routing.routing_link.as_ref() == Some(link))
            .map(|p| p.id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Links, deren Abbiegeverbote `link` referenzieren (sortiert nach ID).
    pub fn links_restricting(&self, link: &FeatureId) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .links
            .values()
            .filter(|l| l.turn_restriction.references(link))
            .map(|l| l.id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    // ── IDs & Index ─────────────────────────────────────────────────

    /// Schreibt IDs und alle Referenzen (Routing, Abbiegeverbote, Provenienz) um.
    pub fn remap_ids(&mut self, mapping: &HashMap<FeatureId, FeatureId>) {
        if mapping.is_empty() {
            return;
        }
        let lookup = |id: &FeatureId| mapping.get(id).cloned();

        let links: Vec<Link> = self.links.drain().map(|(_, l)| l).collect();
        for mut link in links {
            if let Some(new_id) = lookup(&link.id) {
                link.id = new_id;
            }
            link.turn_restriction.remap(lookup);
            if let Some(origin) = link.origin_link.as_ref().and_then(lookup) {
                link.origin_link = Some(origin);
            }
            if let Some(parent) = link.parent_link.as_ref().and_then(lookup) {
                link.parent_link = Some(parent);
            }
            self.links.insert(link.id.clone(), link);
        }

        let places: Vec<Place> = self.places.drain().map(|(_, p)| p).collect();
        for mut place in places {
            if let Some(new_id) = lookup(&place.id) {
                place.id = new_id;
            }
            if let Some(link) = place.routing.routing_link.as_ref().and_then(lookup) {
                place.routing.routing_link = Some(link);
            }
            self.places.insert(place.id.clone(), place);
        }

        let areas: Vec<Area> = self.areas.drain().map(|(_, a)| a).collect();
        for mut area in areas {
            if let Some(new_id) = lookup(&area.id) {
                area.id = new_id;
            }
            self.areas.insert(area.id.clone(), area);
        }

        self.rebuild_spatial_index();
    }

    /// Read-only Zugriff auf den Spatial-Index.
    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial_index
    }

    /// Baut den persistenten Spatial-Index aus den aktuellen Features neu auf.
    pub fn rebuild_spatial_index(&mut self) {
        self.spatial_index = SpatialIndex::build(&self.links, &self.places);
    }
}

/// Prüft Mindestlänge, Z-Level-Länge und doppelte Nachbar-Vertices.
pub fn validate_link_geometry(
    link: &FeatureId,
    coordinates: &[DVec2],
    z_levels: Option<&[i32]>,
) -> EditResult<()> {
    if coordinates.len() < 2 {
        return Err(EditError::MinimumVertexCount { link: link.clone() });
    }
    if let Some(z) = z_levels {
        if z.len() != coordinates.len() {
            return Err(EditError::ZLevelLengthMismatch {
                link: link.clone(),
                expected: coordinates.len(),
                actual: z.len(),
            });
        }
    }
    if let Some(index) = coordinates.windows(2).position(|w| w[0] == w[1]) {
        return Err(EditError::DuplicateConsecutiveVertex {
            link: link.clone(),
            index: index + 1,
        });
    }
    Ok(())
}
