//! Feature-Typen des Netzwerks: Links, Places (POI/Adresse) und Flächen.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Freie Attribute eines Features (Name, Typ, Richtung, …).
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Präfix temporärer Client-IDs (vor dem ersten Submit).
const TEMPORARY_PREFIX: &str = "tmp-";

/// Stabile Feature-ID.
///
/// Vor dem ersten Submit temporär (`tmp-<n>`), danach permanent (vom Provider vergeben).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Erstellt eine permanente ID.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Erstellt eine temporäre Client-ID aus einer fortlaufenden Nummer.
    pub fn temporary(seq: u64) -> Self {
        Self(format!("{TEMPORARY_PREFIX}{seq}"))
    }

    /// Gibt `true` zurück, solange die ID noch nicht vom Provider vergeben wurde.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    /// Rohwert der ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ein einzelner Vertex eines Links, adressiert über (Link, Index).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapePoint {
    /// Link, zu dem der Vertex gehört
    pub link: FeatureId,
    /// Position in der Vertex-Folge
    pub index: usize,
}

impl ShapePoint {
    /// Erstellt einen Shape-Point.
    pub fn new(link: impl Into<FeatureId>, index: usize) -> Self {
        Self {
            link: link.into(),
            index,
        }
    }
}

impl fmt::Display for ShapePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.link, self.index)
    }
}

/// Anfang oder Ende eines Links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkEnd {
    /// Erster Vertex
    Start,
    /// Letzter Vertex
    End,
}

/// Routing-Anbindung eines POI/einer Adresse.
///
/// Invariante: ist `link` gesetzt, liegt `point` auf diesem Link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPoint {
    /// Link, an dem der Place hängt
    pub routing_link: Option<FeatureId>,
    /// Projizierter Punkt auf dem Link
    pub routing_point: Option<DVec2>,
}

impl RoutingPoint {
    /// Routing-Punkt auf einem Link.
    pub fn attached(link: FeatureId, point: DVec2) -> Self {
        Self {
            routing_link: Some(link),
            routing_point: Some(point),
        }
    }

    /// Gibt `true` zurück, wenn ein Link referenziert wird.
    pub fn is_attached(&self) -> bool {
        self.routing_link.is_some()
    }
}

/// Abbiegeverbote an Anfang und Ende eines Links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRestriction {
    /// Am Start-Vertex verbundene Links
    pub start: Vec<FeatureId>,
    /// Am End-Vertex verbundene Links
    pub end: Vec<FeatureId>,
}

impl TurnRestriction {
    /// Liste des jeweiligen Link-Endes.
    pub fn side(&self, end: LinkEnd) -> &[FeatureId] {
        match end {
            LinkEnd::Start => &self.start,
            LinkEnd::End => &self.end,
        }
    }

    fn side_mut(&mut self, end: LinkEnd) -> &mut Vec<FeatureId> {
        match end {
            LinkEnd::Start => &mut self.start,
            LinkEnd::End => &mut self.end,
        }
    }

    /// Gibt `true` zurück, wenn `id` an irgendeinem Ende referenziert wird.
    pub fn references(&self, id: &FeatureId) -> bool {
        self.start.contains(id) || self.end.contains(id)
    }

    /// Ersetzt `old` durch `new` am angegebenen Ende (ohne Duplikate).
    pub fn repoint(&mut self, end: LinkEnd, old: &FeatureId, new: &FeatureId) -> bool {
        let side = self.side_mut(end);
        let Some(pos) = side.iter().position(|id| id == old) else {
            return false;
        };
        if side.contains(new) {
            side.remove(pos);
        } else {
            side[pos] = new.clone();
        }
        true
    }

    /// Entfernt `id` am angegebenen Ende.
    pub fn remove_at(&mut self, end: LinkEnd, id: &FeatureId) -> bool {
        let side = self.side_mut(end);
        let before = side.len();
        side.retain(|other| other != id);
        side.len() < before
    }

    /// Entfernt `id` an beiden Enden.
    pub fn remove(&mut self, id: &FeatureId) -> bool {
        let a = self.remove_at(LinkEnd::Start, id);
        let b = self.remove_at(LinkEnd::End, id);
        a || b
    }

    /// Ersetzt jede Referenz über eine ID-Abbildung.
    pub fn remap(&mut self, map: impl Fn(&FeatureId) -> Option<FeatureId>) {
        for id in self.start.iter_mut().chain(self.end.iter_mut()) {
            if let Some(new_id) = map(id) {
                *id = new_id;
            }
        }
    }
}

/// Editierbare Linien-Geometrie (Straßensegment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Feature-ID
    pub id: FeatureId,
    /// Geordnete Vertex-Folge (mindestens 2)
    pub coordinates: Vec<DVec2>,
    /// Optionale Z-Level, parallel zu `coordinates`
    #[serde(default)]
    pub z_levels: Option<Vec<i32>>,
    /// Nicht editierbare Links ignorieren Drag und Split
    #[serde(default = "default_editable")]
    pub editable: bool,
    /// Abbiegeverbote an Start/Ende
    #[serde(default)]
    pub turn_restriction: TurnRestriction,
    /// Ursprünglicher Link einer Split-Kette
    #[serde(default)]
    pub origin_link: Option<FeatureId>,
    /// Direkter Eltern-Link nach Split/Merge
    #[serde(default)]
    pub parent_link: Option<FeatureId>,
    /// Freie Attribute
    #[serde(default)]
    pub properties: Properties,
}

fn default_editable() -> bool {
    true
}

impl Link {
    /// Erstellt einen editierbaren Link ohne Attribute.
    pub fn new(id: impl Into<FeatureId>, coordinates: Vec<DVec2>) -> Self {
        Self {
            id: id.into(),
            coordinates,
            z_levels: None,
            editable: true,
            turn_restriction: TurnRestriction::default(),
            origin_link: None,
            parent_link: None,
            properties: Properties::new(),
        }
    }

    /// Setzt ein Attribut (Builder-Stil).
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Anzahl der Vertices.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Gibt `true` zurück, wenn der Link keine Vertices hat.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Index des Start- oder End-Vertex.
    pub fn end_index(&self, end: LinkEnd) -> usize {
        match end {
            LinkEnd::Start => 0,
            LinkEnd::End => self.coordinates.len().saturating_sub(1),
        }
    }

    /// Liefert das Link-Ende für einen Index, falls es ein Endpunkt ist.
    pub fn end_at(&self, index: usize) -> Option<LinkEnd> {
        if index == 0 {
            Some(LinkEnd::Start)
        } else if index + 1 == self.coordinates.len() {
            Some(LinkEnd::End)
        } else {
            None
        }
    }

    /// Iterator über alle Segmente als (Index, Start, Ende).
    pub fn segments(&self) -> impl Iterator<Item = (usize, DVec2, DVec2)> + '_ {
        self.coordinates
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i, w[0], w[1]))
    }
}

/// Art eines punktförmigen Features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    /// Point of Interest
    Poi,
    /// Adresse
    Address,
}

/// Punkt-Feature mit Routing-Anbindung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Feature-ID
    pub id: FeatureId,
    /// POI oder Adresse
    pub kind: PlaceKind,
    /// Anzeigeposition
    pub position: DVec2,
    /// Routing-Anbindung an einen Link
    #[serde(default)]
    pub routing: RoutingPoint,
    /// Freie Attribute
    #[serde(default)]
    pub properties: Properties,
}

impl Place {
    /// Erstellt einen Place ohne Routing-Anbindung.
    pub fn new(id: impl Into<FeatureId>, kind: PlaceKind, position: DVec2) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            routing: RoutingPoint::default(),
            properties: Properties::new(),
        }
    }
}

/// Flächen-Feature (äußerer Ring + Löcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Feature-ID
    pub id: FeatureId,
    /// Ringe, der erste ist der äußere
    pub rings: Vec<Vec<DVec2>>,
    /// Freie Attribute
    #[serde(default)]
    pub properties: Properties,
}

/// Geometrie eines Features, unabhängig vom Typ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Einzelner Punkt (Place)
    Point(DVec2),
    /// Linie mit optionalen Z-Levels (Link)
    LineString {
        /// Vertex-Folge
        coordinates: Vec<DVec2>,
        /// Z-Level, parallel zur Vertex-Folge
        z_levels: Option<Vec<i32>>,
    },
    /// Polygon-Ringe (Area)
    Polygon(Vec<Vec<DVec2>>),
}

impl Geometry {
    /// Iterator über alle Punkte der Geometrie.
    pub fn points(&self) -> Box<dyn Iterator<Item = DVec2> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(*p)),
            Geometry::LineString { coordinates, .. } => Box::new(coordinates.iter().copied()),
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten().copied()),
        }
    }

    /// Verschiebt alle Punkte um `delta`.
    pub fn translated(&self, delta: DVec2) -> Geometry {
        match self {
            Geometry::Point(p) => Geometry::Point(*p + delta),
            Geometry::LineString {
                coordinates,
                z_levels,
            } => Geometry::LineString {
                coordinates: coordinates.iter().map(|c| *c + delta).collect(),
                z_levels: z_levels.clone(),
            },
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|c| *c + delta).collect())
                    .collect(),
            ),
        }
    }
}

/// Art eines Features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Linien-Feature
    Link,
    /// POI/Adresse
    Place(PlaceKind),
    /// Fläche
    Area,
}

/// Ein beliebiges Feature des Netzwerks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "featureType", rename_all = "lowercase")]
pub enum Feature {
    /// Link
    Link(Link),
    /// POI/Adresse
    Place(Place),
    /// Fläche
    Area(Area),
}

impl Feature {
    /// Feature-ID.
    pub fn id(&self) -> &FeatureId {
        match self {
            Feature::Link(link) => &link.id,
            Feature::Place(place) => &place.id,
            Feature::Area(area) => &area.id,
        }
    }

    /// Mutable Feature-ID (für die ID-Umschreibung nach Submit).
    pub fn id_mut(&mut self) -> &mut FeatureId {
        match self {
            Feature::Link(link) => &mut link.id,
            Feature::Place(place) => &mut place.id,
            Feature::Area(area) => &mut area.id,
        }
    }

    /// Art des Features.
    pub fn kind(&self) -> FeatureKind {
        match self {
            Feature::Link(_) => FeatureKind::Link,
            Feature::Place(place) => FeatureKind::Place(place.kind),
            Feature::Area(_) => FeatureKind::Area,
        }
    }

    /// Aktuelle Geometrie.
    pub fn geometry(&self) -> Geometry {
        match self {
            Feature::Link(link) => Geometry::LineString {
                coordinates: link.coordinates.clone(),
                z_levels: link.z_levels.clone(),
            },
            Feature::Place(place) => Geometry::Point(place.position),
            Feature::Area(area) => Geometry::Polygon(area.rings.clone()),
        }
    }

    /// Freie Attribute.
    pub fn properties(&self) -> &Properties {
        match self {
            Feature::Link(link) => &link.properties,
            Feature::Place(place) => &place.properties,
            Feature::Area(area) => &area.properties,
        }
    }

    /// Mutable freie Attribute.
    pub fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Feature::Link(link) => &mut link.properties,
            Feature::Place(place) => &mut place.properties,
            Feature::Area(area) => &mut area.properties,
        }
    }

    /// Achsenparalleles Begrenzungsrechteck (min, max).
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let geometry = self.geometry();
        let mut points = geometry.points();
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}
