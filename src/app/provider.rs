//! Provider-Adapter: Quelle und Ziel der Features einer Session.
//!
//! Ein `FeatureProvider` liefert Features per Suche und nimmt beim Submit
//! einen `SubmitBatch` entgegen. Temporäre Client-IDs werden dabei durch
//! permanente IDs ersetzt; die Zuordnung geht als `PermanentIdMap` an den
//! Aufrufer zurück.

use crate::core::geometry::{distance_to_polyline, point_in_ring};
use crate::core::{EditResult, Feature, FeatureId, NetworkMap};
use anyhow::{bail, Context};
use glam::DVec2;
use std::collections::{BTreeMap, HashMap};

/// `{providerId: {tempId: permanentId}}` nach erfolgreichem Submit.
pub type PermanentIdMap = BTreeMap<String, BTreeMap<FeatureId, FeatureId>>;

/// Suchanfrage an einen Provider oder die Arbeitskopie.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Alles innerhalb von `radius` um `position` (Welteinheiten)
    Point { position: DVec2, radius: f64 },
    /// Alles, was das Rechteck berührt
    Rect { min: DVec2, max: DVec2 },
    /// Ein einzelnes Feature
    Id(FeatureId),
    /// Mehrere Features
    Ids(Vec<FeatureId>),
}

/// Ungespeicherte Änderungen einer Session, bereit zum Commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitBatch {
    /// Neu angelegte Features (temporäre IDs)
    pub added: Vec<Feature>,
    /// Geänderte Features im aktuellen Zustand
    pub modified: Vec<Feature>,
    /// Gelöschte Feature-IDs
    pub removed: Vec<FeatureId>,
}

impl SubmitBatch {
    /// Anzahl geänderter Features.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Gibt `true` zurück, wenn nichts zu übertragen ist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Datenquelle und Commit-Ziel einer Edit-Session.
pub trait FeatureProvider {
    /// Schlüssel in der `PermanentIdMap`.
    fn id(&self) -> &str;

    /// Features passend zur Anfrage, sortiert nach ID.
    fn search(&self, query: &SearchQuery) -> Vec<Feature>;

    /// Aktueller Zustand eines Features, falls bekannt.
    fn exists(&self, id: &FeatureId) -> Option<Feature>;

    /// Übernimmt Features direkt (ohne Submit) und gibt sie zurück.
    fn add_features(&mut self, features: Vec<Feature>) -> anyhow::Result<Vec<Feature>>;

    /// Entfernt Features direkt und gibt die entfernten zurück.
    fn remove_features(&mut self, ids: &[FeatureId]) -> Vec<Feature>;

    /// Übernimmt einen Batch atomar und liefert `tempId -> permanentId`.
    fn commit(&mut self, batch: &SubmitBatch) -> anyhow::Result<HashMap<FeatureId, FeatureId>>;
}

/// Sucht in einer NetworkMap.
pub fn search_map(map: &NetworkMap, query: &SearchQuery) -> Vec<Feature> {
    let mut found: Vec<Feature> = match query {
        SearchQuery::Point { position, radius } => {
            let position = *position;
            let radius = radius.max(0.0);
            let mut found: Vec<Feature> = map
                .spatial_index()
                .links_near_point(position, radius)
                .into_iter()
                .filter_map(|id| map.link(&id))
                .filter(|link| distance_to_polyline(position, &link.coordinates) <= radius)
                .map(|link| Feature::Link(link.clone()))
                .collect();
            found.extend(
                map.places_within_radius(position, radius)
                    .into_iter()
                    .filter_map(|id| map.place(&id))
                    .map(|place| Feature::Place(place.clone())),
            );
            found.extend(
                map.areas_iter()
                    .filter(|area| area_near(&area.rings, position, radius))
                    .map(|area| Feature::Area(area.clone())),
            );
            found
        }
        SearchQuery::Rect { min, max } => {
            let (min, max) = (min.min(*max), min.max(*max));
            let mut found: Vec<Feature> = map
                .links_in_rect(min, max, 0.0)
                .into_iter()
                .filter_map(|id| map.link(&id))
                .map(|link| Feature::Link(link.clone()))
                .collect();
            found.extend(
                map.places_iter()
                    .filter(|p| p.position.cmpge(min).all() && p.position.cmple(max).all())
                    .map(|place| Feature::Place(place.clone())),
            );
            found.extend(map.areas_iter().filter_map(|area| {
                let feature = Feature::Area(area.clone());
                let (amin, amax) = feature.bounds()?;
                let overlaps = amin.cmple(max).all() && amax.cmpge(min).all();
                overlaps.then_some(feature)
            }));
            found
        }
        SearchQuery::Id(id) => map.feature(id).into_iter().collect(),
        SearchQuery::Ids(ids) => ids.iter().filter_map(|id| map.feature(id)).collect(),
    };
    found.sort_by(|a, b| a.id().cmp(b.id()));
    found.dedup_by(|a, b| a.id() == b.id());
    found
}

fn area_near(rings: &[Vec<DVec2>], position: DVec2, radius: f64) -> bool {
    let Some(outer) = rings.first() else {
        return false;
    };
    if point_in_ring(position, outer) {
        return true;
    }
    rings.iter().any(|ring| {
        let mut closed = ring.clone();
        if let Some(first) = ring.first() {
            closed.push(*first);
        }
        distance_to_polyline(position, &closed) <= radius
    })
}

/// In-Memory-Provider, der permanente IDs fortlaufend vergibt.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    id: String,
    map: NetworkMap,
    next_id: u64,
}

impl LocalProvider {
    /// Leerer Provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            map: NetworkMap::new(),
            next_id: 1,
        }
    }

    /// Provider mit Anfangsbestand.
    pub fn with_features(
        id: impl Into<String>,
        features: impl IntoIterator<Item = Feature>,
    ) -> EditResult<Self> {
        Ok(Self {
            id: id.into(),
            map: NetworkMap::from_features(features)?,
            next_id: 1,
        })
    }

    /// Gespeicherter Bestand.
    pub fn map(&self) -> &NetworkMap {
        &self.map
    }

    fn permanent_id(&mut self) -> FeatureId {
        loop {
            let id = FeatureId::new(self.next_id.to_string());
            self.next_id += 1;
            if !self.map.contains(&id) {
                return id;
            }
        }
    }
}

impl FeatureProvider for LocalProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn search(&self, query: &SearchQuery) -> Vec<Feature> {
        search_map(&self.map, query)
    }

    fn exists(&self, id: &FeatureId) -> Option<Feature> {
        self.map.feature(id)
    }

    fn add_features(&mut self, features: Vec<Feature>) -> anyhow::Result<Vec<Feature>> {
        let mut staged = self.map.clone();
        for feature in &features {
            staged
                .add_feature(feature.clone())
                .with_context(|| format!("Feature {} nicht übernommen", feature.id()))?;
        }
        self.map = staged;
        Ok(features)
    }

    fn remove_features(&mut self, ids: &[FeatureId]) -> Vec<Feature> {
        ids.iter()
            .filter_map(|id| self.map.remove_feature(id))
            .collect()
    }

    fn commit(&mut self, batch: &SubmitBatch) -> anyhow::Result<HashMap<FeatureId, FeatureId>> {
        let mut staged = self.map.clone();
        for id in &batch.removed {
            if staged.remove_feature(id).is_none() {
                bail!("Gelöschtes Feature {} ist dem Provider unbekannt", id);
            }
        }
        for feature in &batch.modified {
            if staged.remove_feature(feature.id()).is_none() {
                bail!("Geändertes Feature {} ist dem Provider unbekannt", feature.id());
            }
            staged.add_feature(feature.clone())?;
        }
        let mut mapping = HashMap::new();
        for feature in &batch.added {
            staged
                .add_feature(feature.clone())
                .with_context(|| format!("Neues Feature {} ungültig", feature.id()))?;
            if feature.id().is_temporary() {
                let permanent = loop {
                    let candidate = self.permanent_id();
                    if !staged.contains(&candidate) {
                        break candidate;
                    }
                };
                mapping.insert(feature.id().clone(), permanent);
            }
        }
        staged.remap_ids(&mapping);
        self.map = staged;
        log::info!(
            "Provider {}: {} neu, {} geändert, {} gelöscht",
            self.id,
            batch.added.len(),
            batch.modified.len(),
            batch.removed.len()
        );
        Ok(mapping)
    }
}
