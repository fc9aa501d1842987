//! Invertierbare Mutationen, Transaktionen und History-Steps.
//!
//! Jede Änderung an der NetworkMap läuft über eine `Transaction`. Beim Anwenden
//! wird die inverse Mutation gegen den aktuellen Zustand berechnet, sodass ein
//! fertiger `Step` ohne Snapshot vor- und zurückgespielt werden kann.

use super::error::{EditError, EditResult};
use super::{
    Feature, FeatureId, Geometry, NetworkMap, RoutingPoint, ShapePoint, TurnRestriction,
};
use glam::DVec2;

/// Nicht-geometrisches Attribut eines Features.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Freies Attribut (`None` = entfernen)
    Attribute {
        /// Schlüssel
        key: String,
        /// Neuer Wert
        value: Option<serde_json::Value>,
    },
    /// Routing-Anbindung eines Places
    Routing(RoutingPoint),
    /// Abbiegeverbote eines Links
    TurnRestriction(TurnRestriction),
    /// Editierbar-Flag eines Links
    Editable(bool),
    /// Split-/Merge-Provenienz eines Links
    Provenance {
        /// Ursprünglicher Link
        origin: Option<FeatureId>,
        /// Direkter Eltern-Link
        parent: Option<FeatureId>,
    },
    /// Z-Level eines Links
    ZLevels(Option<Vec<i32>>),
}

/// Eine einzelne, invertierbare Änderung.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Feature hinzufügen
    AddFeature(Feature),
    /// Feature entfernen (trägt den vollständigen Zustand für die Inverse)
    RemoveFeature(Feature),
    /// Geometrie ersetzen
    SetCoordinates {
        /// Betroffenes Feature
        id: FeatureId,
        /// Neue Geometrie
        geometry: Geometry,
    },
    /// Attribut setzen
    SetProperty {
        /// Betroffenes Feature
        id: FeatureId,
        /// Neuer Wert
        property: Property,
    },
    /// Shape-Point exakt auf einen fremden Vertex setzen
    Connect {
        /// Bewegter Shape-Point
        shape_point: ShapePoint,
        /// Ziel-Shape-Point (bleibt unverändert)
        target: ShapePoint,
        /// Gemeinsame Position
        position: DVec2,
    },
    /// Shape-Point von einem fremden Vertex lösen
    Disconnect {
        /// Bewegter Shape-Point
        shape_point: ShapePoint,
        /// Bisheriger Partner (bleibt unverändert)
        from: ShapePoint,
        /// Neue, eigene Position
        position: DVec2,
    },
}

/// Art einer beobachtbaren Feature-Änderung (für Renderer und Zähler).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureChange {
    /// Feature wurde hinzugefügt
    Added(FeatureId),
    /// Feature wurde entfernt
    Removed(FeatureId),
    /// Geometrie wurde geändert
    CoordinatesChanged(FeatureId),
    /// Attribute wurden geändert
    PropertiesChanged(FeatureId),
}

impl Mutation {
    /// ID des betroffenen Features.
    pub fn feature_id(&self) -> &FeatureId {
        match self {
            Mutation::AddFeature(feature) | Mutation::RemoveFeature(feature) => feature.id(),
            Mutation::SetCoordinates { id, .. } | Mutation::SetProperty { id, .. } => id,
            Mutation::Connect { shape_point, .. } | Mutation::Disconnect { shape_point, .. } => {
                &shape_point.link
            }
        }
    }

    /// Beobachtbare Änderung dieser Mutation.
    pub fn change(&self) -> FeatureChange {
        let id = self.feature_id().clone();
        match self {
            Mutation::AddFeature(_) => FeatureChange::Added(id),
            Mutation::RemoveFeature(_) => FeatureChange::Removed(id),
            Mutation::SetProperty { .. } => FeatureChange::PropertiesChanged(id),
            Mutation::SetCoordinates { .. }
            | Mutation::Connect { .. }
            | Mutation::Disconnect { .. } => FeatureChange::CoordinatesChanged(id),
        }
    }

    /// Wendet die Mutation an und liefert die Inverse.
    ///
    /// Schlägt die Mutation fehl, bleibt die Map unverändert.
    pub fn apply(&self, map: &mut NetworkMap) -> EditResult<Mutation> {
        match self {
            Mutation::AddFeature(feature) => {
                map.add_feature(feature.clone())?;
                Ok(Mutation::RemoveFeature(feature.clone()))
            }
            Mutation::RemoveFeature(feature) => {
                let removed = map
                    .remove_feature(feature.id())
                    .ok_or_else(|| EditError::UnknownFeature(feature.id().clone()))?;
                Ok(Mutation::AddFeature(removed))
            }
            Mutation::SetCoordinates { id, geometry } => {
                let old = map.set_geometry(id, geometry.clone())?;
                Ok(Mutation::SetCoordinates {
                    id: id.clone(),
                    geometry: old,
                })
            }
            Mutation::SetProperty { id, property } => {
                let old = apply_property(map, id, property)?;
                Ok(Mutation::SetProperty {
                    id: id.clone(),
                    property: old,
                })
            }
            Mutation::Connect {
                shape_point,
                target,
                position,
            } => {
                let old = map.set_vertex(shape_point, *position)?;
                Ok(Mutation::Disconnect {
                    shape_point: shape_point.clone(),
                    from: target.clone(),
                    position: old,
                })
            }
            Mutation::Disconnect {
                shape_point,
                from,
                position,
            } => {
                let old = map.set_vertex(shape_point, *position)?;
                Ok(Mutation::Connect {
                    shape_point: shape_point.clone(),
                    target: from.clone(),
                    position: old,
                })
            }
        }
    }
}

fn apply_property(map: &mut NetworkMap, id: &FeatureId, property: &Property) -> EditResult<Property> {
    Ok(match property {
        Property::Attribute { key, value } => Property::Attribute {
            key: key.clone(),
            value: map.set_attribute(id, key, value.clone())?,
        },
        Property::Routing(routing) => Property::Routing(map.set_routing(id, routing.clone())?),
        Property::TurnRestriction(restriction) => {
            Property::TurnRestriction(map.set_turn_restriction(id, restriction.clone())?)
        }
        Property::Editable(editable) => Property::Editable(map.set_editable(id, *editable)?),
        Property::Provenance { origin, parent } => {
            let (origin, parent) = map.set_provenance(id, origin.clone(), parent.clone())?;
            Property::Provenance { origin, parent }
        }
        Property::ZLevels(z_levels) => Property::ZLevels(map.set_z_levels(id, z_levels.clone())?),
    })
}

/// Gesammelte Vorwärts-/Rückwärts-Mutationen einer noch offenen Operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    forward: Vec<Mutation>,
    backward: Vec<Mutation>,
}

impl ChangeSet {
    /// Gibt `true` zurück, wenn nichts aufgezeichnet wurde.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Anzahl aufgezeichneter Mutationen.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Alle betroffenen Feature-IDs (sortiert, ohne Duplikate).
    pub fn affected_ids(&self) -> Vec<FeatureId> {
        collect_ids(&self.forward)
    }

    /// Schließt die Aufzeichnung zu einem History-Step ab.
    pub fn into_step(self, label: impl Into<String>) -> Step {
        Step {
            label: label.into(),
            forward: self.forward,
            backward: self.backward,
        }
    }
}

/// Eine offene Änderung an der NetworkMap.
///
/// Wird die Transaktion ohne `commit` fallen gelassen, bleiben die bereits
/// angewendeten Mutationen stehen; Fehlerpfade rufen deshalb `rollback` auf.
pub struct Transaction<'a> {
    map: &'a mut NetworkMap,
    changes: ChangeSet,
}

impl<'a> Transaction<'a> {
    /// Beginnt eine neue Transaktion.
    pub fn new(map: &'a mut NetworkMap) -> Self {
        Self {
            map,
            changes: ChangeSet::default(),
        }
    }

    /// Setzt eine unterbrochene Transaktion fort (z.B. über mehrere Drag-Frames).
    pub fn resume(map: &'a mut NetworkMap, changes: ChangeSet) -> Self {
        Self { map, changes }
    }

    /// Read-only Sicht auf die Map im aktuellen Zwischenzustand.
    pub fn map(&self) -> &NetworkMap {
        self.map
    }

    /// Bisher aufgezeichnete Änderungen.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Wendet eine Mutation an und zeichnet sie auf.
    ///
    /// Geometrie-Änderungen werden mit der letzten Mutation desselben Features
    /// zusammengefasst, sofern diese ebenfalls eine Geometrie-Änderung war:
    /// die erste Inverse bleibt, die Vorwärts-Mutation wird ersetzt.
    pub fn apply(&mut self, mutation: Mutation) -> EditResult<()> {
        let inverse = mutation.apply(self.map)?;
        let coalesce_slot = match &mutation {
            Mutation::SetCoordinates { id, .. } => self
                .changes
                .forward
                .iter()
                .rposition(|m| m.feature_id() == id)
                .filter(|&slot| {
                    matches!(self.changes.forward[slot], Mutation::SetCoordinates { .. })
                }),
            _ => None,
        };
        if let Some(slot) = coalesce_slot {
            self.changes.forward[slot] = mutation;
        } else {
            self.changes.forward.push(mutation);
            self.changes.backward.push(inverse);
        }
        Ok(())
    }

    /// Fügt ein Feature hinzu.
    pub fn add_feature(&mut self, feature: Feature) -> EditResult<()> {
        self.apply(Mutation::AddFeature(feature))
    }

    /// Entfernt ein Feature und gibt dessen letzten Zustand zurück.
    pub fn remove_feature(&mut self, id: &FeatureId) -> EditResult<Feature> {
        let feature = self
            .map
            .feature(id)
            .ok_or_else(|| EditError::UnknownFeature(id.clone()))?;
        self.apply(Mutation::RemoveFeature(feature.clone()))?;
        Ok(feature)
    }

    /// Ersetzt die Vertex-Folge eines Links (Z-Level bleiben erhalten).
    pub fn set_coordinates(&mut self, link: &FeatureId, coordinates: Vec<DVec2>) -> EditResult<()> {
        let z_levels = self.map.require_link(link)?.z_levels.clone();
        self.apply(Mutation::SetCoordinates {
            id: link.clone(),
            geometry: Geometry::LineString {
                coordinates,
                z_levels,
            },
        })
    }

    /// Ersetzt Vertex-Folge und Z-Level eines Links gemeinsam.
    pub fn set_link_geometry(
        &mut self,
        link: &FeatureId,
        coordinates: Vec<DVec2>,
        z_levels: Option<Vec<i32>>,
    ) -> EditResult<()> {
        self.apply(Mutation::SetCoordinates {
            id: link.clone(),
            geometry: Geometry::LineString {
                coordinates,
                z_levels,
            },
        })
    }

    /// Fügt einen Vertex an `index` (`0..=len`) ein; Z-Level übernehmen den Nachbarwert.
    pub fn insert_vertex(&mut self, link: &FeatureId, index: usize, vertex: DVec2) -> EditResult<()> {
        let current = self.map.require_link(link)?;
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
        self.set_link_geometry(link, coordinates, z_levels)
    }

    /// Entfernt den Vertex an `index`; ein Link behält mindestens zwei Vertices.
    pub fn remove_vertex(&mut self, link: &FeatureId, index: usize) -> EditResult<DVec2> {
        let current = self.map.require_link(link)?;
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
        self.set_link_geometry(link, coordinates, z_levels)?;
        Ok(removed)
    }

    /// Verschiebt einen einzelnen Shape-Point ohne topologische Bedeutung.
    pub fn move_vertex(&mut self, shape_point: &ShapePoint, position: DVec2) -> EditResult<()> {
        if self.map.vertex(shape_point)? == position {
            return Ok(());
        }
        let mut coordinates = self.map.coordinates(&shape_point.link)?.to_vec();
        coordinates[shape_point.index] = position;
        self.set_coordinates(&shape_point.link, coordinates)
    }

    /// Setzt ein Attribut.
    pub fn set_property(&mut self, id: &FeatureId, property: Property) -> EditResult<()> {
        self.apply(Mutation::SetProperty {
            id: id.clone(),
            property,
        })
    }

    /// Setzt `shape_point` exakt auf `position` (Position von `target`).
    pub fn connect(
        &mut self,
        shape_point: &ShapePoint,
        target: &ShapePoint,
        position: DVec2,
    ) -> EditResult<()> {
        self.apply(Mutation::Connect {
            shape_point: shape_point.clone(),
            target: target.clone(),
            position,
        })
    }

    /// Löst `shape_point` von `from` und setzt ihn auf `position`.
    pub fn disconnect(
        &mut self,
        shape_point: &ShapePoint,
        from: &ShapePoint,
        position: DVec2,
    ) -> EditResult<()> {
        self.apply(Mutation::Disconnect {
            shape_point: shape_point.clone(),
            from: from.clone(),
            position,
        })
    }

    /// Rollt alle angewendeten Mutationen in umgekehrter Reihenfolge zurück.
    pub fn rollback(self) {
        let Transaction { map, changes } = self;
        for mutation in changes.backward.iter().rev() {
            if let Err(e) = mutation.apply(map) {
                log::warn!("Rollback fehlgeschlagen: {}", e);
            }
        }
    }

    /// Unterbricht die Transaktion und gibt die Aufzeichnung zurück.
    pub fn suspend(self) -> ChangeSet {
        self.changes
    }

    /// Schließt die Transaktion ab; `None` wenn nichts geändert wurde.
    pub fn commit(self, label: impl Into<String>) -> Option<Step> {
        if self.changes.is_empty() {
            None
        } else {
            Some(self.changes.into_step(label))
        }
    }
}

fn atomically(
    map: &mut NetworkMap,
    op: impl FnOnce(&mut Transaction<'_>) -> EditResult<()>,
) -> EditResult<()> {
    let mut tx = Transaction::new(map);
    match op(&mut tx) {
        Ok(()) => Ok(()),
        Err(e) => {
            tx.rollback();
            Err(e)
        }
    }
}

/// Ein undo/redo-barer Schritt (ggf. zusammengesetzt aus mehreren Mutationen).
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Beschreibung für Logging/UI
    pub label: String,
    /// Mutationen in Anwendungsreihenfolge
    pub forward: Vec<Mutation>,
    /// Inversen in Anwendungsreihenfolge (werden rückwärts angewendet)
    pub backward: Vec<Mutation>,
}

impl Step {
    /// Spielt den Step vorwärts ab (Redo); bei Fehler bleibt die Map unverändert.
    pub fn apply_forward(&self, map: &mut NetworkMap) -> EditResult<()> {
        atomically(map, |tx| self.replay_forward(tx))
    }

    /// Spielt den Step rückwärts ab (Undo); bei Fehler bleibt die Map unverändert.
    pub fn apply_backward(&self, map: &mut NetworkMap) -> EditResult<()> {
        atomically(map, |tx| self.replay_backward(tx))
    }

    /// Vorwärts-Mutationen innerhalb einer offenen Transaktion.
    pub fn replay_forward(&self, tx: &mut Transaction<'_>) -> EditResult<()> {
        self.forward
            .iter()
            .try_for_each(|mutation| tx.apply(mutation.clone()))
    }

    /// Inversen in umgekehrter Reihenfolge innerhalb einer offenen Transaktion.
    pub fn replay_backward(&self, tx: &mut Transaction<'_>) -> EditResult<()> {
        self.backward
            .iter()
            .rev()
            .try_for_each(|mutation| tx.apply(mutation.clone()))
    }

    /// Alle betroffenen Feature-IDs (sortiert, ohne Duplikate).
    pub fn affected_ids(&self) -> Vec<FeatureId> {
        collect_ids(&self.forward)
    }

    /// Beobachtbare Änderungen in Vorwärtsrichtung.
    pub fn forward_changes(&self) -> Vec<FeatureChange> {
        self.forward.iter().map(Mutation::change).collect()
    }

    /// Beobachtbare Änderungen in Rückwärtsrichtung.
    pub fn backward_changes(&self) -> Vec<FeatureChange> {
        self.backward.iter().rev().map(Mutation::change).collect()
    }
}

fn collect_ids(mutations: &[Mutation]) -> Vec<FeatureId> {
    let mut ids: Vec<FeatureId> = mutations.iter().map(|m| m.feature_id().clone()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
