//! Drag von Shape-Points und ganzen Features.
//!
//! Ein Shape-Drag läuft über mehrere Frames und ergibt genau einen Step:
//!
//! - Solange die Gesamtverschiebung unter dem Disconnect-Abstand bleibt,
//!   wandern alle koinzidenten Shape-Points fremder Links mit.
//! - Darüber reißt der Punkt ab: die Nachbarn kehren an den Ursprung zurück,
//!   nur der gezogene Vertex bewegt sich weiter.
//! - Ein freier Punkt rastet auf einen fremden Vertex ein, wenn genau eine
//!   Vertex-Position im Fangradius liegt.

use super::{ensure_editable, Tolerances};
use crate::core::error::{EditError, EditResult};
use crate::core::reconcile::{reconcile_links, routing, turn_restrictions};
use crate::core::{
    ChangeSet, FeatureId, Geometry, Mutation, NetworkMap, ShapePoint, Step, Transaction,
};
use glam::DVec2;

/// Laufender Drag eines Shape-Points.
#[derive(Debug, Clone)]
pub struct ShapeDrag {
    shape_point: ShapePoint,
    origin: DVec2,
    displacement: DVec2,
    group: Vec<ShapePoint>,
    detached: bool,
    changes: ChangeSet,
}

impl ShapeDrag {
    /// Beginnt einen Drag; nicht editierbare Links werden abgelehnt.
    pub fn begin(
        map: &NetworkMap,
        shape_point: ShapePoint,
        tolerances: &Tolerances,
    ) -> EditResult<Self> {
        ensure_editable(map, &shape_point.link)?;
        let origin = map.vertex(&shape_point)?;
        let group = map
            .connections_of(&shape_point, tolerances.epsilon)
            .into_iter()
            .filter(|sp| map.link(&sp.link).is_some_and(|l| l.editable))
            .collect();
        Ok(Self {
            shape_point,
            origin,
            displacement: DVec2::ZERO,
            group,
            detached: false,
            changes: ChangeSet::default(),
        })
    }

    /// Gezogener Shape-Point.
    pub fn shape_point(&self) -> &ShapePoint {
        &self.shape_point
    }

    /// Bisherige Gesamtverschiebung in Welteinheiten.
    pub fn displacement(&self) -> DVec2 {
        self.displacement
    }

    /// Gibt `true` zurück, sobald der Punkt von seinen Nachbarn abgerissen ist.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Bisher vom Drag veränderte Features.
    pub fn affected_ids(&self) -> Vec<FeatureId> {
        self.changes.affected_ids()
    }

    /// Verarbeitet einen Drag-Frame mit `delta` in Welteinheiten.
    ///
    /// Frames, die doppelte Nachbar-Vertices erzeugen würden, werden
    /// verworfen. Bei einem Fehler muss der Drag mit `cancel` beendet werden.
    pub fn update(
        &mut self,
        map: &mut NetworkMap,
        delta: DVec2,
        tolerances: &Tolerances,
    ) -> EditResult<()> {
        let displacement = self.displacement + delta;
        let mut tx = Transaction::resume(map, std::mem::take(&mut self.changes));
        let result = self.apply_frame(&mut tx, displacement, tolerances);
        self.changes = tx.suspend();
        if result? {
            self.displacement = displacement;
        } else {
            log::debug!("Drag-Frame für {} verworfen", self.shape_point);
        }
        Ok(())
    }

    fn apply_frame(
        &mut self,
        tx: &mut Transaction<'_>,
        displacement: DVec2,
        tolerances: &Tolerances,
    ) -> EditResult<bool> {
        let target = self.origin + displacement;
        let connected = !self.group.is_empty() && !self.detached;

        if connected && displacement.length() <= tolerances.disconnect {
            let mut points = vec![self.shape_point.clone()];
            points.extend(self.group.iter().cloned());
            if points.iter().any(|sp| would_duplicate(tx.map(), sp, target)) {
                return Ok(false);
            }
            for sp in &points {
                tx.move_vertex(sp, target)?;
            }
            return Ok(true);
        }

        if connected {
            for sp in &self.group {
                tx.move_vertex(sp, self.origin)?;
            }
        }
        let snap = snap_target(tx.map(), &self.shape_point, target, tolerances);
        let position = snap.as_ref().map_or(target, |(_, p)| *p);
        if would_duplicate(tx.map(), &self.shape_point, position) {
            if connected {
                // Nachbarn wieder mitnehmen, Frame verwerfen
                let current = tx.map().vertex(&self.shape_point)?;
                for sp in &self.group {
                    tx.move_vertex(sp, current)?;
                }
            }
            return Ok(false);
        }

        if connected {
            self.detached = true;
            log::debug!("{} von {} Nachbarn gelöst", self.shape_point, self.group.len());
        }
        match snap {
            Some((target_point, position)) => {
                if tx.map().vertex(&self.shape_point)? != position {
                    tx.connect(&self.shape_point, &target_point, position)?;
                }
            }
            None if connected => {
                let from = self.group[0].clone();
                tx.disconnect(&self.shape_point, &from, position)?;
            }
            None => tx.move_vertex(&self.shape_point, position)?,
        }
        Ok(true)
    }

    /// Beendet den Drag: Abbiegeverbote getrennter Nachbarn bereinigen,
    /// Abhängige abgleichen, Step abschließen (`None` ohne Änderung).
    pub fn finish(self, map: &mut NetworkMap, tolerances: &Tolerances) -> EditResult<Option<Step>> {
        let ShapeDrag {
            shape_point,
            group,
            detached,
            changes,
            ..
        } = self;
        let mut tx = Transaction::resume(map, changes);
        match settle(&mut tx, &shape_point, &group, detached, tolerances) {
            Ok(()) => Ok(tx.commit(format!("Drag {}", shape_point))),
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Bricht den Drag ab und stellt den Ausgangszustand wieder her.
    pub fn cancel(self, map: &mut NetworkMap) {
        Transaction::resume(map, self.changes).rollback();
    }
}

fn settle(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    group: &[ShapePoint],
    detached: bool,
    tolerances: &Tolerances,
) -> EditResult<()> {
    if detached && tolerances.prune_turn_restrictions_on_disconnect {
        let position = tx.map().vertex(shape_point)?;
        for other in group {
            if tx.map().vertex(other)?.distance(position) > tolerances.epsilon {
                turn_restrictions::prune_between(tx, shape_point, other)?;
            }
        }
    }
    let touched = tx.changes().affected_ids();
    reconcile_links(tx, &touched, tolerances)
}

/// Eindeutiges Fangziel: genau eine fremde Vertex-Position im Fangradius.
fn snap_target(
    map: &NetworkMap,
    shape_point: &ShapePoint,
    target: DVec2,
    tolerances: &Tolerances,
) -> Option<(ShapePoint, DVec2)> {
    let hits: Vec<_> = map
        .vertices_within_radius(target, tolerances.auto_connect)
        .into_iter()
        .filter(|m| m.shape_point.link != shape_point.link)
        .collect();
    let first = hits.first()?;
    let unique = hits
        .iter()
        .all(|m| m.position.distance(first.position) <= tolerances.epsilon);
    unique.then(|| (first.shape_point.clone(), first.position))
}

/// Gibt `true` zurück, wenn `position` mit einem Nachbar-Vertex zusammenfiele.
fn would_duplicate(map: &NetworkMap, shape_point: &ShapePoint, position: DVec2) -> bool {
    let Some(link) = map.link(&shape_point.link) else {
        return false;
    };
    let index = shape_point.index;
    let before = index.checked_sub(1).and_then(|i| link.coordinates.get(i));
    let after = link.coordinates.get(index + 1);
    before == Some(&position) || after == Some(&position)
}

/// Verschiebt ein ganzes Feature um `delta` (Welteinheiten).
///
/// Ein Link nimmt keine Nachbarn mit: bisher koinzidente Shape-Points
/// fremder Links bleiben liegen. Places gleichen ihr Routing ab.
pub fn drag_feature(
    tx: &mut Transaction<'_>,
    id: &FeatureId,
    delta: DVec2,
    tolerances: &Tolerances,
) -> EditResult<()> {
    let feature = tx
        .map()
        .feature(id)
        .ok_or_else(|| EditError::UnknownFeature(id.clone()))?;
    if delta == DVec2::ZERO {
        return Ok(());
    }
    let geometry = feature.geometry();
    match geometry {
        Geometry::LineString { ref coordinates, .. } => {
            ensure_editable(tx.map(), id)?;
            let mut severed = Vec::new();
            for index in 0..coordinates.len() {
                let sp = ShapePoint::new(id.clone(), index);
                for other in tx.map().connections_of(&sp, tolerances.epsilon) {
                    severed.push((sp.clone(), other));
                }
            }
            tx.apply(Mutation::SetCoordinates {
                id: id.clone(),
                geometry: geometry.translated(delta),
            })?;
            if tolerances.prune_turn_restrictions_on_disconnect {
                for (sp, other) in &severed {
                    turn_restrictions::prune_between(tx, sp, other)?;
                }
            }
            reconcile_links(tx, std::slice::from_ref(id), tolerances)
        }
        Geometry::Point(_) => {
            tx.apply(Mutation::SetCoordinates {
                id: id.clone(),
                geometry: geometry.translated(delta),
            })?;
            routing::reconcile_place(tx, id, tolerances)
        }
        Geometry::Polygon(_) => tx.apply(Mutation::SetCoordinates {
            id: id.clone(),
            geometry: geometry.translated(delta),
        }),
    }
}
