//! Explizites Verbinden und Trennen von Shape-Points.

use super::{ensure_editable, Tolerances};
use crate::core::error::EditResult;
use crate::core::reconcile::turn_restrictions;
use crate::core::{ShapePoint, Transaction};
use glam::DVec2;

/// Setzt `shape_point` exakt auf die Position von `target`.
///
/// Bereits koinzidente Shape-Points bleiben unverändert (idempotent, `true`).
/// Ein Shape-Point kann nicht mit seinem eigenen Link verbunden werden (`false`).
pub fn connect_shape_points(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    target: &ShapePoint,
    tolerances: &Tolerances,
) -> EditResult<bool> {
    if shape_point.link == target.link {
        log::debug!("Connect innerhalb von Link {} ignoriert", shape_point.link);
        return Ok(false);
    }
    ensure_editable(tx.map(), &shape_point.link)?;
    let position = tx.map().vertex(target)?;
    let current = tx.map().vertex(shape_point)?;
    if current.distance(position) <= tolerances.epsilon {
        return Ok(true);
    }
    tx.connect(shape_point, target, position)?;
    Ok(true)
}

/// Löst `shape_point` von allen koinzidenten Vertices fremder Links.
///
/// Der Vertex wird um `offset` verschoben, die Nachbarn bleiben liegen.
/// Ohne bestehende Verbindung passiert nichts (`false`).
pub fn disconnect_shape_point(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    offset: DVec2,
    tolerances: &Tolerances,
) -> EditResult<bool> {
    let connections = tx.map().connections_of(shape_point, tolerances.epsilon);
    let Some(first) = connections.first().cloned() else {
        log::debug!("{} ist nicht verbunden", shape_point);
        return Ok(false);
    };
    if offset.length() <= tolerances.epsilon {
        log::debug!("Disconnect von {} ohne Verschiebung ignoriert", shape_point);
        return Ok(false);
    }
    ensure_editable(tx.map(), &shape_point.link)?;
    let position = tx.map().vertex(shape_point)? + offset;
    tx.disconnect(shape_point, &first, position)?;

    if tolerances.prune_turn_restrictions_on_disconnect {
        for other in &connections {
            turn_restrictions::prune_between(tx, shape_point, other)?;
        }
    }
    Ok(true)
}

/// Standard-Verschiebung für ein Disconnect ohne Drag.
///
/// Der Vertex rückt entlang seines eigenen Links auf den Nachbar-Vertex zu,
/// höchstens um den Disconnect-Abstand und höchstens bis zur Segmentmitte.
pub fn default_disconnect_offset(
    tx: &Transaction<'_>,
    shape_point: &ShapePoint,
    tolerances: &Tolerances,
) -> EditResult<DVec2> {
    let link = tx.map().require_link(&shape_point.link)?;
    let position = tx.map().vertex(shape_point)?;
    let neighbor = if shape_point.index + 1 < link.len() {
        link.coordinates[shape_point.index + 1]
    } else {
        link.coordinates[shape_point.index - 1]
    };
    let direction = neighbor - position;
    let length = direction.length();
    if length <= f64::EPSILON {
        return Ok(DVec2::ZERO);
    }
    let step = tolerances.disconnect.min(length * 0.5);
    Ok(direction / length * step)
}
