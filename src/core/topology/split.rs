//! Teilen eines Links an einem inneren Shape-Point.

use super::{ensure_editable, IdAllocator, Tolerances};
use crate::core::error::{EditError, EditResult};
use crate::core::reconcile::{routing, turn_restrictions};
use crate::core::{Feature, FeatureId, Link, ShapePoint, Transaction};

/// Teilt den Link an `shape_point` (`0 < index < len - 1`) in zwei neue Links.
///
/// Beide Teile erben Attribute und Abbiegeverbote unverändert, `parent_link`
/// zeigt auf den Original-Link, `origin_link` auf den Anfang der Split-Kette.
/// Der Original-Link wird entfernt, Abhängige werden umgehängt.
pub fn split_link(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    ids: &mut IdAllocator,
    tolerances: &Tolerances,
) -> EditResult<(FeatureId, FeatureId)> {
    ensure_editable(tx.map(), &shape_point.link)?;
    let original = tx.map().require_link(&shape_point.link)?.clone();
    let index = shape_point.index;
    if index >= original.len() {
        return Err(EditError::InvalidIndex {
            link: original.id.clone(),
            index,
            len: original.len(),
        });
    }
    if index == 0 || index == original.len() - 1 {
        return Err(EditError::SplitAtEndpoint {
            link: original.id.clone(),
            index,
        });
    }

    let first_id = ids.allocate(tx.map());
    let first = part_of(&original, first_id.clone(), 0..index + 1);
    tx.remove_feature(&original.id)?;
    let second_id = ids.allocate(tx.map());
    let second = part_of(&original, second_id.clone(), index..original.len());

    let parts = [
        (
            first_id.clone(),
            first.coordinates[0],
            first.coordinates[first.len() - 1],
        ),
        (
            second_id.clone(),
            second.coordinates[0],
            second.coordinates[second.len() - 1],
        ),
    ];
    tx.add_feature(Feature::Link(first))?;
    tx.add_feature(Feature::Link(second))?;

    turn_restrictions::repoint_after_split(tx, &original.id, &parts, tolerances.epsilon)?;
    routing::reassign_to_parts(tx, &original.id, &[first_id.clone(), second_id.clone()])?;

    log::info!(
        "Link {} bei Index {} in {} und {} geteilt",
        original.id,
        index,
        first_id,
        second_id
    );
    Ok((first_id, second_id))
}

fn part_of(original: &Link, id: FeatureId, range: std::ops::Range<usize>) -> Link {
    Link {
        id,
        coordinates: original.coordinates[range.clone()].to_vec(),
        z_levels: original.z_levels.as_ref().map(|z| z[range].to_vec()),
        editable: original.editable,
        turn_restriction: original.turn_restriction.clone(),
        origin_link: Some(
            original
                .origin_link
                .clone()
                .unwrap_or_else(|| original.id.clone()),
        ),
        parent_link: Some(original.id.clone()),
        properties: original.properties.clone(),
    }
}
