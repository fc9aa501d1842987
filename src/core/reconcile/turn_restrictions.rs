//! Referenzpflege der Abbiegeverbote.

use crate::core::error::EditResult;
use crate::core::{FeatureId, LinkEnd, Property, ShapePoint, Transaction, TurnRestriction};
use glam::DVec2;

/// Entfernt alle Referenzen auf einen entfernten Link.
pub fn remove_references(tx: &mut Transaction<'_>, removed: &FeatureId) -> EditResult<()> {
    for link_id in tx.map().links_restricting(removed) {
        update(tx, &link_id, |restriction| {
            restriction.remove(removed);
        })?;
    }
    Ok(())
}

/// Zeigt Referenzen auf einen geteilten Link auf den Teil, der den
/// jeweiligen Verknüpfungspunkt behalten hat.
///
/// `parts` enthält (Teil-ID, Start, Ende) der entstandenen Links.
pub fn repoint_after_split(
    tx: &mut Transaction<'_>,
    original: &FeatureId,
    parts: &[(FeatureId, DVec2, DVec2)],
    epsilon: f64,
) -> EditResult<()> {
    for link_id in tx.map().links_restricting(original) {
        let Some(link) = tx.map().link(&link_id) else {
            continue;
        };
        let mut restriction = link.turn_restriction.clone();
        for end in [LinkEnd::Start, LinkEnd::End] {
            if !restriction.side(end).contains(original) {
                continue;
            }
            let junction = link.coordinates[link.end_index(end)];
            let replacement = parts
                .iter()
                .find(|(_, start, stop)| {
                    start.distance(junction) <= epsilon || stop.distance(junction) <= epsilon
                })
                .map(|(id, _, _)| id.clone());
            match replacement {
                Some(part) => {
                    restriction.repoint(end, original, &part);
                }
                None => {
                    log::debug!(
                        "Abbiegeverbot {} -> {} ohne Verknüpfungspunkt entfernt",
                        link_id,
                        original
                    );
                    restriction.remove_at(end, original);
                }
            }
        }
        if restriction != link.turn_restriction {
            tx.set_property(&link_id, Property::TurnRestriction(restriction))?;
        }
    }
    Ok(())
}

/// Ersetzt Referenzen auf zusammengeführte Links durch den neuen Link.
pub fn repoint_after_merge(
    tx: &mut Transaction<'_>,
    merged_from: &[FeatureId],
    merged: &FeatureId,
) -> EditResult<()> {
    let mut affected: Vec<FeatureId> = merged_from
        .iter()
        .flat_map(|id| tx.map().links_restricting(id))
        .collect();
    affected.sort_unstable();
    affected.dedup();

    for link_id in affected {
        update(tx, &link_id, |restriction| {
            for end in [LinkEnd::Start, LinkEnd::End] {
                for old in merged_from {
                    restriction.repoint(end, old, merged);
                }
            }
        })?;
    }
    Ok(())
}

/// Entfernt die gegenseitigen Abbiegeverbote zweier getrennter Shape-Points.
///
/// Nur Endpunkte tragen Abbiegeverbote; innere Vertices werden ignoriert.
pub fn prune_between(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    other: &ShapePoint,
) -> EditResult<()> {
    prune_side(tx, shape_point, &other.link)?;
    prune_side(tx, other, &shape_point.link)
}

fn prune_side(
    tx: &mut Transaction<'_>,
    shape_point: &ShapePoint,
    other_link: &FeatureId,
) -> EditResult<()> {
    let Some(end) = tx
        .map()
        .link(&shape_point.link)
        .and_then(|l| l.end_at(shape_point.index))
    else {
        return Ok(());
    };
    update(tx, &shape_point.link, |restriction| {
        restriction.remove_at(end, other_link);
    })
}

fn update(
    tx: &mut Transaction<'_>,
    link_id: &FeatureId,
    edit: impl FnOnce(&mut TurnRestriction),
) -> EditResult<()> {
    let current = tx.map().require_link(link_id)?.turn_restriction.clone();
    let mut restriction = current.clone();
    edit(&mut restriction);
    if restriction == current {
        return Ok(());
    }
    tx.set_property(link_id, Property::TurnRestriction(restriction))
}
