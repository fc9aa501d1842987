//! Abgleich abhängiger Objekte (Routing-Punkte, Abbiegeverbote) nach
//! strukturellen Änderungen an Links.

pub mod routing;
pub mod turn_restrictions;

use super::error::EditResult;
use super::topology::Tolerances;
use super::{FeatureId, Transaction};

/// Gleicht alle Abhängigen der übergebenen Links ab.
///
/// Existiert ein Link noch, werden Routing-Punkte neu projiziert; wurde er
/// entfernt, werden Routing-Punkte umgehängt oder gelöscht und Abbiegeverbote
/// bereinigt.
pub fn reconcile_links(
    tx: &mut Transaction<'_>,
    links: &[FeatureId],
    tolerances: &Tolerances,
) -> EditResult<()> {
    for link in links {
        if tx.map().link(link).is_some() {
            routing::reconcile_link_geometry(tx, link, tolerances)?;
        } else {
            routing::reconcile_link_removed(tx, link, tolerances)?;
            turn_restrictions::remove_references(tx, link)?;
        }
    }
    Ok(())
}
