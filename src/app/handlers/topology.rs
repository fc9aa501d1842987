//! Handler für Topologie-Operationen.

use crate::app::use_cases;
use crate::app::EditSession;
use crate::core::{FeatureId, ShapePoint};
use anyhow::Context;

/// Verbindet zwei Shape-Points.
pub fn connect(
    session: &mut EditSession,
    shape_point: &ShapePoint,
    target: &ShapePoint,
) -> anyhow::Result<()> {
    use_cases::topology::connect(session, shape_point, target)?;
    Ok(())
}

/// Löst einen Shape-Point von seinen Nachbarn.
pub fn disconnect(session: &mut EditSession, shape_point: &ShapePoint) -> anyhow::Result<()> {
    use_cases::topology::disconnect(session, shape_point)?;
    Ok(())
}

/// Teilt einen Link.
pub fn split(session: &mut EditSession, shape_point: &ShapePoint) -> anyhow::Result<()> {
    use_cases::topology::split_link(session, shape_point)
        .with_context(|| format!("Split an {} fehlgeschlagen", shape_point))?;
    Ok(())
}

/// Verbindet die `index`-te Kreuzung einer frischen Prüfung.
pub fn connect_crossing(session: &mut EditSession, link: &FeatureId, index: usize) -> anyhow::Result<()> {
    let crossings = use_cases::topology::check_crossings(session, link)?;
    let Some(crossing) = crossings.get(index) else {
        log::debug!("{} hat keine Kreuzung Nr. {}", link, index);
        return Ok(());
    };
    use_cases::topology::connect_crossing(session, crossing)?;
    Ok(())
}

/// Führt zwei Links zusammen.
pub fn merge(session: &mut EditSession, first: &FeatureId, second: &FeatureId) -> anyhow::Result<()> {
    if use_cases::topology::merge_links(session, first, second)?.is_none() {
        log::debug!("{} und {} nicht zusammengeführt", first, second);
    }
    Ok(())
}
