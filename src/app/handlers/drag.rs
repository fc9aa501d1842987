//! Handler für den Drag-Lifecycle.

use crate::app::use_cases;
use crate::app::EditSession;
use crate::core::{FeatureId, ShapePoint};
use glam::DVec2;

/// Startet einen Shape-Drag.
pub fn begin(session: &mut EditSession, shape_point: ShapePoint) -> anyhow::Result<()> {
    use_cases::drag::begin_drag(session, shape_point)?;
    Ok(())
}

/// Verarbeitet einen Drag-Frame.
pub fn frame(session: &mut EditSession, delta_px: DVec2) -> anyhow::Result<()> {
    use_cases::drag::drag_frame(session, delta_px)?;
    Ok(())
}

/// Schließt den Shape-Drag ab.
pub fn end(session: &mut EditSession) -> anyhow::Result<()> {
    use_cases::drag::end_drag(session)?;
    Ok(())
}

/// Bricht den Shape-Drag ab.
pub fn cancel(session: &mut EditSession) {
    use_cases::drag::cancel_drag(session);
}

/// Zieht einen Shape-Point in einem Schritt.
pub fn shape(session: &mut EditSession, shape_point: ShapePoint, delta_px: DVec2) -> anyhow::Result<()> {
    use_cases::drag::drag_shape(session, shape_point, delta_px)?;
    Ok(())
}

/// Verschiebt ein ganzes Feature.
pub fn feature(session: &mut EditSession, id: &FeatureId, delta_px: DVec2) -> anyhow::Result<()> {
    use_cases::drag::drag_feature(session, id, delta_px)?;
    Ok(())
}
