//! Topologie-Operationen auf der NetworkMap.
//!
//! Alle Operationen arbeiten auf einer offenen `Transaction`; der Aufrufer
//! entscheidet über Commit oder Rollback.

mod connect;
mod crossings;
mod drag;
mod merge;
mod split;

pub use connect::{connect_shape_points, default_disconnect_offset, disconnect_shape_point};
pub use crossings::{check_crossings, Crossing, CrossingKind};
pub use drag::{drag_feature, ShapeDrag};
pub use merge::{merge_candidates, merge_links, MergeCandidate};
pub use split::split_link;

use super::error::{EditError, EditResult};
use super::{FeatureId, NetworkMap};

/// Toleranzen einer Operation in Welteinheiten.
///
/// Wird aus den Pixel-Optionen und dem aktuellen Viewport berechnet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Fangradius für Connect beim Drag
    pub auto_connect: f64,
    /// Verschiebung, ab der ein verbundener Shape-Point abreißt
    pub disconnect: f64,
    /// Radius für Routing-Punkt-Anbindung
    pub max_routing: f64,
    /// Suchradius der Kreuzungserkennung
    pub crossing: f64,
    /// Koinzidenz-Toleranz für abgeleitete Konnektivität
    pub epsilon: f64,
    /// Welteinheiten pro Pixel (für Distanzangaben in Pixeln)
    pub world_per_pixel: f64,
    /// Abbiegeverbote beim Disconnect bereinigen
    pub prune_turn_restrictions_on_disconnect: bool,
    /// Places ohne erreichbaren Link ablehnen
    pub require_routing_link: bool,
}

impl Tolerances {
    /// Rechnet eine Welt-Distanz in Pixel um.
    pub fn to_px(&self, distance: f64) -> f64 {
        if self.world_per_pixel > 0.0 {
            distance / self.world_per_pixel
        } else {
            distance
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            auto_connect: 80.0,
            disconnect: 80.0,
            max_routing: 50.0,
            crossing: 10.0,
            epsilon: 1e-9,
            world_per_pixel: 1.0,
            prune_turn_restrictions_on_disconnect: true,
            require_routing_link: false,
        }
    }
}

/// Vergibt temporäre Client-IDs (`tmp-<n>`) bis zum nächsten Submit.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Nächste freie temporäre ID, die in `map` noch nicht vorkommt.
    pub fn allocate(&mut self, map: &NetworkMap) -> FeatureId {
        loop {
            let id = FeatureId::temporary(self.next);
            self.next += 1;
            if !map.contains(&id) {
                return id;
            }
        }
    }

    /// Setzt den Zähler zurück (nach erfolgreichem Submit).
    pub fn reset(&mut self) {
        self.next = 1;
    }
}

/// Fehler, falls der Link nicht editierbar ist.
pub(crate) fn ensure_editable(map: &NetworkMap, link: &FeatureId) -> EditResult<()> {
    if map.require_link(link)?.editable {
        Ok(())
    } else {
        Err(EditError::NotEditable(link.clone()))
    }
}
