//! Zentrale Konfiguration des Link-Topologie-Editors.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.
//! Toleranzen sind in Screen-Pixeln angegeben und werden beim Aufruf über
//! den Viewport in Welteinheiten umgerechnet.

use crate::core::{Tolerances, Viewport};
use serde::{Deserialize, Serialize};

// ── Topologie ───────────────────────────────────────────────────────

/// Fangradius für Connect beim Drag (Pixel).
pub const AUTO_CONNECT_SHAPE_DISTANCE: f64 = 80.0;
/// Suchradius der Kreuzungserkennung (Pixel).
pub const X_TEST_MAX_DISTANCE: f64 = 10.0;
/// Koinzidenz-Toleranz für abgeleitete Konnektivität (Welteinheiten).
pub const COINCIDENCE_EPSILON: f64 = 1e-9;

// ── Routing ─────────────────────────────────────────────────────────

/// Radius für die Routing-Punkt-Anbindung (Pixel).
pub const MAX_ROUTING_POINT_DISTANCE: f64 = 50.0;

// ── History ─────────────────────────────────────────────────────────

/// Maximale Anzahl Steps im Undo-Stack.
pub const HISTORY_MAX_DEPTH: usize = 500;

/// Laufzeit-Optionen des Editors (persistiert als TOML).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    // ── Topologie ────────────────────────────────────────────────
    /// Fangradius für Connect beim Drag (Pixel)
    pub auto_connect_shape_distance: f64,
    /// Verschiebung, ab der ein verbundener Shape-Point abreißt (Pixel).
    /// Ohne Wert gilt der Fangradius.
    pub disconnect_shape_distance: Option<f64>,
    /// Suchradius der Kreuzungserkennung (Pixel)
    pub x_test_max_distance: f64,
    /// Koinzidenz-Toleranz (Welteinheiten)
    pub coincidence_epsilon: f64,
    /// Abbiegeverbote zwischen getrennten Links entfernen
    pub prune_turn_restrictions_on_disconnect: bool,

    // ── Routing ──────────────────────────────────────────────────
    /// Radius für Routing-Punkt-Anbindung (Pixel)
    pub max_routing_point_distance: f64,
    /// Places ohne Link in Reichweite ablehnen
    pub require_routing_link: bool,

    // ── Selektion ────────────────────────────────────────────────
    /// Ob ein Klick auf ein Feature selektiert
    pub feature_selection_by_default: bool,

    // ── History ──────────────────────────────────────────────────
    /// Maximale Anzahl Steps im Undo-Stack
    pub history_max_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            auto_connect_shape_distance: AUTO_CONNECT_SHAPE_DISTANCE,
            disconnect_shape_distance: None,
            x_test_max_distance: X_TEST_MAX_DISTANCE,
            coincidence_epsilon: COINCIDENCE_EPSILON,
            prune_turn_restrictions_on_disconnect: true,

            max_routing_point_distance: MAX_ROUTING_POINT_DISTANCE,
            require_routing_link: false,

            feature_selection_by_default: true,

            history_max_depth: HISTORY_MAX_DEPTH,
        }
    }
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Effektiver Disconnect-Abstand in Pixeln.
    pub fn effective_disconnect_distance(&self) -> f64 {
        self.disconnect_shape_distance
            .unwrap_or(self.auto_connect_shape_distance)
    }

    /// Rechnet alle Pixel-Toleranzen über den Viewport in Welteinheiten um.
    pub fn tolerances(&self, viewport: &Viewport) -> Tolerances {
        Tolerances {
            auto_connect: viewport.px_to_world(self.auto_connect_shape_distance),
            disconnect: viewport.px_to_world(self.effective_disconnect_distance()),
            max_routing: viewport.px_to_world(self.max_routing_point_distance),
            crossing: viewport.px_to_world(self.x_test_max_distance),
            epsilon: self.coincidence_epsilon,
            world_per_pixel: viewport.world_per_pixel(),
            prune_turn_restrictions_on_disconnect: self.prune_turn_restrictions_on_disconnect,
            require_routing_link: self.require_routing_link,
        }
    }
}
