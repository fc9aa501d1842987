//! 2D-Viewport für die Umrechnung zwischen Screen-Pixeln und Welt-Einheiten.
//!
//! Alle Toleranzen (Snap, Disconnect, Kreuzungen, Routing) sind in Pixeln
//! konfiguriert und werden zum Aufrufzeitpunkt über den Viewport umgerechnet.

use glam::DVec2;

/// Viewport mit Pan und Zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Weltposition der Bildschirm-Mitte
    pub center: DVec2,
    /// Zoom-Level (1.0 = ein Pixel pro Welteinheit)
    pub zoom: f64,
    /// Größe des Viewports in Pixeln
    pub size: DVec2,
}

impl Viewport {
    /// Minimaler Zoom-Faktor.
    pub const ZOOM_MIN: f64 = 1e-6;
    /// Maximaler Zoom-Faktor.
    pub const ZOOM_MAX: f64 = 1e9;

    /// Erstellt einen Viewport, dessen linke obere Ecke im Welt-Ursprung liegt.
    ///
    /// Bei Zoom 1.0 entsprechen Pixel-Koordinaten damit Welt-Koordinaten.
    pub fn new(size: DVec2) -> Self {
        Self {
            center: size * 0.5,
            zoom: 1.0,
            size,
        }
    }

    /// Zentriert den Viewport auf einen Punkt.
    pub fn look_at(&mut self, target: DVec2) {
        self.center = target;
    }

    /// Verschiebt den Viewport um ein Pixel-Delta.
    pub fn pan(&mut self, delta_px: DVec2) {
        self.center += delta_px * self.world_per_pixel();
    }

    /// Ändert den Zoom-Level.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
    }

    /// Welt-Einheiten pro Screen-Pixel.
    pub fn world_per_pixel(&self) -> f64 {
        1.0 / self.zoom
    }

    /// Rechnet eine Pixel-Distanz in Welt-Einheiten um.
    pub fn px_to_world(&self, px: f64) -> f64 {
        px * self.world_per_pixel()
    }

    /// Rechnet eine Welt-Distanz in Pixel um.
    pub fn world_to_px(&self, distance: f64) -> f64 {
        distance * self.zoom
    }

    /// Konvertiert Screen-Koordinaten zu Welt-Koordinaten.
    pub fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        self.center + (screen - self.size * 0.5) * self.world_per_pixel()
    }

    /// Konvertiert Welt-Koordinaten zu Screen-Koordinaten.
    pub fn world_to_screen(&self, world: DVec2) -> DVec2 {
        (world - self.center) * self.zoom + self.size * 0.5
    }

    /// Sichtbarer Weltbereich (min, max).
    pub fn visible_world_rect(&self) -> (DVec2, DVec2) {
        (
            self.screen_to_world(DVec2::ZERO),
            self.screen_to_world(self.size),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DVec2::new(1280.0, 720.0))
    }
}
