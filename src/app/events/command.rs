use crate::core::{FeatureId, PlaceKind, Properties, ShapePoint, TurnRestriction};
use glam::DVec2;

/// Commands sind mutierende Schritte, die zentral ausgeführt werden.
///
/// Positionen sind Weltkoordinaten, Gesten-Deltas und Radien Pixel.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Feature per ID selektieren
    Select { id: FeatureId },
    /// Feature unter dem Cursor selektieren
    SelectAt { position: DVec2, radius_px: f64 },
    /// Selektion aufheben
    Unselect,

    /// Drag-Lifecycle Start: Shape-Point greifen
    BeginDrag { shape_point: ShapePoint },
    /// Drag-Lifecycle Update: um Pixel-Delta weiterziehen
    DragFrame { delta_px: DVec2 },
    /// Drag-Lifecycle Ende: Step abschließen
    EndDrag,
    /// Drag abbrechen und Ausgangszustand wiederherstellen
    CancelDrag,
    /// Shape-Point in einem Schritt ziehen
    DragShape {
        shape_point: ShapePoint,
        delta_px: DVec2,
    },
    /// Ganzes Feature verschieben
    DragFeature { id: FeatureId, delta_px: DVec2 },

    /// Vertex in einen Link einfügen (ohne Index: nächstes Segment)
    AddShape {
        link: FeatureId,
        vertex: DVec2,
        index: Option<usize>,
    },
    /// Vertex aus einem Link entfernen
    RemoveShape { shape_point: ShapePoint },
    /// Shape-Point auf einen fremden Vertex setzen
    Connect {
        shape_point: ShapePoint,
        target: ShapePoint,
    },
    /// Shape-Point von seinen Nachbarn lösen
    Disconnect { shape_point: ShapePoint },
    /// Link an einem inneren Shape-Point teilen
    SplitLink { shape_point: ShapePoint },
    /// Kreuzung Nr. `index` aus einer frischen Prüfung verbinden
    ConnectCrossing { link: FeatureId, index: usize },
    /// Zwei Links an einem gemeinsamen Endpunkt zusammenführen
    MergeLinks { first: FeatureId, second: FeatureId },

    /// Neuen Link anlegen
    AddLink {
        coordinates: Vec<DVec2>,
        properties: Properties,
    },
    /// Neuen POI bzw. neue Adresse anlegen
    AddPlace {
        kind: PlaceKind,
        position: DVec2,
        properties: Properties,
    },
    /// Neue Fläche anlegen
    AddArea {
        rings: Vec<Vec<DVec2>>,
        properties: Properties,
    },
    /// Feature löschen
    RemoveFeature { id: FeatureId },
    /// Freies Attribut setzen (`None` = entfernen)
    SetAttribute {
        id: FeatureId,
        key: String,
        value: Option<serde_json::Value>,
    },
    /// Abbiegeverbote eines Links ersetzen
    SetTurnRestriction {
        link: FeatureId,
        restriction: TurnRestriction,
    },
    /// Z-Level eines Links ersetzen
    SetZLevels {
        link: FeatureId,
        z_levels: Option<Vec<i32>>,
    },
    /// Editierbar-Flag eines Links setzen
    SetEditable { link: FeatureId, editable: bool },

    /// Schritte rückgängig machen
    Undo { steps: usize },
    /// Schritte wiederherstellen
    Redo { steps: usize },
    /// Alle ungespeicherten Änderungen verwerfen
    Revert,

    /// Viewport um Pixel-Delta verschieben
    PanViewport { delta_px: DVec2 },
    /// Viewport zoomen
    ZoomViewport { factor: f64 },
}

impl EditCommand {
    /// Strukturelle Commands werden bei `ready == false` aufgestaut statt verworfen.
    ///
    /// Drag-Gesten und Selektion gehören nicht dazu: sie sind ohne `ready`
    /// wirkungslos.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            EditCommand::Select { .. }
                | EditCommand::SelectAt { .. }
                | EditCommand::Unselect
                | EditCommand::BeginDrag { .. }
                | EditCommand::DragFrame { .. }
                | EditCommand::EndDrag
                | EditCommand::CancelDrag
                | EditCommand::DragShape { .. }
                | EditCommand::DragFeature { .. }
                | EditCommand::PanViewport { .. }
                | EditCommand::ZoomViewport { .. }
        )
    }
}
