//! Strukturelle Fehler des Geometrie-Graphen und der Topologie-Operationen.

use super::FeatureId;

/// Verletzung einer Graph-Invariante.
///
/// Aus Sicht der Session sind das Programmierfehler: die betroffene Operation
/// wird komplett zurückgerollt, der Graph bleibt unverändert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Index {index} ausserhalb von Link {link} (Laenge {len})")]
    InvalidIndex {
        link: FeatureId,
        index: usize,
        len: usize,
    },

    #[error("Link {link} braucht mindestens 2 Vertices")]
    MinimumVertexCount { link: FeatureId },

    #[error("Z-Level-Anzahl {actual} passt nicht zu {expected} Vertices von Link {link}")]
    ZLevelLengthMismatch {
        link: FeatureId,
        expected: usize,
        actual: usize,
    },

    #[error("Link {link} kann nicht am Endpunkt {index} geteilt werden")]
    SplitAtEndpoint { link: FeatureId, index: usize },

    #[error("Doppelter aufeinanderfolgender Vertex {index} in Link {link}")]
    DuplicateConsecutiveVertex { link: FeatureId, index: usize },

    #[error("Feature {0} existiert nicht")]
    UnknownFeature(FeatureId),

    #[error("Feature {0} existiert bereits")]
    DuplicateFeature(FeatureId),

    #[error("Feature {0} ist kein Link")]
    NotALink(FeatureId),

    #[error("Link {0} ist nicht editierbar")]
    NotEditable(FeatureId),
}

/// Kurzform für Ergebnisse der Core-Operationen.
pub type EditResult<T> = Result<T, EditError>;
