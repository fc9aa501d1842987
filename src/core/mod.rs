//! Core-Domänentypen: Features, NetworkMap, Spatial-Index, Viewport,
//! Mutationen sowie Topologie- und Abgleich-Operationen.

pub mod error;
pub mod feature;
pub mod geometry;
/// Invertierbare Mutationen und Transaktionen
///
/// Jede Änderung läuft über eine `Transaction`, die pro Mutation die
/// Inverse aufzeichnet und sich zu einem `Step` abschließen lässt.
pub mod mutation;
pub mod network_map;
pub mod reconcile;
pub mod spatial;
pub mod topology;
pub mod viewport;

pub use error::{EditError, EditResult};
pub use feature::{
    Area, Feature, FeatureId, FeatureKind, Geometry, Link, LinkEnd, Place, PlaceKind,
    Properties, RoutingPoint, ShapePoint, TurnRestriction,
};
pub use mutation::{ChangeSet, FeatureChange, Mutation, Property, Step, Transaction};
pub use network_map::{LinkProjection, NetworkMap};
pub use spatial::{PlaceMatch, SpatialIndex, VertexMatch};
pub use topology::{
    Crossing, CrossingKind, IdAllocator, MergeCandidate, ShapeDrag, Tolerances,
};
pub use viewport::Viewport;
