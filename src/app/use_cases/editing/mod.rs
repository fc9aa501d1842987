//! Use-Case-Funktionen für Feature-Editing.
//!
//! Aufgeteilt nach Operation:
//! - `add_feature`: Links, Places und Flächen anlegen
//! - `remove_feature`: Features löschen
//! - `shapes`: Vertices einfügen, entfernen, Geometrie ersetzen
//! - `properties`: Attribute, Abbiegeverbote, Z-Level, Editierbar-Flag

mod add_feature;
mod properties;
mod remove_feature;
mod shapes;

pub use add_feature::{add_area, add_link, add_place};
pub use properties::{set_attribute, set_editable, set_turn_restriction, set_z_levels};
pub use remove_feature::remove_feature;
pub use shapes::{add_shape, remove_shape, set_area_rings, set_coordinates};
