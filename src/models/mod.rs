//! Data models for the highline backend.
//!
//! Field names serialize as camelCase to match the map client.

mod location;
mod photo;
mod spot;

pub use location::*;
pub use photo::*;
pub use spot::*;
