//! SeaORM persistence models
//!
//! Hand-written entities matching the schema created by
//! `crate::database::migrations`. Enum-ish columns (`section`, `kind`) are
//! stored as strings and converted to the domain enums at the repository
//! boundary.

pub mod categories;
pub mod channels;
pub mod epg_programs;
pub mod playlists;
pub mod prelude;
pub mod vod_titles;
pub mod watch_progress;
