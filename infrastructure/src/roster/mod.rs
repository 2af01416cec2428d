//! Roster loading
//!
//! Personas and lesson plans come from JSON files authored outside this
//! system; loading them is plain I/O plus id sanitization.

mod loader;

pub use loader::{sanitize_persona_id, RosterError, RosterLoader};
