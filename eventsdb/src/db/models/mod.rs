//! Record models for the events schema.
//!
//! Structs here map directly onto the `events` and `comments` tables and the
//! join projection the read path selects. They are shared by the database
//! path and the in-memory fallback store, so the two stay shape-compatible.

pub mod events;
