//! # eventsdb: data-access layer for the events application
//!
//! `eventsdb` sits between the application's HTTP handlers and its MariaDB
//! store. It fetches events together with their comments, inserts new events
//! and comments, and adjusts a per-event "likes" counter. Its defining
//! behavior is the fallback policy: when no database connection can be opened,
//! or a query fails, operations recover to an in-memory dataset so callers
//! still receive a normal-looking response.
//!
//! ## Overview
//!
//! The crate is built around four pieces:
//!
//! - [`db::connection::ConnectionProvider`]: opens one fresh connection per
//!   operation. Failure to connect is an explicit [`DbError::Unavailable`],
//!   never a panic or a swallowed exception.
//! - [`db::handlers::events::Events`]: the repository facade with the five
//!   operations the application calls ([`list`](Events::list),
//!   [`add_event`](Events::add_event), [`add_comment`](Events::add_comment),
//!   [`add_like`](Events::add_like), [`remove_like`](Events::remove_like)).
//! - [`db::fallback::MemoryStore`]: the in-memory substitute dataset, seeded
//!   with two sample events and shared behind an `Arc`. All fallback mutation
//!   happens under its mutex, so concurrent fallback writes cannot lose
//!   updates.
//! - The row aggregator in [`db::handlers::events`]: the read path selects an
//!   inner join of events and comments (one row per event x comment) and
//!   folds it into nested [`Event`] records, one per distinct event id, with
//!   comments in row order. Events without comments do not appear in the
//!   joined result; that is the store's long-standing behavior and is kept.
//!
//! Whether fallback is silent is a policy decision, not an accident of error
//! handling: [`FallbackMode::Silent`] (the default) recovers and logs the
//! cause, [`FallbackMode::Strict`] surfaces connection and query errors to
//! the caller. A lookup miss ([`DbError::NotFound`]) is surfaced under both.
//!
//! ## Usage
//!
//! ```no_run
//! use eventsdb::{Config, Events, NewEvent};
//!
//! # async fn example() -> eventsdb::Result<()> {
//! let config = Config::load().expect("invalid configuration");
//! let repo = Events::from_config(&config);
//!
//! repo.add_event(&NewEvent {
//!     title: "launch party".into(),
//!     description: "snacks provided".into(),
//!     location: "the roof".into(),
//! })
//! .await?;
//!
//! for event in repo.list().await? {
//!     println!("{} ({} likes)", event.title, event.likes);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;

pub use config::{Config, FallbackMode};
pub use db::connection::{ConnectionProvider, MariaDb};
pub use db::errors::{DbError, Result};
pub use db::fallback::MemoryStore;
pub use db::handlers::events::Events;
pub use db::models::events::{Event, EventId, NewEvent};
