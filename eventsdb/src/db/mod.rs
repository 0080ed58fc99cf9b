//! Database layer for the events application.
//!
//! This module implements the data access layer using SQLx with MariaDB,
//! plus the in-memory fallback store that keeps the application answering
//! when the database is unreachable.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  (HTTP request handlers, out of this crate)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐      connect ok      ┌──────────────┐
//! │    Events    │ ───────────────────→ │   MariaDB    │
//! │   (facade)   │                      └──────────────┘
//! └──────┬───────┘
//!        │ connect / query failed
//!        ↓
//! ┌──────────────┐
//! │ MemoryStore  │  (seeded fallback dataset)
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: the repository facade and the read-path row aggregation
//! - [`models`]: record structures for events, comments, and join rows
//! - [`connection`]: per-operation connection establishment
//! - [`fallback`]: the in-memory substitute dataset
//! - [`errors`]: the [`DbError`](errors::DbError) taxonomy
//!
//! # Connections
//!
//! There is no pool. Every facade operation asks its
//! [`ConnectionProvider`](connection::ConnectionProvider) for one fresh
//! connection, uses it for the operation's statements, and closes it before
//! returning. A connection is never held across operations or shared between
//! concurrent calls.

pub mod connection;
pub mod errors;
pub mod fallback;
pub mod handlers;
pub mod models;
