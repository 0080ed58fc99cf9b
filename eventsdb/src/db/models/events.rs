//! Event and comment records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier assigned by the store (auto-increment in MariaDB, position in
/// the memory store).
pub type EventId = i64;

/// An event with its comments nested inline.
///
/// `datetime_added` stays a string at this boundary: the HTTP layer renders
/// it verbatim, and the seeded fallback rows carry a fixed literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Never negative; decrements floor at zero.
    pub likes: i64,
    pub datetime_added: String,
    /// Comment texts in insertion order.
    pub comments: Vec<String>,
}

/// Fields the caller supplies when creating an event. The store assigns id,
/// likes, and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
}

/// One row of the events x comments join: the full event projection plus a
/// single comment. The read path aggregates these into [`Event`]s.
#[derive(Debug, Clone, FromRow)]
pub struct EventCommentRow {
    pub ev_id: EventId,
    pub ev_title: String,
    pub ev_description: String,
    pub ev_location: String,
    pub ev_likes: i64,
    pub ev_datetime_added: NaiveDateTime,
    pub comm_comment: String,
}

impl From<EventCommentRow> for Event {
    /// Start an event off its first joined row, with that row's comment as
    /// the first entry.
    fn from(row: EventCommentRow) -> Self {
        Self {
            id: row.ev_id,
            title: row.ev_title,
            description: row.ev_description,
            location: row.ev_location,
            likes: row.ev_likes,
            datetime_added: row.ev_datetime_added.format("%Y-%m-%d %H:%M:%S").to_string(),
            comments: vec![row.comm_comment],
        }
    }
}
