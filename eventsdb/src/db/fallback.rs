//! In-memory substitute dataset, served when the database path fails.
//!
//! One [`MemoryStore`] is constructed per process (seeded with two sample
//! events) and shared with the facade behind an `Arc`. It is not a cache:
//! nothing written here ever reaches the database, and nothing read from the
//! database is written back here. It only keeps the application answering.
//!
//! All mutation goes through the store's mutex, so concurrent fallback
//! writes to the same event cannot lose updates. The guard is never held
//! across an await point.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::db::errors::{DbError, Result};
use crate::db::models::events::{Event, EventId, NewEvent};

/// Direction of a likes adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Add,
    Remove,
}

impl LikeChange {
    /// The counter value after this change. Removals floor at zero.
    pub fn apply(self, likes: i64) -> i64 {
        match self {
            Self::Add => likes + 1,
            Self::Remove => (likes - 1).max(0),
        }
    }
}

/// The fallback event list.
pub struct MemoryStore {
    events: Mutex<Vec<Event>>,
}

impl MemoryStore {
    /// The dataset every process starts with: two sample events, no
    /// comments, no likes.
    pub fn seeded() -> Self {
        Self::with_events(vec![
            Event {
                id: 1,
                title: "a mock event".to_string(),
                description: "something really cool".to_string(),
                location: "Chez Joe Pizza".to_string(),
                likes: 0,
                datetime_added: "2022-02-01:12:00".to_string(),
                comments: Vec::new(),
            },
            Event {
                id: 2,
                title: "another mock event".to_string(),
                description: "something even cooler".to_string(),
                location: "Chez John Pizza".to_string(),
                likes: 0,
                datetime_added: "2022-02-01:12:00".to_string(),
                comments: Vec::new(),
            },
        ])
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self { events: Mutex::new(events) }
    }

    /// Snapshot of the current event list.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Append a new event, assigning the next positional id.
    pub fn insert_event(&self, new: &NewEvent) -> Event {
        let mut events = self.lock();
        let event = Event {
            id: events.len() as EventId + 1,
            title: new.title.clone(),
            description: new.description.clone(),
            location: new.location.clone(),
            likes: 0,
            datetime_added: Utc::now().to_rfc2822(),
            comments: Vec::new(),
        };
        events.push(event.clone());
        debug!(event_id = event.id, "event stored in memory");
        event
    }

    /// Append a comment to the event with the given id.
    pub fn append_comment(&self, id: EventId, comment: &str) -> Result<()> {
        let mut events = self.lock();
        let event = events.iter_mut().find(|ev| ev.id == id).ok_or(DbError::NotFound)?;
        event.comments.push(comment.to_string());
        Ok(())
    }

    /// Adjust the likes counter for the event with the given id, returning
    /// the new value.
    pub fn adjust_likes(&self, id: EventId, change: LikeChange) -> Result<i64> {
        let mut events = self.lock();
        let event = events.iter_mut().find(|ev| ev.id == id).ok_or(DbError::NotFound)?;
        event.likes = change.apply(event.likes);
        Ok(event.likes)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        // A poisoned store is still the better answer: the alternative is
        // failing the request the fallback exists to save.
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
