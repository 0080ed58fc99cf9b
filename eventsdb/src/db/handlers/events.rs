//! The events repository facade.
//!
//! Every operation follows the same shape: open a connection, run the
//! database path, and on connection or query failure consult the fallback
//! policy. Under [`FallbackMode::Silent`] the memory store answers and the
//! failure goes to the log; under [`FallbackMode::Strict`] the error reaches
//! the caller. A [`DbError::NotFound`] is surfaced under both policies —
//! "that event does not exist" is an answer, not a failure to recover from.
//!
//! Likes are adjusted with a single atomic `UPDATE` (`likes + 1`, or
//! `GREATEST(likes - 1, 0)` so the counter floors at zero) rather than a
//! read-modify-write, so concurrent callers cannot lose updates on the
//! database path. The preceding existence check only decides `NotFound` and
//! carries no write dependency.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::Connection;
use sqlx::mysql::MySqlConnection;
use tracing::{debug, instrument, warn};

use crate::config::{Config, FallbackMode};
use crate::db::connection::{ConnectionProvider, MariaDb};
use crate::db::errors::{DbError, Result};
use crate::db::fallback::{LikeChange, MemoryStore};
use crate::db::models::events::{Event, EventCommentRow, EventId, NewEvent};

const LIST_SQL: &str = "SELECT ev.id AS ev_id, ev.title AS ev_title, \
     ev.description AS ev_description, ev.location AS ev_location, \
     ev.likes AS ev_likes, ev.datetime_added AS ev_datetime_added, \
     comm.comment AS comm_comment \
     FROM comments comm INNER JOIN events ev ON comm.fk_event_id = ev.id";

const INSERT_EVENT_SQL: &str = "INSERT INTO events (title, description, location) VALUES (?, ?, ?)";

const INSERT_COMMENT_SQL: &str = "INSERT INTO comments (comment, fk_event_id) VALUES (?, ?)";

const SELECT_LIKES_SQL: &str = "SELECT likes FROM events WHERE id = ?";

const ADD_LIKE_SQL: &str = "UPDATE events SET likes = likes + 1 WHERE id = ?";

const REMOVE_LIKE_SQL: &str = "UPDATE events SET likes = GREATEST(likes - 1, 0) WHERE id = ?";

/// The five-operation repository the application's HTTP layer calls.
///
/// Generic over the [`ConnectionProvider`] so tests can substitute a
/// provider that never connects; production code uses
/// [`Events::from_config`], which wires in [`MariaDb`] and a seeded
/// [`MemoryStore`].
pub struct Events<P = MariaDb> {
    provider: P,
    fallback: Arc<MemoryStore>,
    mode: FallbackMode,
}

impl Events<MariaDb> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            MariaDb::new(&config.database),
            Arc::new(MemoryStore::seeded()),
            config.fallback.mode,
        )
    }
}

impl<P: ConnectionProvider> Events<P> {
    pub fn new(provider: P, fallback: Arc<MemoryStore>, mode: FallbackMode) -> Self {
        Self { provider, fallback, mode }
    }

    /// List all events that have at least one comment.
    ///
    /// The query is an inner join, so an event nobody has commented on does
    /// not appear here at all. That has been the store's behavior since the
    /// beginning and the HTTP layer depends on it.
    #[instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<Event>> {
        let mut conn = match self.provider.connect().await {
            Ok(conn) => conn,
            Err(err) => return self.recover(err, |store| Ok(store.events())),
        };

        match list_db(&mut conn).await {
            Ok(events) => {
                close(conn).await;
                Ok(events)
            }
            Err(err) => {
                drop(conn);
                self.recover(err, |store| Ok(store.events()))
            }
        }
    }

    /// Insert a new event. The store assigns id, likes, and timestamp.
    #[instrument(skip(self, new), fields(title = %new.title), err)]
    pub async fn add_event(&self, new: &NewEvent) -> Result<()> {
        let mut conn = match self.provider.connect().await {
            Ok(conn) => conn,
            Err(err) => {
                return self.recover(err, |store| {
                    store.insert_event(new);
                    Ok(())
                });
            }
        };

        match insert_event_db(&mut conn, new).await {
            Ok(()) => {
                close(conn).await;
                Ok(())
            }
            Err(err) => {
                drop(conn);
                self.recover(err, |store| {
                    store.insert_event(new);
                    Ok(())
                })
            }
        }
    }

    /// Attach a comment to an existing event.
    #[instrument(skip(self, comment), fields(event_id = id), err)]
    pub async fn add_comment(&self, id: EventId, comment: &str) -> Result<()> {
        let mut conn = match self.provider.connect().await {
            Ok(conn) => conn,
            Err(err) => return self.recover(err, |store| store.append_comment(id, comment)),
        };

        match insert_comment_db(&mut conn, id, comment).await {
            Ok(()) => {
                close(conn).await;
                Ok(())
            }
            Err(err) => {
                drop(conn);
                self.recover(err, |store| store.append_comment(id, comment))
            }
        }
    }

    /// Increment an event's likes counter.
    #[instrument(skip(self), err)]
    pub async fn add_like(&self, id: EventId) -> Result<()> {
        self.change_likes(id, LikeChange::Add).await
    }

    /// Decrement an event's likes counter; a counter at zero stays at zero.
    #[instrument(skip(self), err)]
    pub async fn remove_like(&self, id: EventId) -> Result<()> {
        self.change_likes(id, LikeChange::Remove).await
    }

    async fn change_likes(&self, id: EventId, change: LikeChange) -> Result<()> {
        let mut conn = match self.provider.connect().await {
            Ok(conn) => conn,
            Err(err) => return self.recover(err, |store| store.adjust_likes(id, change).map(|_| ())),
        };

        match change_likes_db(&mut conn, id, change).await {
            Ok(()) => {
                close(conn).await;
                Ok(())
            }
            Err(err) => {
                drop(conn);
                self.recover(err, |store| store.adjust_likes(id, change).map(|_| ()))
            }
        }
    }

    /// Apply the fallback policy to a failed database path.
    fn recover<T>(&self, err: DbError, via: impl FnOnce(&MemoryStore) -> Result<T>) -> Result<T> {
        if !err.recoverable() || self.mode == FallbackMode::Strict {
            return Err(err);
        }
        warn!(error = %err, "database path failed, answering from the memory store");
        via(&self.fallback)
    }
}

async fn list_db(conn: &mut MySqlConnection) -> Result<Vec<Event>> {
    let rows = sqlx::query_as::<_, EventCommentRow>(LIST_SQL).fetch_all(&mut *conn).await?;
    debug!(rows = rows.len(), "aggregating joined event rows");
    Ok(aggregate(rows))
}

async fn insert_event_db(conn: &mut MySqlConnection, new: &NewEvent) -> Result<()> {
    sqlx::query(INSERT_EVENT_SQL)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.location)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_comment_db(conn: &mut MySqlConnection, id: EventId, comment: &str) -> Result<()> {
    sqlx::query(INSERT_COMMENT_SQL).bind(comment).bind(id).execute(&mut *conn).await?;
    Ok(())
}

async fn change_likes_db(conn: &mut MySqlConnection, id: EventId, change: LikeChange) -> Result<()> {
    let current: Option<i64> = sqlx::query_scalar(SELECT_LIKES_SQL).bind(id).fetch_optional(&mut *conn).await?;
    if current.is_none() {
        return Err(DbError::NotFound);
    }

    let sql = match change {
        LikeChange::Add => ADD_LIKE_SQL,
        LikeChange::Remove => REMOVE_LIKE_SQL,
    };
    sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    Ok(())
}

/// Fold the flat join rowset into nested events.
///
/// First row for an id constructs the event (with that row's comment as the
/// first entry); later rows for the same id append their comment. Output
/// order is first-appearance order, comment order is row order.
fn aggregate(rows: Vec<EventCommentRow>) -> Vec<Event> {
    let mut position: HashMap<EventId, usize> = HashMap::new();
    let mut events: Vec<Event> = Vec::new();

    for row in rows {
        match position.get(&row.ev_id) {
            Some(&at) => events[at].comments.push(row.comm_comment),
            None => {
                position.insert(row.ev_id, events.len());
                events.push(Event::from(row));
            }
        }
    }

    events
}

/// Close gracefully; the operation's result is already decided, so a close
/// failure is only worth a log line.
async fn close(conn: MySqlConnection) {
    if let Err(err) = conn.close().await {
        debug!(error = %err, "connection did not close cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(ev_id: EventId, comment: &str) -> EventCommentRow {
        EventCommentRow {
            ev_id,
            ev_title: format!("event {ev_id}"),
            ev_description: "something".to_string(),
            ev_location: "somewhere".to_string(),
            ev_likes: 0,
            ev_datetime_added: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap().and_hms_opt(12, 0, 0).unwrap(),
            comm_comment: comment.to_string(),
        }
    }

    #[test]
    fn test_aggregate_groups_rows_by_event_id() {
        let events = aggregate(vec![row(1, "a"), row(1, "b"), row(2, "c")]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 1);
        assert_eq!(events[0].comments, vec!["a", "b"]);
        assert_eq!(events[1].id, 2);
        assert_eq!(events[1].comments, vec!["c"]);
    }

    #[test]
    fn test_aggregate_keeps_first_appearance_order() {
        let events = aggregate(vec![row(7, "x"), row(3, "y"), row(7, "z")]);

        assert_eq!(events.iter().map(|ev| ev.id).collect::<Vec<_>>(), vec![7, 3]);
        assert_eq!(events[0].comments, vec!["x", "z"]);
    }

    #[test]
    fn test_aggregate_carries_event_fields_from_first_row() {
        let events = aggregate(vec![row(1, "a")]);

        assert_eq!(events[0].title, "event 1");
        assert_eq!(events[0].location, "somewhere");
        assert_eq!(events[0].likes, 0);
        assert_eq!(events[0].datetime_added, "2022-02-01 12:00:00");
    }

    #[test]
    fn test_aggregate_empty_rowset() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    // -- facade tests against a provider that never connects --

    struct NoDatabase;

    #[async_trait::async_trait]
    impl ConnectionProvider for NoDatabase {
        async fn connect(&self) -> Result<MySqlConnection> {
            Err(DbError::Unavailable(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))))
        }
    }

    fn offline(mode: FallbackMode) -> Events<NoDatabase> {
        Events::new(NoDatabase, Arc::new(MemoryStore::seeded()), mode)
    }

    fn new_event(title: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: "details tbd".to_string(),
            location: "somewhere".to_string(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_list_falls_back_to_seeded_events() {
        let repo = offline(FallbackMode::Silent);

        let events = repo.list().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "a mock event");
        assert_eq!(events[1].title, "another mock event");
    }

    #[test_log::test(tokio::test)]
    async fn test_add_event_falls_back_to_memory_store() {
        let repo = offline(FallbackMode::Silent);

        repo.add_event(&new_event("third event")).await.unwrap();

        let events = repo.list().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].id, 3);
        assert_eq!(events[2].title, "third event");
        assert_eq!(events[2].likes, 0);
        assert!(events[2].comments.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_add_comment_falls_back_to_memory_store() {
        let repo = offline(FallbackMode::Silent);

        repo.add_comment(1, "nice").await.unwrap();

        let events = repo.list().await.unwrap();
        assert_eq!(events[0].comments.last().map(String::as_str), Some("nice"));
        assert!(events[1].comments.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_add_comment_unknown_id_surfaces_not_found() {
        let repo = offline(FallbackMode::Silent);
        assert!(matches!(repo.add_comment(99, "hello?").await, Err(DbError::NotFound)));
    }

    #[test_log::test(tokio::test)]
    async fn test_likes_floor_at_zero() {
        let repo = offline(FallbackMode::Silent);

        for _ in 0..3 {
            repo.add_like(1).await.unwrap();
        }
        assert_eq!(repo.list().await.unwrap()[0].likes, 3);

        for _ in 0..4 {
            repo.remove_like(1).await.unwrap();
        }
        assert_eq!(repo.list().await.unwrap()[0].likes, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_add_then_remove_like_round_trips() {
        let repo = offline(FallbackMode::Silent);

        repo.add_like(2).await.unwrap();
        let liked = repo.list().await.unwrap()[1].likes;

        repo.add_like(2).await.unwrap();
        repo.remove_like(2).await.unwrap();
        assert_eq!(repo.list().await.unwrap()[1].likes, liked);
    }

    #[test_log::test(tokio::test)]
    async fn test_like_unknown_id_surfaces_not_found() {
        let repo = offline(FallbackMode::Silent);
        assert!(matches!(repo.add_like(42).await, Err(DbError::NotFound)));
        assert!(matches!(repo.remove_like(42).await, Err(DbError::NotFound)));
    }

    #[test_log::test(tokio::test)]
    async fn test_strict_mode_surfaces_unavailable() {
        let repo = offline(FallbackMode::Strict);

        assert!(matches!(repo.list().await, Err(DbError::Unavailable(_))));
        assert!(matches!(repo.add_event(&new_event("nope")).await, Err(DbError::Unavailable(_))));
        assert!(matches!(repo.add_comment(1, "nope").await, Err(DbError::Unavailable(_))));
        assert!(matches!(repo.add_like(1).await, Err(DbError::Unavailable(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_concurrent_fallback_likes_do_not_lose_updates() {
        let repo = Arc::new(offline(FallbackMode::Silent));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let repo = Arc::clone(&repo);
            tasks.spawn(async move { repo.add_like(1).await });
        }
        while let Some(done) = tasks.join_next().await {
            done.unwrap().unwrap();
        }

        assert_eq!(repo.list().await.unwrap()[0].likes, 16);
    }
}
