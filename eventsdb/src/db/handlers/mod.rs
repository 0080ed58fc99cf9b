//! Repository implementations for database access.
//!
//! One repository lives here: [`events::Events`], the facade the HTTP layer
//! calls. It owns the decision between the database path and the fallback
//! store; callers never see that choice being made (under the default
//! policy).

pub mod events;

pub use events::Events;
