//! HTTP API for the counseling session
//!
//! The UI-facing surface: submit, reset, persona selection and read access.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::persona::Roster;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub roster: Arc<Roster>,
}

impl AppState {
    pub fn new(session: SessionHandle, roster: Roster) -> Self {
        Self {
            session,
            roster: Arc::new(roster),
        }
    }
}
