pub mod cli;
pub mod config;
pub mod controller;
pub mod event;
pub mod grid;
pub mod navigation;
pub mod placement;
pub mod render;
pub mod session;
pub mod store;

pub use config::CalendarConfig;
pub use controller::{CalendarController, CalendarSnapshot, ControllerPhase};
pub use event::{Event, EventColor, EventDraft, EventPatch};
pub use grid::{build_grid, CalendarCell, CalendarGrid, CellId, ViewMode};
pub use navigation::{next_state, NavCommand, NavigationState};
pub use placement::{place, CellEvents, Placement};
pub use session::{SessionProvider, StaticSession};
pub use store::{EventStore, JsonFileStore, MemoryStore, StoreError};

use std::fmt;

use thiserror::Error;

/// Calendar engine errors
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid event data: {0}")]
    InvalidEvent(String),

    #[error("Failed to load events: {0}")]
    FetchFailed(String),

    #[error("Failed to {kind} event: {reason}")]
    MutationFailed { kind: MutationKind, reason: String },

    #[error("Another mutation is already in flight")]
    Busy,

    #[error("No authenticated identity available")]
    SignedOut,
}

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Which write operation a `MutationFailed` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}
