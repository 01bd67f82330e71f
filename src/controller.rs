//! Calendar controller: owns the authoritative event collection and drives
//! the store and session collaborators through a small phase machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::CalendarConfig;
use crate::event::{Event, EventDraft, EventPatch};
use crate::grid::{build_grid, CalendarGrid};
use crate::navigation::{next_state, NavCommand, NavigationState};
use crate::placement::{place, Placement};
use crate::session::SessionProvider;
use crate::store::{EventStore, StoreError};
use crate::{CalendarError, CalendarResult, MutationKind};

/// Lifecycle phase of a calendar session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Loading,
    Ready,
    Mutating,
    Error,
}

impl ControllerPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerPhase::Idle => "idle",
            ControllerPhase::Loading => "loading",
            ControllerPhase::Ready => "ready",
            ControllerPhase::Mutating => "mutating",
            ControllerPhase::Error => "error",
        }
    }
}

/// Everything the rendering layer needs for one paint.
#[derive(Debug, Clone)]
pub struct CalendarSnapshot {
    pub phase: ControllerPhase,
    pub navigation: NavigationState,
    pub heading: String,
    pub grid: CalendarGrid,
    pub placement: Placement,
}

struct ControllerState {
    phase: ControllerPhase,
    navigation: NavigationState,
    events: Vec<Event>,
}

/// Orchestrates grid, placement, and navigation against the store and
/// session collaborators.
///
/// All methods take `&self`; the controller is designed to live behind an
/// `Arc` and be driven from several tasks. At most one mutation is in
/// flight at a time ([`CalendarError::Busy`] otherwise), and a fetch that
/// is overtaken by a newer one has its result discarded.
pub struct CalendarController {
    store: Arc<dyn EventStore>,
    session: Arc<dyn SessionProvider>,
    config: CalendarConfig,
    state: RwLock<ControllerState>,
    fetch_generation: AtomicU64,
}

impl CalendarController {
    pub fn new(
        store: Arc<dyn EventStore>,
        session: Arc<dyn SessionProvider>,
        config: CalendarConfig,
        today: NaiveDate,
    ) -> Self {
        CalendarController {
            store,
            session,
            config,
            state: RwLock::new(ControllerState {
                phase: ControllerPhase::Idle,
                navigation: NavigationState::today(today),
                events: Vec::new(),
            }),
            fetch_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// First load after construction. Requires a signed-in identity;
    /// without one the session routes to sign-in and the phase stays idle.
    pub async fn initialize(&self) -> CalendarResult<()> {
        let owner_id = self.require_user().await?;
        info!("initializing calendar session for {}", owner_id);
        self.reload(&owner_id).await
    }

    /// Re-fetch the authoritative collection.
    ///
    /// A refresh issued while an older fetch is still in flight supersedes
    /// it; refreshing during a mutation is rejected with `Busy`.
    pub async fn refresh(&self) -> CalendarResult<()> {
        let owner_id = self.require_user().await?;
        self.reload(&owner_id).await
    }

    /// Validate `draft`, persist it, and republish the refreshed
    /// collection. Returns the stored event with its assigned id.
    pub async fn create_event(&self, draft: &EventDraft) -> CalendarResult<Event> {
        let owner_id = self.require_user().await?;
        let event = Event::from_draft(draft, &owner_id)?;

        self.begin_mutation(MutationKind::Create).await?;
        info!("creating event '{}'", event.title);
        match self.store.insert_event(event).await {
            Ok(created) => {
                self.confirm_and_reload(&owner_id).await?;
                Ok(created)
            }
            Err(err) => self.fail_mutation(MutationKind::Create, err).await,
        }
    }

    /// Patch the stored event with `event_id` and republish the refreshed
    /// collection.
    pub async fn update_event(&self, event_id: &str, patch: &EventPatch) -> CalendarResult<()> {
        let owner_id = self.require_user().await?;
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(CalendarError::InvalidEvent(
                    "title must not be empty".to_string(),
                ));
            }
        }
        if let (Some(start), Some(end)) = (patch.start_time, patch.end_time) {
            if end < start {
                return Err(CalendarError::InvalidEvent(
                    "end time is before start time".to_string(),
                ));
            }
        }

        self.begin_mutation(MutationKind::Update).await?;
        info!("updating event {}", event_id);
        match self.store.update_event(&owner_id, event_id, patch).await {
            Ok(_) => self.confirm_and_reload(&owner_id).await,
            Err(err) => self.fail_mutation(MutationKind::Update, err).await,
        }
    }

    /// Delete the event with `event_id`.
    ///
    /// Ids not present in the current collection succeed without touching
    /// the store, so retrying a delete is always safe.
    pub async fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        let owner_id = self.require_user().await?;
        {
            let mut state = self.state.write().await;
            match state.phase {
                ControllerPhase::Ready => {}
                ControllerPhase::Mutating => return Err(CalendarError::Busy),
                phase => return Err(not_ready(MutationKind::Delete, phase)),
            }
            if !state
                .events
                .iter()
                .any(|event| event.id.as_deref() == Some(event_id))
            {
                debug!("delete of unknown event {} is a no-op", event_id);
                return Ok(());
            }
            state.phase = ControllerPhase::Mutating;
        }

        info!("deleting event {}", event_id);
        match self.store.delete_event(&owner_id, event_id).await {
            Ok(()) => self.confirm_and_reload(&owner_id).await,
            Err(err) => self.fail_mutation(MutationKind::Delete, err).await,
        }
    }

    /// Apply a navigation command.
    ///
    /// Navigation is accepted in every phase, never touches the event
    /// collection, and never waits on the network.
    pub async fn navigate(&self, command: NavCommand, today: NaiveDate) {
        let mut state = self.state.write().await;
        state.navigation = next_state(state.navigation, command, today);
        debug!(
            "navigated to {} ({} view)",
            state.navigation.focus,
            state.navigation.view.name()
        );
    }

    /// Recompute grid and placement for the current navigation state.
    pub async fn snapshot(&self, today: NaiveDate) -> CalendarSnapshot {
        let state = self.state.read().await;
        let grid = build_grid(
            state.navigation.view,
            state.navigation.focus,
            self.config.week_start,
            today,
        );
        let placement = place(&grid, &state.events, self.config.visible_limit);
        CalendarSnapshot {
            phase: state.phase,
            navigation: state.navigation,
            heading: state.navigation.heading(),
            grid,
            placement,
        }
    }

    pub async fn phase(&self) -> ControllerPhase {
        self.state.read().await.phase
    }

    pub async fn navigation(&self) -> NavigationState {
        self.state.read().await.navigation
    }

    /// The authoritative collection, earliest start first.
    pub async fn events(&self) -> Vec<Event> {
        self.state.read().await.events.clone()
    }

    async fn require_user(&self) -> CalendarResult<String> {
        self.session
            .current_user()
            .await
            .ok_or(CalendarError::SignedOut)
    }

    /// Fetch and install the event collection. The lock is not held while
    /// the store call is in flight, so navigation stays responsive.
    async fn reload(&self, owner_id: &str) -> CalendarResult<()> {
        let generation = {
            let mut state = self.state.write().await;
            if state.phase == ControllerPhase::Mutating {
                return Err(CalendarError::Busy);
            }
            state.phase = ControllerPhase::Loading;
            self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        debug!("fetching events for {}", owner_id);
        let fetched = self.store.fetch_events(owner_id).await;

        let mut state = self.state.write().await;
        if self.fetch_generation.load(Ordering::SeqCst) != generation {
            debug!("discarding superseded fetch result");
            return Ok(());
        }
        match fetched {
            Ok(events) => {
                install_events(&mut state, events);
                Ok(())
            }
            Err(err) => {
                warn!("event fetch failed: {}", err);
                state.phase = ControllerPhase::Error;
                Err(CalendarError::FetchFailed(err.to_string()))
            }
        }
    }

    async fn begin_mutation(&self, kind: MutationKind) -> CalendarResult<()> {
        let mut state = self.state.write().await;
        match state.phase {
            ControllerPhase::Ready => {
                state.phase = ControllerPhase::Mutating;
                Ok(())
            }
            ControllerPhase::Mutating => Err(CalendarError::Busy),
            phase => Err(not_ready(kind, phase)),
        }
    }

    /// After a confirmed write, re-fetch before leaving the mutating
    /// phase; the grid never shows an unconfirmed local change.
    async fn confirm_and_reload(&self, owner_id: &str) -> CalendarResult<()> {
        self.fetch_generation.fetch_add(1, Ordering::SeqCst);
        let fetched = self.store.fetch_events(owner_id).await;

        let mut state = self.state.write().await;
        match fetched {
            Ok(events) => {
                install_events(&mut state, events);
                Ok(())
            }
            Err(err) => {
                warn!("refetch after confirmed write failed: {}", err);
                state.phase = ControllerPhase::Error;
                Err(CalendarError::FetchFailed(err.to_string()))
            }
        }
    }

    async fn fail_mutation<T>(&self, kind: MutationKind, err: StoreError) -> CalendarResult<T> {
        warn!("{} failed: {}", kind, err);
        let mut state = self.state.write().await;
        state.phase = ControllerPhase::Error;
        Err(CalendarError::MutationFailed {
            kind,
            reason: err.to_string(),
        })
    }
}

fn install_events(state: &mut ControllerState, mut events: Vec<Event>) {
    // stable, so a collaborator's tie order is preserved
    events.sort_by_key(|event| event.start_time);
    debug!("loaded {} events", events.len());
    state.events = events;
    state.phase = ControllerPhase::Ready;
}

fn not_ready(kind: MutationKind, phase: ControllerPhase) -> CalendarError {
    CalendarError::MutationFailed {
        kind,
        reason: format!("calendar is not ready ({})", phase.name()),
    }
}
