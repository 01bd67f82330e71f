//! Navigation engine: a pure state machine over view mode and focus date.

use chrono::{Duration, Months, NaiveDate};

use crate::grid::ViewMode;

/// Where the calendar is looking: which view, anchored on which date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    pub view: ViewMode,
    pub focus: NaiveDate,
}

impl NavigationState {
    /// Initial state: month view anchored on today.
    pub fn today(today: NaiveDate) -> Self {
        NavigationState {
            view: ViewMode::Month,
            focus: today,
        }
    }

    /// Toolbar heading for the current view and focus.
    pub fn heading(&self) -> String {
        match self.view {
            ViewMode::Month | ViewMode::Week => self.focus.format("%B %Y").to_string(),
            ViewMode::Day => self.focus.format("%A, %B %-d, %Y").to_string(),
        }
    }
}

/// Navigation commands issued by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Previous,
    Next,
    Today,
    SwitchView(ViewMode),
}

/// Apply a navigation command.
///
/// Total over every state and command: stepping moves the focus by one
/// period of the active view, `Today` re-anchors on `today`, and switching
/// views keeps the focus date.
pub fn next_state(
    state: NavigationState,
    command: NavCommand,
    today: NaiveDate,
) -> NavigationState {
    match command {
        NavCommand::Previous => NavigationState {
            focus: step(state.view, state.focus, -1),
            ..state
        },
        NavCommand::Next => NavigationState {
            focus: step(state.view, state.focus, 1),
            ..state
        },
        NavCommand::Today => NavigationState {
            focus: today,
            ..state
        },
        NavCommand::SwitchView(view) => NavigationState { view, ..state },
    }
}

fn step(view: ViewMode, focus: NaiveDate, direction: i64) -> NaiveDate {
    match view {
        ViewMode::Month => step_month(focus, direction),
        ViewMode::Week => focus + Duration::days(7 * direction),
        ViewMode::Day => focus + Duration::days(direction),
    }
}

/// Month steps clamp to the last day when the target month is shorter, the
/// way a wall calendar flips.
fn step_month(focus: NaiveDate, direction: i64) -> NaiveDate {
    let months = Months::new(direction.unsigned_abs() as u32);
    let stepped = if direction >= 0 {
        focus.checked_add_months(months)
    } else {
        focus.checked_sub_months(months)
    };
    stepped.unwrap_or(focus)
}
