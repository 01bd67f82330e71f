//! Plain-text rendering of calendar snapshots for the command line.

use chrono::Datelike;

use crate::controller::{CalendarSnapshot, ControllerPhase};
use crate::event::Event;
use crate::grid::ViewMode;
use crate::placement::CellEvents;

const MONTH_CELL_WIDTH: usize = 14;
const HOUR_LABEL_WIDTH: usize = 6;

/// Render a snapshot as terminal text.
pub fn render_snapshot(snapshot: &CalendarSnapshot) -> String {
    let mut out = format!(
        "{} ({} view){}\n",
        snapshot.heading,
        snapshot.navigation.view.name(),
        phase_marker(snapshot.phase)
    );
    match snapshot.navigation.view {
        ViewMode::Month => out.push_str(&render_month(snapshot)),
        ViewMode::Week => out.push_str(&render_week(snapshot)),
        ViewMode::Day => out.push_str(&render_day(snapshot)),
    }
    out
}

/// Clock label for an hour row, matching a wall calendar: `12 AM`, `9 AM`,
/// `12 PM`, `3 PM`.
pub fn hour_label(hour: u32) -> String {
    let (display, suffix) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{} {}", display, suffix)
}

fn phase_marker(phase: ControllerPhase) -> &'static str {
    match phase {
        ControllerPhase::Ready => "",
        ControllerPhase::Loading | ControllerPhase::Mutating => " [loading]",
        ControllerPhase::Idle => " [not loaded]",
        ControllerPhase::Error => " [showing last loaded events]",
    }
}

fn render_month(snapshot: &CalendarSnapshot) -> String {
    let grid = &snapshot.grid;
    let mut out = String::new();

    if grid.cells.len() >= 7 {
        for cell in &grid.cells[..7] {
            out.push_str(&pad(&cell.date.format("%a").to_string(), MONTH_CELL_WIDTH));
        }
        out.push('\n');
    }

    for week in grid.rows() {
        // every cell in the week renders as a column of lines, padded to
        // the same depth
        let columns: Vec<Vec<String>> = week
            .iter()
            .map(|cell| {
                let mut lines = vec![day_label(cell.date.day(), cell.is_today)];
                if let Some(held) = snapshot.placement.cell(cell.id()) {
                    for event in held.visible() {
                        lines.push(truncate(&event.title, MONTH_CELL_WIDTH - 2));
                    }
                    if held.overflow_count > 0 {
                        lines.push(format!("+{} more", held.overflow_count));
                    }
                }
                lines
            })
            .collect();

        let depth = columns.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..depth {
            for column in &columns {
                let text = column.get(line).map(String::as_str).unwrap_or("");
                out.push_str(&pad(text, MONTH_CELL_WIDTH));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn render_week(snapshot: &CalendarSnapshot) -> String {
    let grid = &snapshot.grid;
    let mut out = pad("", HOUR_LABEL_WIDTH);

    for header in &grid.headers {
        let count = snapshot
            .placement
            .cell(header.id())
            .map(CellEvents::len)
            .unwrap_or(0);
        let mut label = header.date.format("%a %-d").to_string();
        if header.is_today {
            label.push('*');
        }
        if count > 0 {
            label.push_str(&format!(" ({})", count));
        }
        out.push_str(&pad(&label, MONTH_CELL_WIDTH));
    }
    out.push('\n');

    for row in grid.rows() {
        let hour = row[0].hour.unwrap_or(0);
        out.push_str(&pad(&hour_label(hour), HOUR_LABEL_WIDTH));
        for cell in row {
            let text = snapshot
                .placement
                .cell(cell.id())
                .map(|held| joined_entries(&held.events, MONTH_CELL_WIDTH - 2))
                .unwrap_or_default();
            out.push_str(&pad(&text, MONTH_CELL_WIDTH));
        }
        out.push('\n');
    }
    out
}

fn render_day(snapshot: &CalendarSnapshot) -> String {
    let mut out = String::new();
    for cell in &snapshot.grid.cells {
        let hour = cell.hour.unwrap_or(0);
        out.push_str(&pad(&hour_label(hour), HOUR_LABEL_WIDTH));
        if let Some(held) = snapshot.placement.cell(cell.id()) {
            let lines: Vec<String> = held.events.iter().map(event_line).collect();
            out.push_str(&lines.join(", "));
        }
        out.push('\n');
    }
    out
}

fn event_line(event: &Event) -> String {
    format!("{} {}", event.start_time.format("%-I:%M %p"), event.title)
}

fn joined_entries(events: &[Event], width: usize) -> String {
    let joined = events
        .iter()
        .map(event_line)
        .collect::<Vec<_>>()
        .join(", ");
    truncate(&joined, width)
}

fn day_label(day: u32, is_today: bool) -> String {
    if is_today {
        format!("{}*", day)
    } else {
        day.to_string()
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
