//! Placement engine: assigns fetched events to grid cells and applies the
//! per-cell visible limit.

use std::collections::HashMap;

use crate::event::Event;
use crate::grid::{CalendarGrid, CellId};

/// Number of events a day cell shows before collapsing the rest into an
/// overflow count.
pub const DEFAULT_VISIBLE_LIMIT: usize = 3;

/// Events assigned to one cell, earliest start first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellEvents {
    pub events: Vec<Event>,
    /// How many events beyond the visible limit this cell holds.
    pub overflow_count: usize,
}

impl CellEvents {
    /// The events that fit under the visible limit.
    pub fn visible(&self) -> &[Event] {
        &self.events[..self.events.len() - self.overflow_count]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Placement of an event collection onto one grid. Cells without events
/// have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    by_cell: HashMap<CellId, CellEvents>,
}

impl Placement {
    pub fn cell(&self, id: CellId) -> Option<&CellEvents> {
        self.by_cell.get(&id)
    }

    /// Number of cells holding at least one event.
    pub fn occupied_cells(&self) -> usize {
        self.by_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }
}

/// Assign `events` to the cells of `grid`.
///
/// Day cells collect events by day occupancy, hour cells collect timed
/// events by start hour. Only day cells truncate to `visible_limit`; hour
/// cells keep everything visible.
pub fn place(grid: &CalendarGrid, events: &[Event], visible_limit: usize) -> Placement {
    let mut by_cell = HashMap::new();

    for cell in grid.placeable_cells() {
        let mut matched: Vec<Event> = match cell.hour {
            None => events
                .iter()
                .filter(|event| event.occurs_on(cell.date))
                .cloned()
                .collect(),
            Some(hour) => events
                .iter()
                .filter(|event| event.occurs_during_hour(cell.date, hour))
                .cloned()
                .collect(),
        };
        if matched.is_empty() {
            continue;
        }

        matched.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

        let overflow_count = if cell.hour.is_none() && matched.len() > visible_limit {
            matched.len() - visible_limit
        } else {
            0
        };

        by_cell.insert(
            cell.id(),
            CellEvents {
                events: matched,
                overflow_count,
            },
        );
    }

    Placement { by_cell }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventColor;
    use crate::grid::{build_grid, ViewMode};
    use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timed(id: &str, d: u32, h: u32, min: u32, minutes: i64) -> Event {
        let start = Utc.with_ymd_and_hms(2024, 3, d, h, min, 0).unwrap();
        Event {
            id: Some(id.to_string()),
            title: id.to_string(),
            description: None,
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            all_day: false,
            color: EventColor::Blue,
            location: None,
            owner_id: "user-1".to_string(),
        }
    }

    fn all_day(id: &str, first: u32, last: u32) -> Event {
        let mut event = timed(id, first, 0, 0, 0);
        event.all_day = true;
        event.end_time = Utc.with_ymd_and_hms(2024, 3, last, 0, 0, 0).unwrap();
        event
    }

    fn month_grid() -> CalendarGrid {
        build_grid(
            ViewMode::Month,
            date(2024, 3, 15),
            Weekday::Sun,
            date(2024, 3, 15),
        )
    }

    #[test]
    fn test_day_cell_overflow() {
        let events = vec![
            timed("a", 15, 8, 0, 60),
            timed("b", 15, 9, 0, 60),
            timed("c", 15, 10, 0, 60),
            timed("d", 15, 11, 0, 60),
            timed("e", 15, 12, 0, 60),
        ];
        let placement = place(&month_grid(), &events, 3);

        let cell = placement.cell(CellId::Day(date(2024, 3, 15))).unwrap();
        assert_eq!(cell.len(), 5);
        assert_eq!(cell.overflow_count, 2);

        let visible: Vec<_> = cell.visible().iter().map(|e| e.id.clone()).collect();
        assert_eq!(
            visible,
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
    }

    #[test]
    fn test_day_cell_under_limit_has_no_overflow() {
        let events = vec![timed("a", 15, 8, 0, 60), timed("b", 15, 9, 0, 60)];
        let placement = place(&month_grid(), &events, 3);

        let cell = placement.cell(CellId::Day(date(2024, 3, 15))).unwrap();
        assert_eq!(cell.overflow_count, 0);
        assert_eq!(cell.visible().len(), 2);
    }

    #[test]
    fn test_empty_cells_have_no_entry() {
        let events = vec![timed("a", 15, 8, 0, 60)];
        let placement = place(&month_grid(), &events, 3);

        assert_eq!(placement.occupied_cells(), 1);
        assert!(placement.cell(CellId::Day(date(2024, 3, 16))).is_none());
    }

    #[test]
    fn test_event_outside_grid_is_dropped() {
        let events = vec![timed("a", 15, 8, 0, 60)];
        let june = build_grid(
            ViewMode::Month,
            date(2024, 6, 15),
            Weekday::Sun,
            date(2024, 6, 15),
        );
        let placement = place(&june, &events, 3);
        assert!(placement.is_empty());
    }

    #[test]
    fn test_hour_cell_uses_start_hour_only() {
        let grid = build_grid(
            ViewMode::Week,
            date(2024, 3, 15),
            Weekday::Sun,
            date(2024, 3, 15),
        );
        // 14:30 to 16:00
        let events = vec![timed("a", 15, 14, 30, 90)];
        let placement = place(&grid, &events, 3);

        let hit = placement.cell(CellId::Hour(date(2024, 3, 15), 14)).unwrap();
        assert_eq!(hit.len(), 1);
        assert!(placement.cell(CellId::Hour(date(2024, 3, 15), 15)).is_none());
        assert!(placement.cell(CellId::Hour(date(2024, 3, 15), 16)).is_none());
    }

    #[test]
    fn test_hour_cells_never_truncate() {
        let grid = build_grid(
            ViewMode::Day,
            date(2024, 3, 15),
            Weekday::Sun,
            date(2024, 3, 15),
        );
        let events = vec![
            timed("a", 15, 9, 0, 30),
            timed("b", 15, 9, 10, 30),
            timed("c", 15, 9, 20, 30),
            timed("d", 15, 9, 30, 30),
            timed("e", 15, 9, 40, 30),
        ];
        let placement = place(&grid, &events, 3);

        let cell = placement.cell(CellId::Hour(date(2024, 3, 15), 9)).unwrap();
        assert_eq!(cell.len(), 5);
        assert_eq!(cell.overflow_count, 0);
        assert_eq!(cell.visible().len(), 5);
    }

    #[test]
    fn test_week_headers_collect_day_events() {
        let grid = build_grid(
            ViewMode::Week,
            date(2024, 3, 15),
            Weekday::Sun,
            date(2024, 3, 15),
        );
        let events = vec![timed("a", 15, 14, 30, 90), all_day("b", 14, 16)];
        let placement = place(&grid, &events, 3);

        let friday = placement.cell(CellId::Day(date(2024, 3, 15))).unwrap();
        assert_eq!(friday.len(), 2);
        // the all-day span reaches the surrounding headers too
        assert!(placement.cell(CellId::Day(date(2024, 3, 14))).is_some());
        assert!(placement.cell(CellId::Day(date(2024, 3, 16))).is_some());
    }

    #[test]
    fn test_all_day_span_fills_month_cells() {
        let events = vec![all_day("offsite", 14, 16)];
        let placement = place(&month_grid(), &events, 3);

        for day in 14..=16 {
            assert!(placement.cell(CellId::Day(date(2024, 3, day))).is_some());
        }
        assert!(placement.cell(CellId::Day(date(2024, 3, 13))).is_none());
        assert!(placement.cell(CellId::Day(date(2024, 3, 17))).is_none());
    }

    #[test]
    fn test_cell_order_breaks_ties_by_id() {
        let events = vec![
            timed("b", 15, 9, 0, 60),
            timed("a", 15, 9, 0, 60),
            timed("c", 15, 8, 0, 60),
        ];
        let placement = place(&month_grid(), &events, 3);

        let cell = placement.cell(CellId::Day(date(2024, 3, 15))).unwrap();
        let order: Vec<_> = cell.events.iter().map(|e| e.id.clone().unwrap()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_placement_is_deterministic() {
        let events = vec![
            timed("b", 15, 9, 0, 60),
            timed("a", 15, 9, 0, 60),
            all_day("offsite", 14, 16),
        ];
        let first = place(&month_grid(), &events, 3);
        let second = place(&month_grid(), &events, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_limit_collapses_everything() {
        let events = vec![timed("a", 15, 8, 0, 60)];
        let placement = place(&month_grid(), &events, 0);

        let cell = placement.cell(CellId::Day(date(2024, 3, 15))).unwrap();
        assert_eq!(cell.overflow_count, 1);
        assert!(cell.visible().is_empty());
    }
}
