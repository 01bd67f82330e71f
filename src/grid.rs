//! Grid builder: turns a view mode and focus date into renderable rows of
//! day and hour cells.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Calendar view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

impl ViewMode {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Month => "Month",
            ViewMode::Week => "Week",
            ViewMode::Day => "Day",
        }
    }

    /// All view modes in toolbar order.
    pub fn all() -> Vec<ViewMode> {
        vec![ViewMode::Month, ViewMode::Week, ViewMode::Day]
    }
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Month
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "month" => Ok(ViewMode::Month),
            "week" => Ok(ViewMode::Week),
            "day" => Ok(ViewMode::Day),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// Address of a grid cell, used to key placement results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellId {
    Day(NaiveDate),
    Hour(NaiveDate, u32),
}

/// One grid cell at day or hour granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// `None` for day cells, `Some(0..=23)` for hour cells.
    pub hour: Option<u32>,
    /// Whether the cell's date falls inside the focus period. Month grids
    /// pad with leading and trailing dates from adjacent months.
    pub in_focus_period: bool,
    pub is_today: bool,
}

impl CalendarCell {
    pub fn id(&self) -> CellId {
        match self.hour {
            Some(hour) => CellId::Hour(self.date, hour),
            None => CellId::Day(self.date),
        }
    }
}

/// A renderable grid of cells for one focus period.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    pub view: ViewMode,
    pub focus: NaiveDate,
    /// Day-granularity header cells: seven for week view, one for day view,
    /// none for month view (its weekday labels carry no date).
    pub headers: Vec<CalendarCell>,
    /// Leaf cells in ascending date order; hour cells ascend within a date.
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    /// Body cells grouped into render rows: weeks for month view, one row
    /// per hour across the seven days for week view, one cell per row for
    /// day view.
    pub fn rows(&self) -> Vec<Vec<CalendarCell>> {
        match self.view {
            ViewMode::Month => self.cells.chunks(7).map(|week| week.to_vec()).collect(),
            ViewMode::Week => (0..24)
                .map(|hour| {
                    self.cells
                        .iter()
                        .skip(hour)
                        .step_by(24)
                        .copied()
                        .collect()
                })
                .collect(),
            ViewMode::Day => self.cells.chunks(1).map(|chunk| chunk.to_vec()).collect(),
        }
    }

    /// Every cell that can hold events, headers included.
    pub fn placeable_cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.headers.iter().chain(self.cells.iter())
    }
}

/// Build the grid for `view` focused on `focus`.
///
/// `today` is threaded in by the caller so grids are reproducible.
pub fn build_grid(
    view: ViewMode,
    focus: NaiveDate,
    week_start: Weekday,
    today: NaiveDate,
) -> CalendarGrid {
    match view {
        ViewMode::Month => month_grid(focus, week_start, today),
        ViewMode::Week => week_grid(focus, week_start, today),
        ViewMode::Day => day_grid(focus, today),
    }
}

/// The most recent `week_start` day on or before `date`.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset =
        (7 + date.weekday().num_days_from_sunday() - week_start.num_days_from_sunday()) % 7;
    date - Duration::days(i64::from(offset))
}

fn month_grid(focus: NaiveDate, week_start: Weekday, today: NaiveDate) -> CalendarGrid {
    let first = focus.with_day(1).unwrap_or(focus);
    let last = last_of_month(first);
    let start = start_of_week(first, week_start);
    let end = start_of_week(last, week_start) + Duration::days(6);

    let cells = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| CalendarCell {
            date: day,
            hour: None,
            in_focus_period: day.month() == focus.month() && day.year() == focus.year(),
            is_today: day == today,
        })
        .collect();

    CalendarGrid {
        view: ViewMode::Month,
        focus,
        headers: Vec::new(),
        cells,
    }
}

fn week_grid(focus: NaiveDate, week_start: Weekday, today: NaiveDate) -> CalendarGrid {
    let days: Vec<NaiveDate> = start_of_week(focus, week_start).iter_days().take(7).collect();

    let headers = days.iter().map(|&day| day_header(day, today)).collect();

    let mut cells = Vec::with_capacity(24 * 7);
    for &day in &days {
        for hour in 0..24 {
            cells.push(CalendarCell {
                date: day,
                hour: Some(hour),
                in_focus_period: true,
                is_today: day == today,
            });
        }
    }

    CalendarGrid {
        view: ViewMode::Week,
        focus,
        headers,
        cells,
    }
}

fn day_grid(focus: NaiveDate, today: NaiveDate) -> CalendarGrid {
    let headers = vec![day_header(focus, today)];
    let cells = (0..24)
        .map(|hour| CalendarCell {
            date: focus,
            hour: Some(hour),
            in_focus_period: true,
            is_today: focus == today,
        })
        .collect();

    CalendarGrid {
        view: ViewMode::Day,
        focus,
        headers,
        cells,
    }
}

fn day_header(date: NaiveDate, today: NaiveDate) -> CalendarCell {
    CalendarCell {
        date,
        hour: None,
        in_focus_period: true,
        is_today: date == today,
    }
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_month.and_then(|day| day.pred_opt()).unwrap_or(first)
}
