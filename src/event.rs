//! Event model: the persisted event shape, editor drafts, partial updates,
//! and the fixed color palette.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{CalendarError, CalendarResult};

/// Start hour used when a draft is prefilled from a date without a specific
/// time slot.
pub const DEFAULT_START_HOUR: u32 = 9;

/// A calendar event.
///
/// Instants are absolute points in time rendered as wall clock values; the
/// engine never converts between timezones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier; `None` until the event has been persisted.
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub color: EventColor,
    pub location: Option<String>,
    pub owner_id: String,
}

impl Event {
    /// Validate an editor draft and turn it into an event owned by
    /// `owner_id`.
    ///
    /// Rejects drafts with a blank title, unparseable instants, or an end
    /// before the start. Zero-length events are allowed.
    pub fn from_draft(draft: &EventDraft, owner_id: &str) -> CalendarResult<Event> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CalendarError::InvalidEvent(
                "title must not be empty".to_string(),
            ));
        }

        let start_time = parse_instant(&draft.start_time)?;
        let end_time = parse_instant(&draft.end_time)?;
        if end_time < start_time {
            return Err(CalendarError::InvalidEvent(
                "end time is before start time".to_string(),
            ));
        }

        Ok(Event {
            id: None,
            title: title.to_string(),
            description: normalize(&draft.description),
            start_time,
            end_time,
            all_day: draft.all_day,
            color: draft.color.clone(),
            location: normalize(&draft.location),
            owner_id: owner_id.to_string(),
        })
    }

    /// Whether the event belongs on `date` at day granularity.
    ///
    /// Timed events live on their start date only; all-day events cover
    /// every date from start to end inclusive.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if self.all_day {
            self.start_time.date_naive() <= date && date <= self.end_time.date_naive()
        } else {
            self.start_time.date_naive() == date
        }
    }

    /// Whether the event belongs in the hour slot starting at `hour` on
    /// `date`.
    ///
    /// Only the start hour counts; an event spanning several hours still
    /// lives in a single slot. All-day events never match an hour slot.
    pub fn occurs_during_hour(&self, date: NaiveDate, hour: u32) -> bool {
        !self.all_day && self.start_time.date_naive() == date && self.start_time.hour() == hour
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Whether the event has not been persisted yet.
    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }
}

/// Raw editor output, not yet validated.
///
/// Instants are carried as strings exactly as the editor produced them and
/// are only parsed by [`Event::from_draft`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
    pub color: EventColor,
    pub location: Option<String>,
}

impl EventDraft {
    /// Prefill for a clicked hour slot: starts on the hour, one hour long.
    pub fn for_slot(date: NaiveDate, hour: u32) -> Self {
        let start = date
            .and_hms_opt(hour.min(23), 0, 0)
            .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap())
            .and_utc();
        let end = start + Duration::hours(1);
        EventDraft {
            title: String::new(),
            description: None,
            start_time: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end_time: end.to_rfc3339_opts(SecondsFormat::Secs, true),
            all_day: false,
            color: EventColor::default(),
            location: None,
        }
    }

    /// Prefill for a clicked date without a time slot.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_slot(date, DEFAULT_START_HOUR)
    }
}

/// Partial update for a persisted event; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub color: Option<EventColor>,
    pub location: Option<String>,
}

impl EventPatch {
    /// Full-field patch carrying every editable field of `event`, matching
    /// how the editor saves an existing event.
    pub fn from_event(event: &Event) -> Self {
        EventPatch {
            title: Some(event.title.clone()),
            description: event.description.clone(),
            start_time: Some(event.start_time),
            end_time: Some(event.end_time),
            all_day: Some(event.all_day),
            color: Some(event.color.clone()),
            location: event.location.clone(),
        }
    }

    /// Apply the patch to `event`, leaving `None` fields untouched.
    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(all_day) = self.all_day {
            event.all_day = all_day;
        }
        if let Some(color) = &self.color {
            event.color = color.clone();
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.all_day.is_none()
            && self.color.is_none()
            && self.location.is_none()
    }
}

/// The editor's fixed color palette.
///
/// Colors are stored as hex strings; values outside the palette survive a
/// round trip unchanged through `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventColor {
    Blue,
    Red,
    Green,
    Purple,
    Orange,
    Teal,
    Gray,
    Custom(String),
}

impl EventColor {
    /// The seven palette entries offered by the editor, in display order.
    pub fn palette() -> &'static [EventColor] {
        &[
            EventColor::Blue,
            EventColor::Red,
            EventColor::Green,
            EventColor::Purple,
            EventColor::Orange,
            EventColor::Teal,
            EventColor::Gray,
        ]
    }

    pub fn hex(&self) -> &str {
        match self {
            EventColor::Blue => "#4285f4",
            EventColor::Red => "#ea4335",
            EventColor::Green => "#34a853",
            EventColor::Purple => "#9334ea",
            EventColor::Orange => "#f59e0b",
            EventColor::Teal => "#14b8a6",
            EventColor::Gray => "#6b7280",
            EventColor::Custom(value) => value,
        }
    }

    pub fn from_hex(value: &str) -> Self {
        match value {
            "#4285f4" => EventColor::Blue,
            "#ea4335" => EventColor::Red,
            "#34a853" => EventColor::Green,
            "#9334ea" => EventColor::Purple,
            "#f59e0b" => EventColor::Orange,
            "#14b8a6" => EventColor::Teal,
            "#6b7280" => EventColor::Gray,
            _ => EventColor::Custom(value.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EventColor::Blue => "Blue",
            EventColor::Red => "Red",
            EventColor::Green => "Green",
            EventColor::Purple => "Purple",
            EventColor::Orange => "Orange",
            EventColor::Teal => "Teal",
            EventColor::Gray => "Gray",
            EventColor::Custom(value) => value,
        }
    }
}

impl Default for EventColor {
    fn default() -> Self {
        EventColor::Blue
    }
}

impl From<String> for EventColor {
    fn from(value: String) -> Self {
        EventColor::from_hex(&value)
    }
}

impl From<EventColor> for String {
    fn from(color: EventColor) -> Self {
        color.hex().to_string()
    }
}

pub(crate) fn parse_instant(raw: &str) -> CalendarResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // datetime-local editor inputs arrive without an offset, sometimes
    // without seconds
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed.and_utc());
        }
    }
    Err(CalendarError::InvalidEvent(format!(
        "unparseable instant '{}'",
        raw
    )))
}

fn normalize(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn draft(title: &str, start: &str, end: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_draft_builds_event() {
        let d = draft(
            "  Standup  ",
            "2024-03-15T09:00:00Z",
            "2024-03-15T09:30:00Z",
        );
        let event = Event::from_draft(&d, "user-1").unwrap();

        assert_eq!(event.id, None);
        assert!(event.is_draft());
        assert_eq!(event.title, "Standup");
        assert_eq!(event.owner_id, "user-1");
        assert_eq!(event.start_time, instant(2024, 3, 15, 9, 0));
        assert_eq!(event.duration(), Duration::minutes(30));
        assert_eq!(event.color, EventColor::Blue);
    }

    #[test]
    fn test_from_draft_rejects_blank_title() {
        let d = draft("   ", "2024-03-15T09:00:00Z", "2024-03-15T10:00:00Z");
        let err = Event::from_draft(&d, "user-1").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidEvent(_)));
    }

    #[test]
    fn test_from_draft_rejects_unparseable_instant() {
        let d = draft("Lunch", "next tuesday", "2024-03-15T13:00:00Z");
        let err = Event::from_draft(&d, "user-1").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidEvent(_)));
    }

    #[test]
    fn test_from_draft_rejects_end_before_start() {
        let d = draft("Lunch", "2024-03-15T13:00:00Z", "2024-03-15T12:00:00Z");
        let err = Event::from_draft(&d, "user-1").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidEvent(_)));
    }

    #[test]
    fn test_from_draft_allows_zero_length() {
        let d = draft("Ping", "2024-03-15T13:00:00Z", "2024-03-15T13:00:00Z");
        let event = Event::from_draft(&d, "user-1").unwrap();
        assert_eq!(event.duration(), Duration::zero());
    }

    #[test]
    fn test_from_draft_accepts_datetime_local_inputs() {
        let d = draft("Lunch", "2024-03-15T12:00", "2024-03-15T12:45:30");
        let event = Event::from_draft(&d, "user-1").unwrap();
        assert_eq!(event.start_time, instant(2024, 3, 15, 12, 0));
        assert_eq!(event.end_time.second(), 30);
    }

    #[test]
    fn test_from_draft_blanks_whitespace_optionals() {
        let mut d = draft("Lunch", "2024-03-15T12:00:00Z", "2024-03-15T13:00:00Z");
        d.description = Some("   ".to_string());
        d.location = Some("  Cafe  ".to_string());
        let event = Event::from_draft(&d, "user-1").unwrap();
        assert_eq!(event.description, None);
        assert_eq!(event.location, Some("Cafe".to_string()));
    }

    #[test]
    fn test_occurs_on_timed_event() {
        let d = draft("Retro", "2024-03-15T22:00:00Z", "2024-03-16T01:00:00Z");
        let event = Event::from_draft(&d, "user-1").unwrap();

        assert!(event.occurs_on(date(2024, 3, 15)));
        // only the start date counts for timed events
        assert!(!event.occurs_on(date(2024, 3, 16)));
    }

    #[test]
    fn test_occurs_on_all_day_span() {
        let mut d = draft("Offsite", "2024-03-15T00:00:00Z", "2024-03-17T00:00:00Z");
        d.all_day = true;
        let event = Event::from_draft(&d, "user-1").unwrap();

        assert!(!event.occurs_on(date(2024, 3, 14)));
        assert!(event.occurs_on(date(2024, 3, 15)));
        assert!(event.occurs_on(date(2024, 3, 16)));
        assert!(event.occurs_on(date(2024, 3, 17)));
        assert!(!event.occurs_on(date(2024, 3, 18)));
    }

    #[test]
    fn test_occurs_during_hour_uses_start_hour_only() {
        let d = draft("Workshop", "2024-03-15T14:30:00Z", "2024-03-15T16:00:00Z");
        let event = Event::from_draft(&d, "user-1").unwrap();

        assert!(event.occurs_during_hour(date(2024, 3, 15), 14));
        assert!(!event.occurs_during_hour(date(2024, 3, 15), 15));
        assert!(!event.occurs_during_hour(date(2024, 3, 15), 16));
        assert!(!event.occurs_during_hour(date(2024, 3, 16), 14));
    }

    #[test]
    fn test_occurs_during_hour_skips_all_day() {
        let mut d = draft("Holiday", "2024-03-15T00:00:00Z", "2024-03-15T23:59:00Z");
        d.all_day = true;
        let event = Event::from_draft(&d, "user-1").unwrap();
        assert!(!event.occurs_during_hour(date(2024, 3, 15), 0));
    }

    #[test]
    fn test_for_slot_prefill() {
        let d = EventDraft::for_slot(date(2024, 3, 15), 14);
        assert_eq!(d.start_time, "2024-03-15T14:00:00Z");
        assert_eq!(d.end_time, "2024-03-15T15:00:00Z");
        assert!(!d.all_day);
        assert_eq!(d.color, EventColor::Blue);
    }

    #[test]
    fn test_for_date_prefill_uses_default_hour() {
        let d = EventDraft::for_date(date(2024, 3, 15));
        assert_eq!(d.start_time, "2024-03-15T09:00:00Z");
        assert_eq!(d.end_time, "2024-03-15T10:00:00Z");
    }

    #[test]
    fn test_for_slot_last_hour_crosses_midnight() {
        let d = EventDraft::for_slot(date(2024, 3, 31), 23);
        assert_eq!(d.start_time, "2024-03-31T23:00:00Z");
        assert_eq!(d.end_time, "2024-04-01T00:00:00Z");
    }

    #[test]
    fn test_patch_apply_leaves_unset_fields() {
        let d = draft("Standup", "2024-03-15T09:00:00Z", "2024-03-15T09:30:00Z");
        let mut event = Event::from_draft(&d, "user-1").unwrap();
        event.id = Some("ev-1".to_string());

        let patch = EventPatch {
            title: Some("Daily standup".to_string()),
            color: Some(EventColor::Green),
            ..Default::default()
        };
        patch.apply(&mut event);

        assert_eq!(event.title, "Daily standup");
        assert_eq!(event.color, EventColor::Green);
        assert_eq!(event.start_time, instant(2024, 3, 15, 9, 0));
        assert_eq!(event.id, Some("ev-1".to_string()));
    }

    #[test]
    fn test_patch_from_event_is_full() {
        let d = draft("Standup", "2024-03-15T09:00:00Z", "2024-03-15T09:30:00Z");
        let event = Event::from_draft(&d, "user-1").unwrap();
        let patch = EventPatch::from_event(&event);
        assert!(!patch.is_empty());
        assert_eq!(patch.title, Some("Standup".to_string()));
        assert_eq!(patch.start_time, Some(event.start_time));
    }

    #[test]
    fn test_color_hex_round_trip() {
        for color in EventColor::palette() {
            assert_eq!(&EventColor::from_hex(color.hex()), color);
        }
    }

    #[test]
    fn test_color_unknown_value_passes_through() {
        let color = EventColor::from_hex("#123456");
        assert_eq!(color, EventColor::Custom("#123456".to_string()));
        assert_eq!(color.hex(), "#123456");
    }

    #[test]
    fn test_color_serde_uses_hex_strings() {
        let json = serde_json::to_string(&EventColor::Teal).unwrap();
        assert_eq!(json, "\"#14b8a6\"");
        let back: EventColor = serde_json::from_str("\"#9334ea\"").unwrap();
        assert_eq!(back, EventColor::Purple);
    }
}
