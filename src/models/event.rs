use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub type EventId = i64;

pub const DEFAULT_COLOR: &str = "#3b82f6";

/// A scheduled session. Field names on the wire are camelCase, dates are
/// `YYYY-MM-DD`, times are zero-padded `HH:MM` and colors are `#rrggbb`.
/// Anything else is rejected so a stored record reads back byte for byte.
/// Unknown fields are ignored and not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    #[serde(default)]
    pub location: String,
    pub name: String,
    #[serde(with = "day")]
    pub date: NaiveDate,
    #[serde(with = "clock")]
    pub start_time: NaiveTime,
    #[serde(with = "clock")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub instructor: String,
    #[serde(default = "default_color", deserialize_with = "deserialize_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if !is_hex_color(&raw) {
        return Err(serde::de::Error::custom(format!("expected #rrggbb color, got {raw:?}")));
    }
    Ok(raw)
}

/// `#rrggbb`, the only color form the calendar renders.
pub fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

impl Event {
    pub fn start_label(&self) -> String {
        self.start_time.format(clock::FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        self.end_time.format(clock::FORMAT).to_string()
    }

    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start_label(), self.end_label())
    }

    pub fn date_long(&self) -> String {
        date_long(self.date)
    }

    /// Hover text for a calendar chip.
    pub fn tooltip(&self) -> String {
        format!(
            "{}\n場所: {}\nインストラクター: {}\n時間: {}",
            self.name,
            self.location,
            self.instructor,
            self.time_range()
        )
    }
}

/// Long Japanese form, e.g. `2024年6月1日`. Built from the date components.
pub fn date_long(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Zero-padded `HH:MM` only. chrono alone would also take `9:00`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let time = NaiveTime::parse_from_str(raw, clock::FORMAT).ok()?;
    (time.format(clock::FORMAT).to_string() == raw).then_some(time)
}

/// Zero-padded `YYYY-MM-DD` only.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, day::FORMAT).ok()?;
    (date.format(day::FORMAT).to_string() == raw).then_some(date)
}

/// Events scheduled on `date`, in collection order.
pub fn events_for_date(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|e| e.date == date).collect()
}

pub fn find(events: &[Event], id: EventId) -> Option<&Event> {
    events.iter().find(|e| e.id == id)
}

/// Replace the first event sharing `event.id`. Returns false (and leaves the
/// collection untouched) when no such event exists.
pub fn replace(events: &mut [Event], event: Event) -> bool {
    match events.iter_mut().find(|e| e.id == event.id) {
        Some(slot) => {
            *slot = event;
            true
        }
        None => false,
    }
}

/// Drop every event with `id`, returning how many were removed.
pub fn remove(events: &mut Vec<Event>, id: EventId) -> usize {
    let before = events.len();
    events.retain(|e| e.id != id);
    before - events.len()
}

/// Millisecond clock, bumped past the largest id already present so two
/// events created in the same tick never collide. `None` once some stored
/// id has reached `i64::MAX`.
pub fn next_id(events: &[Event]) -> Option<EventId> {
    let now = Utc::now().timestamp_millis();
    match events.iter().map(|e| e.id).max() {
        Some(max) if max >= now => max.checked_add(1),
        _ => Some(now),
    }
}

mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected HH:MM, got {raw:?}")))
    }
}

mod day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected YYYY-MM-DD, got {raw:?}")))
    }
}
