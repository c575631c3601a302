use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::horizon;
use crate::models::event::{is_hex_color, parse_clock, parse_date, DEFAULT_COLOR};
use crate::models::{Event, EventId};

/// Raw field values as typed into the event form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventInput {
    pub location: String,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub instructor: String,
    pub color: String,
}

impl EventInput {
    /// Empty form for a new event on `date`.
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            color: DEFAULT_COLOR.to_string(),
            ..Self::default()
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            location: event.location.clone(),
            name: event.name.clone(),
            date: event.date.format("%Y-%m-%d").to_string(),
            start_time: event.start_label(),
            end_time: event.end_label(),
            instructor: event.instructor.clone(),
            color: event.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MalformedTime,
    EndNotAfterStart,
    MalformedDate,
    BeyondHorizon,
    MalformedColor,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationError::MalformedTime => "Times must be given as HH:MM.",
            ValidationError::EndNotAfterStart => "End time must be after start time.",
            ValidationError::MalformedDate => "Date must be given as YYYY-MM-DD.",
            ValidationError::BeyondHorizon => "Events can only be created up to one month ahead.",
            ValidationError::MalformedColor => "Color must be given as #rrggbb.",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `input` against the scheduling rules and build the event it
/// describes. Time ordering is checked before the date horizon; the first
/// failing rule wins.
pub fn validate(input: &EventInput, id: EventId, today: NaiveDate) -> Result<Event, ValidationError> {
    let start_time = parse_clock(input.start_time.trim()).ok_or(ValidationError::MalformedTime)?;
    let end_time = parse_clock(input.end_time.trim()).ok_or(ValidationError::MalformedTime)?;
    if start_time >= end_time {
        return Err(ValidationError::EndNotAfterStart);
    }

    let date = parse_date(input.date.trim()).ok_or(ValidationError::MalformedDate)?;
    if date > horizon(today) {
        return Err(ValidationError::BeyondHorizon);
    }

    let color = match input.color.trim() {
        "" => DEFAULT_COLOR.to_string(),
        color if is_hex_color(color) => color.to_string(),
        _ => return Err(ValidationError::MalformedColor),
    };

    Ok(Event {
        id,
        location: input.location.trim().to_string(),
        name: input.name.trim().to_string(),
        date,
        start_time,
        end_time,
        instructor: input.instructor.trim().to_string(),
        color,
    })
}
