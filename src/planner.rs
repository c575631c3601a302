//! Interaction state for one calendar session.
//!
//! A `Planner` owns the loaded collection, the month on screen, the state of
//! the event form and the event picked in the detail view. Front ends (the
//! HTML routes and the CLI) drive it one interaction at a time and render
//! whatever it holds afterwards.
//!
//! Planners built from the same [`Busy`] handle see each other's writes in
//! flight: while one is saving or deleting, the others refuse to open the
//! create form, submit or delete.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, MonthGrid, YearMonth};
use crate::form::{self, EventInput};
use crate::models::event::{find, next_id, remove, replace};
use crate::models::{Event, EventId};
use crate::store::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-line message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "notice-success",
            NoticeKind::Error => "notice-error",
        }
    }
}

pub const MONTH_LIMIT: &str = "You can only view up to one month ahead.";
pub const OFFLINE: &str = "Could not load events from the server. Working offline.";
const SAVE_FAILED: &str = "Failed to save the event.";
const DELETE_FAILED: &str = "Failed to delete the event.";
pub const BUSY: &str = "Another change is still being saved.";
const NO_FORM: &str = "No event form is open.";
const IDS_EXHAUSTED: &str = "No new event id is available.";

/// Shared marker for a store write in flight. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct Busy(Arc<AtomicBool>);

impl Busy {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag unless it is already up. It drops back when the
    /// guard does.
    pub fn begin(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Closed,
    Creating(EventInput),
    Editing { original: Event, input: EventInput },
}

impl FormState {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormState::Closed)
    }

    pub fn input(&self) -> Option<&EventInput> {
        match self {
            FormState::Closed => None,
            FormState::Creating(input) | FormState::Editing { input, .. } => Some(input),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Planner {
    today: NaiveDate,
    month: YearMonth,
    events: Vec<Event>,
    form: FormState,
    active: Option<Event>,
    busy: Busy,
    offline: bool,
}

impl Planner {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_busy(today, Busy::default())
    }

    /// A planner that shares its busy flag with every other holder of `busy`.
    pub fn with_busy(today: NaiveDate, busy: Busy) -> Self {
        Self {
            today,
            month: YearMonth::of(today),
            events: Vec::new(),
            form: FormState::Closed,
            active: None,
            busy,
            offline: false,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn active(&self) -> Option<&Event> {
        self.active.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Read the collection once for this session. Returns a notice when the
    /// store had to serve a fallback copy.
    pub async fn load<S: EventStore>(&mut self, store: &S) -> Option<Notice> {
        let loaded = store.load().await;

        self.events = loaded.events;
        self.offline = loaded.offline;
        loaded.offline.then(|| Notice::error(OFFLINE))
    }

    pub fn grid(&self) -> MonthGrid {
        calendar::month_grid(self.month, &self.events, self.today)
    }

    /// Jump straight to `month`. Months past the forward limit are refused.
    pub fn show_month(&mut self, month: YearMonth) -> Result<(), Notice> {
        if !calendar::within_horizon(month, self.today) {
            return Err(Notice::error(MONTH_LIMIT));
        }
        self.month = month;
        Ok(())
    }

    pub fn previous_month(&mut self) {
        self.month = self.month.previous();
    }

    pub fn next_month(&mut self) -> Result<(), Notice> {
        if !calendar::can_advance(self.month, self.today) {
            return Err(Notice::error(MONTH_LIMIT));
        }
        self.month = self.month.next();
        Ok(())
    }

    /// Open a blank form for `date` (today when absent). Ignored while a
    /// store write is in flight.
    pub fn open_create(&mut self, date: Option<NaiveDate>) -> bool {
        if self.busy.is_set() {
            return false;
        }
        self.active = None;
        self.form = FormState::Creating(EventInput::blank(date.unwrap_or(self.today)));
        true
    }

    /// Close the detail view and open the form pre-filled from the active
    /// event.
    pub fn open_edit(&mut self) -> bool {
        let Some(original) = self.active.take() else {
            return false;
        };
        let input = EventInput::from_event(&original);
        self.form = FormState::Editing { original, input };
        true
    }

    pub fn close_form(&mut self) {
        self.form = FormState::Closed;
    }

    /// Validate `input` and hand it to the store, creating or updating
    /// depending on the open form. On any failure the form stays open
    /// holding `input`.
    pub async fn submit<S: EventStore>(
        &mut self,
        store: &S,
        input: EventInput,
    ) -> Result<Notice, Notice> {
        let editing = match &mut self.form {
            FormState::Closed => return Err(Notice::error(NO_FORM)),
            FormState::Creating(current) => {
                *current = input.clone();
                None
            }
            FormState::Editing { original, input: current } => {
                *current = input.clone();
                Some(original.id)
            }
        };

        let id = match editing {
            Some(id) => id,
            None => next_id(&self.events).ok_or_else(|| Notice::error(IDS_EXHAUSTED))?,
        };
        let event = form::validate(&input, id, self.today).map_err(|e| Notice::error(e.to_string()))?;

        let Some(_guard) = self.busy.begin() else {
            return Err(Notice::error(BUSY));
        };
        let saved = match editing {
            Some(_) => store.update(&event).await,
            None => store.create(&event).await,
        };

        if let Err(e) = saved {
            tracing::error!(event_id = id, "Failed to save event: {e}");
            return Err(Notice::error(SAVE_FAILED));
        }

        let notice = if editing.is_some() {
            replace(&mut self.events, event);
            Notice::success("Event updated.")
        } else {
            self.events.push(event);
            Notice::success("Event created.")
        };
        self.form = FormState::Closed;
        Ok(notice)
    }

    /// Open the detail view for `id` and make it the active event.
    pub fn show_detail(&mut self, id: EventId) -> Option<&Event> {
        self.active = find(&self.events, id).cloned();
        self.active.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.active = None;
    }

    /// Delete the active event. Without `confirmed`, or with nothing active,
    /// nothing happens and `Ok(None)` comes back.
    pub async fn delete_active<S: EventStore>(
        &mut self,
        store: &S,
        confirmed: bool,
    ) -> Result<Option<Notice>, Notice> {
        if !confirmed {
            return Ok(None);
        }
        let Some(id) = self.active.as_ref().map(|e| e.id) else {
            return Ok(None);
        };
        let Some(_guard) = self.busy.begin() else {
            return Err(Notice::error(BUSY));
        };
        let deleted = store.delete(id).await;

        if let Err(e) = deleted {
            tracing::error!(event_id = id, "Failed to delete event: {e}");
            return Err(Notice::error(DELETE_FAILED));
        }

        remove(&mut self.events, id);
        self.active = None;
        Ok(Some(Notice::success("Event deleted.")))
    }
}
