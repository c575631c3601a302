use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_sessions::Session;

use crate::calendar::YearMonth;
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::form::EventInput;
use crate::models::event::parse_date;
use crate::models::{Event, EventId};
use crate::planner::{Notice, Planner, BUSY};
use crate::routes::calendar::month_url;
use crate::AppState;

#[derive(Template)]
#[template(path = "events/form.html")]
struct EventFormTemplate {
    title: &'static str,
    action: String,
    cancel: String,
    input: EventInput,
    error: Option<String>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "events/detail.html")]
struct EventDetailTemplate {
    event: Event,
    date_label: String,
    back: String,
    notice: Option<Notice>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "events/delete.html")]
struct DeleteEventTemplate {
    event: Event,
    date_label: String,
    static_hash: &'static str,
}

#[derive(Deserialize)]
pub struct NewEventQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    confirm: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/new", get(new_event_form))
        .route("/events", axum::routing::post(create_event))
        .route("/events/{id}", get(show_event).post(update_event))
        .route("/events/{id}/edit", get(edit_event_form))
        .route("/events/{id}/delete", get(confirm_delete).post(delete_event))
}

fn event_url(id: EventId) -> String {
    format!("/events/{id}")
}

fn month_of(date: &str, fallback: NaiveDate) -> String {
    month_url(YearMonth::of(parse_date(date.trim()).unwrap_or(fallback)))
}

fn render_form(
    title: &'static str,
    action: String,
    input: EventInput,
    error: Option<String>,
    today: NaiveDate,
) -> Result<Response, AppError> {
    let template = EventFormTemplate {
        title,
        action,
        cancel: month_of(&input.date, today),
        input,
        error,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?).into_response())
}

/// Fresh planner with the collection loaded and `id` open in the detail view.
async fn planner_with_event(state: &AppState, id: EventId) -> Result<Planner, AppError> {
    let mut planner = Planner::with_busy(crate::today(), state.busy.clone());
    planner.load(&state.events).await;
    if planner.show_detail(id).is_none() {
        return Err(AppError::EventNotFound(id));
    }
    Ok(planner)
}

async fn new_event_form(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NewEventQuery>,
) -> Result<Response, AppError> {
    let today = crate::today();
    let date = query.date.as_deref().and_then(parse_date);

    let mut planner = Planner::with_busy(today, state.busy.clone());
    if !planner.open_create(date) {
        flash::push(&session, Notice::error(BUSY)).await?;
        return Ok(Redirect::to(&month_url(YearMonth::of(date.unwrap_or(today)))).into_response());
    }
    let input = planner.form().input().cloned().unwrap_or_else(|| EventInput::blank(today));

    render_form("New event", "/events".to_string(), input, None, today)
}

async fn create_event(
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<EventInput>,
) -> Result<Response, AppError> {
    let today = crate::today();
    let mut planner = Planner::with_busy(today, state.busy.clone());
    planner.load(&state.events).await;
    if !planner.open_create(None) {
        return render_form("New event", "/events".to_string(), input, Some(BUSY.to_string()), today);
    }

    let back = month_of(&input.date, today);
    match planner.submit(&state.events, input).await {
        Ok(notice) => {
            flash::push(&session, notice).await?;
            Ok(Redirect::to(&back).into_response())
        }
        Err(notice) => {
            let input = planner.form().input().cloned().unwrap_or_default();
            render_form("New event", "/events".to_string(), input, Some(notice.message), today)
        }
    }
}

async fn show_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
    Flash(notice): Flash,
) -> Result<Response, AppError> {
    let planner = planner_with_event(&state, id).await?;
    let Some(event) = planner.active().cloned() else {
        return Err(AppError::EventNotFound(id));
    };

    let template = EventDetailTemplate {
        date_label: event.date_long(),
        back: month_url(YearMonth::of(event.date)),
        notice,
        event,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?).into_response())
}

async fn edit_event_form(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Response, AppError> {
    let mut planner = planner_with_event(&state, id).await?;
    planner.open_edit();
    let input = planner.form().input().cloned().unwrap_or_default();

    render_form("Edit event", event_url(id), input, None, planner.today())
}

async fn update_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<EventId>,
    Form(input): Form<EventInput>,
) -> Result<Response, AppError> {
    let mut planner = planner_with_event(&state, id).await?;
    planner.open_edit();

    let back = month_of(&input.date, planner.today());
    match planner.submit(&state.events, input).await {
        Ok(notice) => {
            flash::push(&session, notice).await?;
            Ok(Redirect::to(&back).into_response())
        }
        Err(notice) => {
            let input = planner.form().input().cloned().unwrap_or_default();
            render_form("Edit event", event_url(id), input, Some(notice.message), planner.today())
        }
    }
}

async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Response, AppError> {
    let planner = planner_with_event(&state, id).await?;
    let Some(event) = planner.active().cloned() else {
        return Err(AppError::EventNotFound(id));
    };

    let template = DeleteEventTemplate {
        date_label: event.date_long(),
        event,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?).into_response())
}

/// Deletes only when the form carries `confirm=yes`.
async fn delete_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<EventId>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let mut planner = planner_with_event(&state, id).await?;
    let back = planner
        .active()
        .map(|e| month_url(YearMonth::of(e.date)))
        .unwrap_or_else(|| "/".to_string());

    let confirmed = form.confirm.as_deref() == Some("yes");
    match planner.delete_active(&state.events, confirmed).await {
        Ok(Some(notice)) => {
            flash::push(&session, notice).await?;
            Ok(Redirect::to(&back).into_response())
        }
        Ok(None) => Ok(Redirect::to(&event_url(id)).into_response()),
        Err(notice) => {
            flash::push(&session, notice).await?;
            Ok(Redirect::to(&event_url(id)).into_response())
        }
    }
}
