use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::calendar::{MonthGrid, YearMonth, WEEKDAY_LABELS};
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::planner::{Notice, Planner};
use crate::AppState;

#[derive(Template)]
#[template(path = "calendar.html")]
struct CalendarTemplate {
    grid: MonthGrid,
    heading: String,
    previous: String,
    current: String,
    weekdays: [&'static str; 7],
    notice: Option<Notice>,
    busy: bool,
    static_hash: &'static str,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    month: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    from: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show_calendar))
        .route("/calendar", get(show_calendar))
        .route("/calendar/next", get(next_month))
}

pub fn month_url(month: YearMonth) -> String {
    format!("/calendar?month={month}")
}

fn parse_month(raw: Option<&str>) -> Option<YearMonth> {
    raw.and_then(|s| s.parse().ok())
}

async fn show_calendar(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
    Flash(flashed): Flash,
) -> Result<impl IntoResponse, AppError> {
    let mut planner = Planner::with_busy(crate::today(), state.busy.clone());
    let offline = planner.load(&state.events).await;

    let mut notice = flashed.or(offline);
    if let Some(month) = parse_month(query.month.as_deref()) {
        if let Err(refused) = planner.show_month(month) {
            notice = Some(refused);
        }
    }

    let month = planner.month();
    let template = CalendarTemplate {
        grid: planner.grid(),
        heading: month.label(),
        previous: month_url(month.previous()),
        current: month.to_string(),
        weekdays: WEEKDAY_LABELS,
        notice,
        busy: planner.is_busy(),
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

/// Forward navigation. Refused moves flash a notice and stay on `from`.
async fn next_month(
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut planner = Planner::new(crate::today());
    if let Some(month) = parse_month(query.from.as_deref()) {
        if let Err(refused) = planner.show_month(month) {
            flash::push(&session, refused).await?;
            return Ok(Redirect::to(&month_url(planner.month())));
        }
    }

    if let Err(refused) = planner.next_month() {
        flash::push(&session, refused).await?;
    }
    Ok(Redirect::to(&month_url(planner.month())))
}
