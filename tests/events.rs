mod common;

use axum::http::StatusCode;
use common::{assert_redirect, body_string, days_from_today, event, session_cookie, TestApp};
use yotei::calendar::YearMonth;

fn form_body(name: &str, date: &str, start: &str, end: &str) -> String {
    format!(
        "location=Studio+B&name={name}&date={date}&start_time={start}&end_time={end}&instructor=Mori&color=%2310b981"
    )
}

fn iso(days: u64) -> String {
    days_from_today(days).format("%Y-%m-%d").to_string()
}

fn month_url(days: u64) -> String {
    format!("/calendar?month={}", YearMonth::of(days_from_today(days)))
}

#[tokio::test]
async fn new_event_form_prefills_the_clicked_date() {
    let app = TestApp::new().await;

    let resp = app.get(&format!("/events/new?date={}", iso(3)), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains(&format!("value=\"{}\"", iso(3))));
    assert!(html.contains("value=\"#3b82f6\""));
}

#[tokio::test]
async fn create_event_with_valid_form() {
    let app = TestApp::new().await;

    let body = form_body("Yoga", &iso(5), "09%3A00", "10%3A00");
    let resp = app.post_form("/events", &body, None).await;
    assert_redirect(&resp, &month_url(5));
    let cookie = session_cookie(&resp);

    let stored = app.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Yoga");
    assert_eq!(stored[0].location, "Studio B");
    assert_eq!(stored[0].color, "#10b981");
    assert_eq!(stored[0].time_range(), "09:00 - 10:00");

    let html = body_string(app.get(&month_url(5), Some(&cookie)).await).await;
    assert!(html.contains("Event created."));
    assert!(html.contains("09:00 Yoga"));
}

#[tokio::test]
async fn create_with_end_before_start_shows_error() {
    let app = TestApp::new().await;

    let body = form_body("Yoga", &iso(2), "10%3A00", "09%3A00");
    let resp = app.post_form("/events", &body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("End time must be after start time."));
    // Typed data survives.
    assert!(html.contains("value=\"Yoga\""));
    assert!(html.contains("value=\"10:00\""));
    assert!(app.stored().await.is_empty());
}

#[tokio::test]
async fn create_past_one_month_shows_error() {
    let app = TestApp::new().await;

    let body = form_body("Yoga", &iso(40), "09%3A00", "10%3A00");
    let resp = app.post_form("/events", &body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Events can only be created up to one month ahead."));
    assert!(app.stored().await.is_empty());
}

#[tokio::test]
async fn created_ids_are_unique() {
    let app = TestApp::new().await;
    for name in ["A", "B", "C"] {
        let body = form_body(name, &iso(1), "09%3A00", "10%3A00");
        app.post_form("/events", &body, None).await;
    }

    let mut ids: Vec<_> = app.stored().await.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), 3);
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn show_event_details() {
    let app = TestApp::new().await;
    let yoga = event(1001, "Yoga", 4);
    app.seed(&[yoga.clone()]).await;

    let resp = app.get("/events/1001", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Yoga"));
    assert!(html.contains(&yoga.date_long()));
    assert!(html.contains("09:00 - 10:00"));
    assert!(html.contains("Sato"));
    assert!(html.contains("/events/1001/edit"));
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let app = TestApp::new().await;
    let resp = app.get("/events/424242", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.get("/events/424242/edit", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_form_is_prefilled() {
    let app = TestApp::new().await;
    app.seed(&[event(1001, "Original Title", 4)]).await;

    let resp = app.get("/events/1001/edit", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("value=\"Original Title\""));
    assert!(html.contains("action=\"/events/1001\""));
    assert!(html.contains(&format!("value=\"{}\"", iso(4))));
}

#[tokio::test]
async fn update_event_keeps_id_and_position() {
    let app = TestApp::new().await;
    app.seed(&[event(1, "First", 1), event(1001, "Old", 4), event(3, "Last", 1)])
        .await;

    let body = form_body("New", &iso(6), "18%3A00", "19%3A30");
    let resp = app.post_form("/events/1001", &body, None).await;
    assert_redirect(&resp, &month_url(6));

    let stored = app.stored().await;
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].id, 1001);
    assert_eq!(stored[1].name, "New");
    assert_eq!(stored[1].time_range(), "18:00 - 19:30");
    assert_eq!(stored[0].name, "First");
    assert_eq!(stored[2].name, "Last");
}

#[tokio::test]
async fn update_with_reversed_times_leaves_event_unchanged() {
    let app = TestApp::new().await;
    let original = event(1001, "Spin", 4);
    app.seed(&[original.clone()]).await;

    let body = form_body("Spin", &iso(4), "11%3A00", "10%3A00");
    let resp = app.post_form("/events/1001", &body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("End time must be after start time."));

    assert_eq!(app.stored().await, vec![original]);
}

#[tokio::test]
async fn delete_page_asks_for_confirmation() {
    let app = TestApp::new().await;
    app.seed(&[event(7, "Boxing", 2)]).await;

    let resp = app.get("/events/7/delete", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("name=\"confirm\" value=\"yes\""));
    assert!(html.contains("Boxing"));
}

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let app = TestApp::new().await;
    let original = vec![event(7, "Boxing", 2)];
    app.seed(&original).await;

    let resp = app.post_form("/events/7/delete", "", None).await;
    assert_redirect(&resp, "/events/7");
    assert_eq!(app.stored().await, original);

    let resp = app.post_form("/events/7/delete", "confirm=no", None).await;
    assert_redirect(&resp, "/events/7");
    assert_eq!(app.stored().await, original);
}

#[tokio::test]
async fn confirmed_delete_removes_only_that_event() {
    let app = TestApp::new().await;
    let keep = event(1, "Keep", 2);
    app.seed(&[keep.clone(), event(7, "Boxing", 2)]).await;

    let resp = app.post_form("/events/7/delete", "confirm=yes", None).await;
    assert_redirect(&resp, &month_url(2));
    let cookie = session_cookie(&resp);

    assert_eq!(app.stored().await, vec![keep]);

    let html = body_string(app.get(&month_url(2), Some(&cookie)).await).await;
    assert!(html.contains("Event deleted."));
    assert!(!html.contains("Boxing"));
}

#[tokio::test]
async fn deleting_an_unknown_event_is_not_found() {
    let app = TestApp::new().await;
    let resp = app.post_form("/events/55/delete", "confirm=yes", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_after_the_largest_possible_id_is_refused() {
    let app = TestApp::new().await;
    let last = vec![event(i64::MAX, "Last", 1)];
    app.seed(&last).await;

    let body = form_body("Yoga", &iso(2), "09%3A00", "10%3A00");
    let resp = app.post_form("/events", &body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("No new event id is available."));
    assert_eq!(app.stored().await, last);
}

#[tokio::test]
async fn create_with_css_in_color_shows_error() {
    let app = TestApp::new().await;

    let body = form_body("Yoga", &iso(2), "09%3A00", "10%3A00")
        .replace("color=%2310b981", "color=red%3Bbackground%3Aurl(x)");
    let resp = app.post_form("/events", &body, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Color must be given as #rrggbb."));
    assert!(app.stored().await.is_empty());
}
