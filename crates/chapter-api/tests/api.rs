//! Router-level tests: requests go through the real middleware and handlers
//! against an in-memory database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Local, TimeDelta};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use chapter_api::auth::{AppState, AppStateInner, create_token};
use chapter_api::routes::router;
use chapter_db::Database;
use chapter_types::models::Role;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            admin_usernames: vec!["president".into()],
        });
        Self {
            router: router(state.clone()),
            state,
        }
    }

    /// Insert a user directly and mint a token, skipping the password hash.
    fn user(&self, username: &str, role: Role) -> (String, String) {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_user(&id.to_string(), username, "unused", role)
            .unwrap();
        let token = create_token(SECRET, id, username, role).unwrap();
        (token, id.to_string())
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create_event(&self, admin_token: &str, body: Value) -> String {
        let (status, event) = self.call(Method::POST, "/events", Some(admin_token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", event);
        event["id"].as_str().unwrap().to_string()
    }
}

/// Started half an hour ago, runs two hours.
fn in_session_event(limit: u32) -> Value {
    let start = Local::now().naive_local() - TimeDelta::minutes(30);
    json!({
        "event_name": "General Body Meeting",
        "event_date": start.date().format("%Y-%m-%d").to_string(),
        "event_time": start.time().format("%H:%M:%S").to_string(),
        "event_hours": 2.0,
        "event_location": "Hitchcock Hall 131",
        "event_lat": 40.0036,
        "event_long": -83.0152,
        "event_limit": limit,
        "check_in_window": 15,
        "check_in_radius": 100.0
    })
}

fn future_event(limit: u32) -> Value {
    let mut event = in_session_event(limit);
    let later = Local::now().date_naive() + TimeDelta::days(30);
    event["event_date"] = json!(later.format("%Y-%m-%d").to_string());
    event
}

#[tokio::test]
async fn register_and_login() {
    let app = TestApp::new();

    let (status, body) = app
        .call(Method::POST, "/auth/register", None, Some(json!({"username": "brutus", "password": "buckeyes1870"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "member");
    assert!(body["token"].as_str().is_some());

    let (status, body) = app
        .call(Method::POST, "/auth/register", None, Some(json!({"username": "brutus", "password": "buckeyes1870"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username is already taken");

    let (status, body) = app
        .call(Method::POST, "/auth/register", None, Some(json!({"username": "president", "password": "buckeyes1870"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "admin");

    let (status, body) = app
        .call(Method::POST, "/auth/login", None, Some(json!({"username": "brutus", "password": "buckeyes1870"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "brutus");

    let (status, body) = app
        .call(Method::POST, "/auth/login", None, Some(json!({"username": "brutus", "password": "wrong-password"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .call(Method::POST, "/auth/register", None, Some(json!({"username": "brutus", "password": "short"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");

    let (status, _) = app.call(Method::POST, "/events/rsvp/anything", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, "/events/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn members_cannot_administer_events() {
    let app = TestApp::new();
    let (member, _) = app.user("member1", Role::Member);
    let (sponsor, _) = app.user("sponsor1", Role::Sponsor);

    let (status, _) = app.call(Method::POST, "/events", Some(&member), Some(future_event(5))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::POST, "/events", Some(&sponsor), Some(future_event(5))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (admin, _) = app.user("admin1", Role::Admin);
    let id = app.create_event(&admin, future_event(5)).await;

    let (status, _) = app.call(Method::DELETE, &format!("/events/{}", id), Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::DELETE, &format!("/events/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.call(Method::DELETE, &format!("/events/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn rsvp_capacity_and_idempotent_removal() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (u1, _) = app.user("member1", Role::Member);
    let (u2, _) = app.user("member2", Role::Member);
    let (u3, _) = app.user("member3", Role::Member);
    let id = app.create_event(&admin, future_event(2)).await;
    let rsvp = format!("/events/rsvp/{}", id);
    let unrsvp = format!("/events/unrsvp/{}", id);

    let (status, body) = app.call(Method::POST, &rsvp, Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rsvp_count"], 1);
    assert!(body["message"].is_string());

    let (status, body) = app.call(Method::POST, &rsvp, Some(&u1), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_RSVPED");

    let (status, body) = app.call(Method::POST, &rsvp, Some(&u2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rsvp_count"], 2);

    let (status, body) = app.call(Method::POST, &rsvp, Some(&u3), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");
    assert_eq!(body["error"], "This event has reached its RSVP limit");

    // Not present: still a success
    let (status, _) = app.call(Method::POST, &unrsvp, Some(&u3), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::POST, &unrsvp, Some(&u2), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.call(Method::POST, &rsvp, Some(&u3), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rsvp_count"], 2);

    let (status, _) = app.call(Method::POST, "/events/rsvp/no-such-event", Some(&u1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_in_lifecycle() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, member_id) = app.user("member1", Role::Member);
    let id = app.create_event(&admin, in_session_event(10)).await;
    let checkin = format!("/events/checkin/{}", id);
    let here = json!({"latitude": 40.0037, "longitude": -83.0151, "accuracy": 8.0});
    let far_away = json!({"latitude": 40.0136, "longitude": -83.0152, "accuracy": 8.0});

    let (status, body) = app.call(Method::POST, &checkin, Some(&member), Some(here.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_RSVPED");

    let (status, _) = app.call(Method::POST, &format!("/events/rsvp/{}", id), Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::POST, &checkin, Some(&member), Some(far_away)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "OUTSIDE_GEOFENCE");

    let (status, body) = app.call(Method::POST, &checkin, Some(&member), Some(here.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Checked in to General Body Meeting");

    let (status, body) = app.call(Method::POST, &checkin, Some(&member), Some(here)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CHECKED_IN");

    let (status, body) = app.call(Method::POST, &format!("/events/unrsvp/{}", id), Some(&member), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CHECKED_IN");

    let (_, events) = app.call(Method::GET, "/events", Some(&member), None).await;
    let event = &events.as_array().unwrap()[0];
    assert_eq!(event["event_attending"], json!([member_id.clone()]));
    assert_eq!(event["event_rsvped"], json!([member_id]));
}

#[tokio::test]
async fn check_in_outside_session_window() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, _) = app.user("member1", Role::Member);
    let id = app.create_event(&admin, future_event(10)).await;
    app.call(Method::POST, &format!("/events/rsvp/{}", id), Some(&member), None).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/events/checkin/{}", id),
            Some(&member),
            Some(json!({"latitude": 40.0036, "longitude": -83.0152})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EVENT_NOT_IN_SESSION");
}

#[tokio::test]
async fn check_in_rejects_impossible_coordinates() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, _) = app.user("member1", Role::Member);
    let id = app.create_event(&admin, in_session_event(10)).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/events/checkin/{}", id),
            Some(&member),
            Some(json!({"latitude": 123.0, "longitude": -83.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn hidden_events_stay_in_the_admin_bucket() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, _) = app.user("member1", Role::Member);
    let visible = app.create_event(&admin, future_event(10)).await;
    let hidden = app.create_event(&admin, future_event(10)).await;

    let (status, _) = app
        .call(Method::POST, &format!("/events/{}/hide", hidden), Some(&admin), Some(json!({"hidden": true})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, public) = app.call(Method::GET, "/events/public", None, None).await;
    let public = public.as_array().unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0]["id"], visible.as_str());
    assert!(public[0].get("event_rsvped").is_none());

    let (_, member_view) = app.call(Method::GET, "/events", Some(&member), None).await;
    assert_eq!(member_view.as_array().unwrap().len(), 1);
    assert!(member_view[0].get("is_hidden").is_none());

    let (_, admin_view) = app.call(Method::GET, "/events", Some(&admin), None).await;
    assert_eq!(admin_view.as_array().unwrap().len(), 2);

    let (status, _) = app.call(Method::POST, &format!("/events/rsvp/{}", hidden), Some(&member), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_keeps_membership() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, member_id) = app.user("member1", Role::Member);
    let id = app.create_event(&admin, future_event(10)).await;
    app.call(Method::POST, &format!("/events/rsvp/{}", id), Some(&member), None).await;

    let mut changed = future_event(20);
    changed["event_name"] = json!("Renamed Meeting");
    let (status, body) = app.call(Method::PUT, &format!("/events/{}", id), Some(&admin), Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_name"], "Renamed Meeting");
    assert_eq!(body["event_limit"], 20);
    assert_eq!(body["event_rsvped"], json!([member_id]));

    let mut invalid = future_event(20);
    invalid["event_hours"] = json!(0.0);
    let (status, _) = app.call(Method::PUT, &format!("/events/{}", id), Some(&admin), Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn announcements() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, _) = app.user("member1", Role::Member);

    let body = json!({"title": "Dues", "body": "Dues are due Friday"});
    let (status, _) = app.call(Method::POST, "/announcements", Some(&member), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.call(Method::POST, "/announcements", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["author_username"], "admin1");

    let (status, list) = app.call(Method::GET, "/announcements", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Dues");

    let uri = format!("/announcements/{}", created["id"].as_str().unwrap());
    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = TestApp::new();
    let (admin, _) = app.user("admin1", Role::Admin);
    let (member, _) = app.user("member1", Role::Member);
    let id = app.create_event(&admin, in_session_event(10)).await;
    let checkin = format!("/events/checkin/{}", id);

    let (status, body) = app
        .call(Method::POST, &checkin, Some(&member), Some(json!({"latitude": "north"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());

    let (status, body) = app.call(Method::POST, &checkin, Some(&member), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.call(Method::DELETE, "/announcements/not-a-uuid", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.call(Method::GET, "/announcements?limit=lots", Some(&member), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .call(Method::POST, "/auth/login", None, Some(json!({"username": "brutus"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
