use axum::{
    Router,
    body::to_bytes,
    extract::Path,
    response::Response,
    routing::post,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use axum_test::TestServer;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, UserID, app_state::DEFAULT_INVITATION_LIFETIME, auth::COOKIE_TOKEN, build_router,
    set_auth_cookie,
};

const TEST_LOG_IN_ROUTE_PATH: &str = "/test/log_in/{user_id}";

/// Read a response body as JSON.
pub(crate) async fn parse_json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// Stands in for the external auth provider by setting the session cookie.
async fn stub_log_in_route(Path(user_id): Path<i64>, jar: PrivateCookieJar) -> PrivateCookieJar {
    set_auth_cookie(jar, UserID::new(user_id), Duration::hours(1)).unwrap()
}

/// Build the full application on `connection`.
#[track_caller]
pub(crate) fn get_test_server(connection: Connection) -> (TestServer, AppState) {
    let state = AppState::new(connection, "foobar", "Etc/UTC", DEFAULT_INVITATION_LIFETIME)
        .expect("could not create app state");
    let app = build_router(state.clone()).merge(
        Router::new()
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state.clone()),
    );

    let server = TestServer::try_new(app).expect("could not create test server");

    (server, state)
}

/// Get a session cookie for `user_id` from the stub log in route.
pub(crate) async fn log_in_as(server: &TestServer, user_id: UserID) -> Cookie<'static> {
    let response = server
        .post(&TEST_LOG_IN_ROUTE_PATH.replace("{user_id}", &user_id.to_string()))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_TOKEN)
}
