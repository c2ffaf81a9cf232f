//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    account::{close_account_endpoint, create_account_endpoint, get_accounts_endpoint},
    auth::auth_guard,
    budget::{get_budget_endpoint, set_planned_amount_endpoint},
    category::{
        archive_category_endpoint, create_category_endpoint, get_categories_endpoint,
        reorder_categories_endpoint, update_category_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    subscription::{
        accept_invitation_endpoint, create_invitation_endpoint, decline_invitation_endpoint,
        get_seats_endpoint, get_subscription_status_endpoint, remove_member_endpoint,
    },
    summary::get_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except the health check requires a session cookie.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(endpoints::CLOSE_ACCOUNT, post(close_account_endpoint))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY_ORDER, put(reorder_categories_endpoint))
        .route(endpoints::CATEGORY, put(update_category_endpoint))
        .route(endpoints::ARCHIVE_CATEGORY, post(archive_category_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::BUDGETS,
            get(get_budget_endpoint)
                .post(set_planned_amount_endpoint)
                .put(set_planned_amount_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::SUBSCRIPTION_STATUS,
            get(get_subscription_status_endpoint),
        )
        .route(endpoints::SUBSCRIPTION_SEATS, get(get_seats_endpoint))
        .route(endpoints::SUBSCRIPTION_SEAT, delete(remove_member_endpoint))
        .route(endpoints::INVITATIONS, post(create_invitation_endpoint))
        .route(endpoints::ACCEPT_INVITATION, post(accept_invitation_endpoint))
        .route(
            endpoints::DECLINE_INVITATION,
            post(decline_invitation_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, log_in_as},
        user::create_user,
    };

    fn open_connection() -> Connection {
        Connection::open_in_memory().expect("could not open in-memory database")
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let (server, _) = get_test_server(open_connection());

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn api_requires_session() {
        let (server, _) = get_test_server(open_connection());

        let response = server.get(endpoints::ACCOUNTS).await;

        response.assert_status_unauthorized();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (server, _) = get_test_server(open_connection());

        let response = server.get("/api/nope").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn budget_flow_over_http() {
        let (server, state) = get_test_server(open_connection());
        let user_id = {
            let connection = state.db_connection.lock().unwrap();
            create_user("budget@example.com", &connection).unwrap().id
        };
        let cookie = log_in_as(&server, user_id).await;

        let account = server
            .post(endpoints::ACCOUNTS)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": "Everyday", "balance": "0", "currency": "nzd" }))
            .await;
        account.assert_status(StatusCode::CREATED);
        let account_id = account.json::<Value>()["id"].as_i64().unwrap();

        let category = server
            .post(endpoints::CATEGORIES)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": "Groceries" }))
            .await;
        category.assert_status(StatusCode::CREATED);
        let category_id = category.json::<Value>()["id"].as_i64().unwrap();

        for amount in ["-120.00", "-80.00"] {
            server
                .post(endpoints::TRANSACTIONS)
                .add_cookie(cookie.clone())
                .json(&json!({
                    "accountId": account_id,
                    "amount": amount,
                    "date": "2025-05-10",
                    "categoryId": category_id,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        server
            .put(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({
                "categoryId": category_id,
                "amount": "500.00",
                "year": 2025,
                "month": 5,
            }))
            .await
            .assert_status_ok();

        let budget = server
            .get(endpoints::BUDGETS)
            .add_query_params(json!({ "year": 2025, "month": 5 }))
            .add_cookie(cookie.clone())
            .await;
        budget.assert_status_ok();
        let line = &budget.json::<Value>()["categories"][0];
        assert_eq!(line["plannedAmount"], "500.00");
        assert_eq!(line["spentAmount"], "200.00");
        assert_eq!(line["remainingAmount"], "300.00");

        let summary = server
            .get(endpoints::SUMMARY)
            .add_query_params(json!({ "start": "2025-05-01", "end": "2025-05-31" }))
            .add_cookie(cookie.clone())
            .await;
        summary.assert_status_ok();
        let summary = summary.json::<Value>();
        assert_eq!(summary["expenses"], "200.00");
        assert_eq!(summary["netWorth"], "-200.00");
        assert_eq!(summary["asOf"], "2025-05-31");

        server
            .get(endpoints::SUMMARY)
            .add_query_params(json!({ "start": "2025-06-01", "end": "2025-05-01" }))
            .add_cookie(cookie)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn invitation_flow_over_http() {
        let (server, state) = get_test_server(open_connection());
        let (owner, invitee, outsider) = {
            let connection = state.db_connection.lock().unwrap();
            let owner = create_user("owner@example.com", &connection).unwrap().id;
            let plan =
                crate::create_plan("Duo", 2, rust_decimal_macros::dec!(5), &connection).unwrap();
            crate::create_subscription(
                owner,
                plan.id,
                crate::SubscriptionStatus::Active,
                &connection,
            )
            .unwrap();
            let invitee = create_user("invitee@example.com", &connection).unwrap().id;
            let outsider = create_user("outsider@example.com", &connection).unwrap().id;
            (owner, invitee, outsider)
        };
        let owner_cookie = log_in_as(&server, owner).await;
        let invitee_cookie = log_in_as(&server, invitee).await;
        let outsider_cookie = log_in_as(&server, outsider).await;

        server
            .get(endpoints::SUBSCRIPTION_STATUS)
            .add_cookie(outsider_cookie.clone())
            .await
            .assert_status_not_found();

        let invitation = server
            .post(endpoints::INVITATIONS)
            .add_cookie(owner_cookie.clone())
            .json(&json!({ "email": "invitee@example.com" }))
            .await;
        invitation.assert_status(StatusCode::CREATED);
        let token = invitation.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .post(endpoints::INVITATIONS)
            .add_cookie(outsider_cookie)
            .json(&json!({ "email": "someone@example.com" }))
            .await
            .assert_status_forbidden();

        server
            .post(endpoints::ACCEPT_INVITATION)
            .add_cookie(invitee_cookie.clone())
            .json(&json!({ "token": token }))
            .await
            .assert_status_ok();

        let status = server
            .get(endpoints::SUBSCRIPTION_STATUS)
            .add_cookie(invitee_cookie.clone())
            .await;
        status.assert_status_ok();
        assert_eq!(status.json::<Value>()["availableSeats"], 0);
        assert_eq!(status.json::<Value>()["canInvite"], false);

        server
            .post(endpoints::ACCEPT_INVITATION)
            .add_cookie(invitee_cookie.clone())
            .json(&json!({ "token": token }))
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .delete(&format_endpoint(
                endpoints::SUBSCRIPTION_SEAT,
                invitee.as_i64(),
            ))
            .add_cookie(invitee_cookie)
            .await
            .assert_status_forbidden();

        server
            .delete(&format_endpoint(
                endpoints::SUBSCRIPTION_SEAT,
                invitee.as_i64(),
            ))
            .add_cookie(owner_cookie.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let status = server
            .get(endpoints::SUBSCRIPTION_STATUS)
            .add_cookie(owner_cookie)
            .await;
        assert_eq!(status.json::<Value>()["availableSeats"], 1);
    }
}
