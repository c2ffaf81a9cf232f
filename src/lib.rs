//! Kitty is a web service for managing personal and shared finances.
//!
//! This library provides a JSON REST API for accounts, categories, transactions,
//! monthly budgets, period summaries and the seats of shared subscriptions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod budget;
mod category;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod money;
mod routing;
mod subscription;
mod summary;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountId, NewAccount, create_account};
pub use app_state::{AppState, DEFAULT_INVITATION_LIFETIME};
pub use auth::{Token, set_auth_cookie};
pub use budget::{
    BudgetOverview, CategoryBudgetRow, compute_category_budget_row, set_planned_amount,
};
pub use category::{Category, CategoryId, CategoryName, NewCategory, create_category};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::parse_amount;
pub use routing::build_router;
pub use subscription::{
    InvitationOutcome, SeatReservation, SubscriptionLimits, SubscriptionStatus,
    accept_invitation, create_plan, create_subscription, get_limits, reserve_seat,
};
pub use summary::{SummaryData, compute_period_summary};
pub use transaction::{DateRange, Transaction, create_transaction};
pub use user::{User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Expected business outcomes, such as a subscription with no free seats or an
/// invitation that has already been used, are not errors. Those are returned as
/// outcome values by the subscription module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A monetary amount could not be parsed as an exact decimal number.
    ///
    /// Amounts are never coerced to zero since that would silently corrupt totals.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The start of a date range was after its end.
    #[error("the start date {start} is after the end date {end}")]
    InvalidDateRange {
        /// The first day of the range.
        start: Date,
        /// The last day of the range.
        end: Date,
    },

    /// A month number outside of 1 to 12 was given.
    #[error("{0} is not a valid month")]
    InvalidMonth(u8),

    /// A year outside the range supported for calendar dates was given.
    #[error("{0} is not a supported year")]
    InvalidYear(i32),

    /// A currency code that is not three ASCII letters was given.
    #[error("\"{0}\" is not a valid currency code")]
    InvalidCurrency(String),

    /// A plan must have at least one seat for its owner.
    #[error("a plan must have at least one seat, got {0}")]
    InvalidSeatCount(i64),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// The user already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The user already has an account with this name.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The email address is already registered to another user.
    #[error("the email \"{0}\" is already in use")]
    DuplicateEmail(String),

    /// The string is not a plausible email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The category ID does not refer to a category owned by the user.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(i64),

    /// The account ID does not refer to an account owned by the user.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(i64),

    /// The request did not carry a valid session token.
    #[error("you must be logged in to access this resource")]
    Unauthorized,

    /// The user already pays for an active subscription.
    #[error("user {0} already has an active subscription")]
    DuplicateSubscription(UserID),

    /// Only the owner of a subscription may manage its seats.
    #[error("only the owner of the subscription can manage its seats")]
    NotSubscriptionOwner,

    /// The owner of a subscription cannot give up their own seat.
    #[error("the owner of the subscription cannot remove their own seat")]
    RemoveSubscriptionOwner,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to close an account that does not exist
    #[error("tried to close an account that is not in the database")]
    UpdateMissingAccount,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound | Error::DeleteMissingTransaction => StatusCode::NOT_FOUND,
            Error::UpdateMissingCategory | Error::UpdateMissingAccount => StatusCode::NOT_FOUND,
            Error::InvalidAmount(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidMonth(_)
            | Error::InvalidYear(_)
            | Error::InvalidCurrency(_)
            | Error::InvalidSeatCount(_)
            | Error::EmptyCategoryName
            | Error::InvalidEmail(_)
            | Error::InvalidCategory(_)
            | Error::InvalidAccount(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateCategoryName(_)
            | Error::DuplicateAccountName(_)
            | Error::DuplicateEmail(_)
            | Error::DuplicateSubscription(_)
            | Error::RemoveSubscriptionOwner => StatusCode::CONFLICT,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotSubscriptionOwner => StatusCode::FORBIDDEN,
            Error::SqlError(_) | Error::InvalidTimezoneError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
