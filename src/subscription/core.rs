//! Subscription plans and the subscriptions users hold on them.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    database_id::DatabaseId,
    money::get_decimal,
    subscription::seats::{SeatReservation, assign_seat, reserve_seat_in_transaction},
};

/// Database identifier for a subscription plan.
pub type PlanId = DatabaseId;

/// Database identifier for a subscription.
pub type SubscriptionId = DatabaseId;

/// The billing state of a subscription. Only active subscriptions grant seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up and in use.
    Active,
    /// Cancelled by the owner.
    Canceled,
    /// A payment is overdue.
    PastDue,
    /// Payment failed and the subscription lapsed.
    Unpaid,
    /// In a free trial.
    Trialing,
}

impl SubscriptionStatus {
    fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Trialing => "trialing",
        }
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for SubscriptionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SubscriptionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            other => Err(FromSqlError::Other(
                format!("unknown subscription status \"{other}\"").into(),
            )),
        }
    }
}

/// A subscription tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    /// The ID of the plan.
    pub id: PlanId,
    /// The display name of the plan.
    pub name: String,
    /// How many users, the owner included, may share a subscription.
    pub max_seats: i64,
    /// The price per billing period.
    pub price: Decimal,
}

/// A user's subscription to a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: SubscriptionId,
    /// The user who pays for the subscription and manages its seats.
    pub owner_id: UserID,
    /// The plan subscribed to.
    pub plan_id: PlanId,
    /// The billing state.
    pub status: SubscriptionStatus,
    /// When the subscription was created.
    pub created_at: OffsetDateTime,
}

/// Create the plan, subscription, seat and invitation tables.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_subscription_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscription_plan (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            max_seats INTEGER NOT NULL CHECK (max_seats >= 1),
            price TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subscription (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            plan_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(plan_id) REFERENCES subscription_plan(id) ON UPDATE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_subscription_one_active_per_owner
            ON subscription(owner_id) WHERE status = 'active';

        CREATE TABLE IF NOT EXISTS subscription_seat (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subscription_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            assigned_at TEXT NOT NULL,
            deactivated_at TEXT,
            UNIQUE(subscription_id, user_id),
            FOREIGN KEY(subscription_id) REFERENCES subscription(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS invitation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            inviter_id INTEGER NOT NULL,
            email TEXT NOT NULL,
            token TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            responded_at TEXT,
            FOREIGN KEY(inviter_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )
}

fn map_plan_row(row: &Row) -> Result<SubscriptionPlan, rusqlite::Error> {
    Ok(SubscriptionPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        max_seats: row.get(2)?,
        price: get_decimal(row, 3)?,
    })
}

pub(crate) fn map_subscription_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        plan_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Create a subscription plan.
///
/// # Errors
/// Returns [Error::InvalidSeatCount] if `max_seats` is less than one,
/// [Error::InvalidAmount] if `price` is negative, or [Error::SqlError] if there
/// is some other SQL error.
pub fn create_plan(
    name: &str,
    max_seats: i64,
    price: Decimal,
    connection: &Connection,
) -> Result<SubscriptionPlan, Error> {
    if max_seats < 1 {
        return Err(Error::InvalidSeatCount(max_seats));
    }

    if price < Decimal::ZERO {
        return Err(Error::InvalidAmount(price.to_string()));
    }

    let plan = connection
        .prepare(
            "INSERT INTO subscription_plan (name, max_seats, price) VALUES (?1, ?2, ?3)
             RETURNING id, name, max_seats, price",
        )?
        .query_row((name, max_seats, price.to_string()), map_plan_row)?;

    Ok(plan)
}

/// Get a plan by its ID.
pub fn get_plan(plan_id: PlanId, connection: &Connection) -> Result<SubscriptionPlan, Error> {
    let plan = connection
        .prepare("SELECT id, name, max_seats, price FROM subscription_plan WHERE id = ?1")?
        .query_row([plan_id], map_plan_row)?;

    Ok(plan)
}

/// Subscribe `owner_id` to a plan.
///
/// The owner takes the first seat when the subscription starts out active.
///
/// # Errors
/// Returns [Error::DuplicateSubscription] if the owner already has an active
/// subscription, [Error::NotFound] if the plan does not exist, or
/// [Error::SqlError] if there is some other SQL error.
pub fn create_subscription(
    owner_id: UserID,
    plan_id: PlanId,
    status: SubscriptionStatus,
    connection: &Connection,
) -> Result<Subscription, Error> {
    get_plan(plan_id, connection)?;

    let transaction = connection.unchecked_transaction()?;

    let subscription = transaction
        .prepare(
            "INSERT INTO subscription (owner_id, plan_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, owner_id, plan_id, status, created_at",
        )?
        .query_row(
            (owner_id, plan_id, status, OffsetDateTime::now_utc()),
            map_subscription_row,
        )
        .map_err(map_duplicate_subscription(owner_id))?;

    if status == SubscriptionStatus::Active {
        assign_seat(subscription.id, owner_id, &transaction)?;
    }

    transaction.commit()?;

    tracing::info!("user {owner_id} subscribed to plan {plan_id} with status {status}");

    Ok(subscription)
}

/// Change the status of a subscription.
///
/// Reactivating a subscription gives the owner their seat back if one is free.
/// Members who joined while the owner had no seat keep theirs, so the owner
/// can be left without a seat rather than going over the plan's limit.
///
/// # Errors
/// Returns [Error::NotFound] if the subscription does not exist,
/// [Error::DuplicateSubscription] if the owner already has another active
/// subscription, or [Error::SqlError] if there is some other SQL error.
pub fn set_subscription_status(
    subscription_id: SubscriptionId,
    status: SubscriptionStatus,
    connection: &Connection,
) -> Result<Subscription, Error> {
    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let current = get_subscription(subscription_id, &transaction)?;

    let subscription = transaction
        .prepare(
            "UPDATE subscription SET status = ?1 WHERE id = ?2
             RETURNING id, owner_id, plan_id, status, created_at",
        )?
        .query_row((status, subscription_id), map_subscription_row)
        .map_err(map_duplicate_subscription(current.owner_id))?;

    if status == SubscriptionStatus::Active
        && reserve_seat_in_transaction(subscription.id, subscription.owner_id, &transaction)?
            == SeatReservation::NoSeatsAvailable
    {
        tracing::warn!(
            "owner {} of subscription {subscription_id} has no seat because all seats are taken",
            subscription.owner_id
        );
    }

    transaction.commit()?;

    tracing::info!(
        "subscription {subscription_id} changed from {} to {status}",
        current.status
    );

    Ok(subscription)
}

/// Get a subscription by its ID.
pub fn get_subscription(
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Subscription, Error> {
    let subscription = connection
        .prepare(
            "SELECT id, owner_id, plan_id, status, created_at FROM subscription WHERE id = ?1",
        )?
        .query_row([subscription_id], map_subscription_row)?;

    Ok(subscription)
}

/// Get the active subscription that `owner_id` pays for, if any.
pub fn get_owned_active_subscription(
    owner_id: UserID,
    connection: &Connection,
) -> Result<Option<Subscription>, Error> {
    let result = connection
        .prepare(
            "SELECT id, owner_id, plan_id, status, created_at FROM subscription
             WHERE owner_id = ?1 AND status = 'active'",
        )?
        .query_row([owner_id], map_subscription_row);

    match result {
        Ok(subscription) => Ok(Some(subscription)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn map_duplicate_subscription(owner_id: UserID) -> impl FnOnce(rusqlite::Error) -> Error {
    move |error| match error {
        rusqlite::Error::SqliteFailure(error, Some(_))
            if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateSubscription(owner_id)
        }
        error => error.into(),
    }
}
