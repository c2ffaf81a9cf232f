//! Seat accounting for shared subscriptions.
//!
//! A seat is one user's place in a subscription. Seats are never deleted, they
//! are deactivated and can be reactivated later.

use rusqlite::{Connection, Row, TransactionBehavior};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, UserID, subscription::core::SubscriptionId};

/// A user's place in a subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// The subscription the seat belongs to.
    pub subscription_id: SubscriptionId,
    /// The user holding the seat.
    pub user_id: UserID,
    /// Whether the seat counts towards the plan's limit.
    pub is_active: bool,
    /// When the seat was last assigned.
    pub assigned_at: OffsetDateTime,
    /// When the seat was deactivated, `None` while active.
    pub deactivated_at: Option<OffsetDateTime>,
}

/// The seat usage of a user's active subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLimits {
    /// The subscription the limits are for.
    pub subscription_id: SubscriptionId,
    /// The user who pays for the subscription.
    pub owner_id: UserID,
    /// The name of the subscription's plan.
    pub plan_name: String,
    /// The number of seats the plan allows.
    pub max_seats: i64,
    /// The number of active seats.
    pub current_seats: i64,
    /// `max_seats - current_seats`.
    pub available_seats: i64,
    /// Whether another user can be invited.
    pub can_invite: bool,
}

impl SubscriptionLimits {
    fn new(
        subscription_id: SubscriptionId,
        owner_id: UserID,
        plan_name: String,
        max_seats: i64,
        current_seats: i64,
    ) -> Self {
        let available_seats = max_seats - current_seats;

        Self {
            subscription_id,
            owner_id,
            plan_name,
            max_seats,
            current_seats,
            available_seats,
            can_invite: available_seats > 0,
        }
    }
}

/// The result of trying to reserve a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatReservation {
    /// A seat was created or reactivated for the user.
    Assigned,
    /// The user already held an active seat, nothing changed.
    AlreadyActive,
    /// Every seat is taken, nothing changed.
    NoSeatsAvailable,
}

fn map_limits_row(row: &Row) -> Result<SubscriptionLimits, rusqlite::Error> {
    Ok(SubscriptionLimits::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

const LIMITS_QUERY: &str = "SELECT s.id, s.owner_id, p.name, p.max_seats,
        (SELECT COUNT(*) FROM subscription_seat seat
         WHERE seat.subscription_id = s.id AND seat.is_active = 1)
    FROM subscription s
    INNER JOIN subscription_plan p ON p.id = s.plan_id";

/// Get the seat usage of the user's active subscription.
///
/// A subscription the user pays for takes precedence over one they hold a seat
/// on. Returns `None` when the user has no active subscription, which is
/// different from an active subscription with no free seats.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails.
pub fn get_limits(
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<SubscriptionLimits>, Error> {
    let result = connection
        .prepare(&format!(
            "{LIMITS_QUERY}
            WHERE s.status = 'active' AND (
                s.owner_id = ?1 OR EXISTS (
                    SELECT 1 FROM subscription_seat seat
                    WHERE seat.subscription_id = s.id AND seat.user_id = ?1 AND seat.is_active = 1
                )
            )
            ORDER BY s.owner_id = ?1 DESC, s.id ASC
            LIMIT 1"
        ))?
        .query_row([user_id], map_limits_row);

    match result {
        Ok(limits) => Ok(Some(limits)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Get the seat usage of a subscription regardless of its status.
pub fn get_subscription_limits(
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<SubscriptionLimits, Error> {
    let limits = connection
        .prepare(&format!("{LIMITS_QUERY} WHERE s.id = ?1"))?
        .query_row([subscription_id], map_limits_row)?;

    Ok(limits)
}

/// Give `user_id` an active seat on a subscription.
///
/// An existing seat for the pair is reactivated in place, so calling this any
/// number of times leaves exactly one seat row. The plan's seat limit is not
/// checked here, use [reserve_seat] for that.
///
/// # Errors
/// Returns [Error::SqlError] if the seat could not be written.
pub fn assign_seat(
    subscription_id: SubscriptionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO subscription_seat (subscription_id, user_id, is_active, assigned_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(subscription_id, user_id) DO UPDATE SET
            assigned_at = CASE WHEN is_active = 1 THEN assigned_at ELSE excluded.assigned_at END,
            is_active = 1,
            deactivated_at = NULL",
        (subscription_id, user_id, OffsetDateTime::now_utc()),
    )?;

    Ok(())
}

/// Deactivate the user's seat on a subscription, keeping the row for history.
///
/// Returns `false` if the user had no active seat.
///
/// # Errors
/// Returns [Error::SqlError] if the seat could not be written.
pub fn deactivate_seat(
    subscription_id: SubscriptionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE subscription_seat SET is_active = 0, deactivated_at = ?1
         WHERE subscription_id = ?2 AND user_id = ?3 AND is_active = 1",
        (OffsetDateTime::now_utc(), subscription_id, user_id),
    )?;

    if rows_affected == 0 {
        tracing::warn!(
            "tried to deactivate seat for user {user_id} on subscription {subscription_id} but it is not active"
        );
    }

    Ok(rows_affected > 0)
}

/// Check for a free seat and assign it to the user in one write transaction.
///
/// SQLite allows one writer at a time, so two concurrent reservations cannot
/// both see the last free seat.
///
/// # Errors
/// Returns [Error::NotFound] if the subscription does not exist, or
/// [Error::SqlError] if a query fails.
pub fn reserve_seat(
    subscription_id: SubscriptionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SeatReservation, Error> {
    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let reservation = reserve_seat_in_transaction(subscription_id, user_id, &transaction)?;

    transaction.commit()?;

    Ok(reservation)
}

/// The body of [reserve_seat] for callers that already hold a write transaction.
pub(crate) fn reserve_seat_in_transaction(
    subscription_id: SubscriptionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SeatReservation, Error> {
    if has_active_seat(subscription_id, user_id, connection)? {
        return Ok(SeatReservation::AlreadyActive);
    }

    let limits = get_subscription_limits(subscription_id, connection)?;

    if !limits.can_invite {
        tracing::info!(
            "no seats available on subscription {subscription_id} for user {user_id} ({} of {} used)",
            limits.current_seats,
            limits.max_seats
        );
        return Ok(SeatReservation::NoSeatsAvailable);
    }

    assign_seat(subscription_id, user_id, connection)?;

    Ok(SeatReservation::Assigned)
}

fn has_active_seat(
    subscription_id: SubscriptionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let exists = connection
        .prepare(
            "SELECT EXISTS (
                SELECT 1 FROM subscription_seat
                WHERE subscription_id = ?1 AND user_id = ?2 AND is_active = 1
            )",
        )?
        .query_row((subscription_id, user_id), |row| row.get(0))?;

    Ok(exists)
}

/// Get every seat of a subscription, active or not, in assignment order.
pub fn get_seats(
    subscription_id: SubscriptionId,
    connection: &Connection,
) -> Result<Vec<Seat>, Error> {
    connection
        .prepare(
            "SELECT subscription_id, user_id, is_active, assigned_at, deactivated_at
             FROM subscription_seat WHERE subscription_id = ?1 ORDER BY id ASC",
        )?
        .query_map([subscription_id], |row| {
            Ok(Seat {
                subscription_id: row.get(0)?,
                user_id: row.get(1)?,
                is_active: row.get(2)?,
                assigned_at: row.get(3)?,
                deactivated_at: row.get(4)?,
            })
        })?
        .map(|maybe_seat| maybe_seat.map_err(|error| error.into()))
        .collect()
}
