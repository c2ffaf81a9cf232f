//! Invitations to join a shared subscription.
//!
//! An invitation moves from `pending` to exactly one of `accepted`, `declined`
//! or `expired`, and never changes after that.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    Error, UserID,
    database_id::DatabaseId,
    subscription::{
        core::get_owned_active_subscription,
        seats::{SeatReservation, get_limits, reserve_seat_in_transaction},
    },
    user::{get_user_by_id, normalise_email},
};

/// Where an invitation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Waiting for the invitee.
    Pending,
    /// The invitee joined the subscription.
    Accepted,
    /// The invitee turned the invitation down.
    Declined,
    /// The invitation was not used in time.
    Expired,
}

impl InvitationStatus {
    fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for InvitationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for InvitationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(FromSqlError::Other(
                format!("unknown invitation status \"{other}\"").into(),
            )),
        }
    }
}

/// An invitation for someone to take a seat on the inviter's subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// The ID of the invitation.
    pub id: DatabaseId,
    /// The subscription owner who sent the invitation.
    pub inviter_id: UserID,
    /// The invitee's email address, lowercase.
    pub email: String,
    /// The secret the invitee presents to accept or decline.
    pub token: String,
    /// Where the invitation is in its lifecycle.
    pub status: InvitationStatus,
    /// When the invitation was sent.
    pub created_at: OffsetDateTime,
    /// After this time the invitation can no longer be accepted.
    pub expires_at: OffsetDateTime,
    /// When the invitee accepted or declined.
    pub responded_at: Option<OffsetDateTime>,
}

/// The result of trying to send an invitation.
#[derive(Debug, Clone, PartialEq)]
pub enum NewInvitation {
    /// The invitation was stored.
    Created(Invitation),
    /// The inviter does not pay for an active subscription.
    NoActiveSubscription,
    /// Every seat on the inviter's subscription is taken.
    NoSeatsAvailable,
}

/// The result of responding to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationOutcome {
    /// The user now holds a seat on the inviter's subscription.
    Accepted,
    /// The invitation was turned down.
    Declined,
    /// There is no invitation with the token for this user.
    NotFound,
    /// The invitation was already accepted, declined or expired.
    NotPending,
    /// The invitation ran out of time and is now expired.
    Expired,
    /// The inviter no longer has an active subscription.
    NoActiveSubscription,
    /// Every seat on the inviter's subscription is taken.
    NoSeatsAvailable,
}

impl InvitationOutcome {
    /// Whether the user joined the subscription.
    pub fn is_accepted(&self) -> bool {
        matches!(self, InvitationOutcome::Accepted)
    }
}

const INVITATION_COLUMNS: &str =
    "id, inviter_id, email, token, status, created_at, expires_at, responded_at";

fn map_invitation_row(row: &Row) -> Result<Invitation, rusqlite::Error> {
    Ok(Invitation {
        id: row.get(0)?,
        inviter_id: row.get(1)?,
        email: row.get(2)?,
        token: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        expires_at: row.get(6)?,
        responded_at: row.get(7)?,
    })
}

/// Invite `email` to the subscription that `inviter_id` pays for.
///
/// The seat check here is advisory, seats can be taken between sending and
/// accepting. [accept_invitation] checks again.
///
/// # Errors
/// Returns [Error::InvalidEmail] for a malformed address,
/// [Error::NotSubscriptionOwner] if the inviter only holds a seat on someone
/// else's subscription, or [Error::SqlError] if a query fails.
pub fn create_invitation(
    inviter_id: UserID,
    email: &str,
    lifetime: Duration,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<NewInvitation, Error> {
    let email = normalise_email(email)?;

    let Some(limits) = get_limits(inviter_id, connection)? else {
        return Ok(NewInvitation::NoActiveSubscription);
    };

    if limits.owner_id != inviter_id {
        return Err(Error::NotSubscriptionOwner);
    }

    if !limits.can_invite {
        return Ok(NewInvitation::NoSeatsAvailable);
    }

    let invitation = connection
        .prepare(&format!(
            "INSERT INTO invitation (inviter_id, email, token, status, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {INVITATION_COLUMNS}"
        ))?
        .query_row(
            (
                inviter_id,
                email,
                Uuid::new_v4().to_string(),
                InvitationStatus::Pending,
                now,
                now + lifetime,
            ),
            map_invitation_row,
        )?;

    tracing::info!(
        "user {inviter_id} invited a new member to subscription {}",
        limits.subscription_id
    );

    Ok(NewInvitation::Created(invitation))
}

/// Get an invitation by its token.
pub fn get_invitation_by_token(token: &str, connection: &Connection) -> Result<Invitation, Error> {
    let invitation = connection
        .prepare(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitation WHERE token = ?1"
        ))?
        .query_row([token], map_invitation_row)?;

    Ok(invitation)
}

/// Find the pending invitation addressed to `user_id`.
///
/// Expired invitations are marked as such.
fn find_pending_invitation(
    token: &str,
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Result<Invitation, InvitationOutcome>, Error> {
    let invitation = match get_invitation_by_token(token, connection) {
        Ok(invitation) => invitation,
        Err(Error::NotFound) => return Ok(Err(InvitationOutcome::NotFound)),
        Err(error) => return Err(error),
    };

    let user = get_user_by_id(user_id, connection)?;
    if user.email != invitation.email {
        tracing::warn!(
            "user {user_id} tried to use invitation {} addressed to someone else",
            invitation.id
        );
        return Ok(Err(InvitationOutcome::NotFound));
    }

    if invitation.status != InvitationStatus::Pending {
        return Ok(Err(InvitationOutcome::NotPending));
    }

    if invitation.expires_at <= now {
        set_invitation_status(invitation.id, InvitationStatus::Expired, None, connection)?;
        return Ok(Err(InvitationOutcome::Expired));
    }

    Ok(Ok(invitation))
}

fn set_invitation_status(
    invitation_id: DatabaseId,
    status: InvitationStatus,
    responded_at: Option<OffsetDateTime>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE invitation SET status = ?1, responded_at = ?2 WHERE id = ?3",
        (status, responded_at, invitation_id),
    )?;

    Ok(())
}

/// Accept an invitation on behalf of `user_id`.
///
/// The invitation is checked, a seat is reserved on the inviter's active
/// subscription and the invitation is marked accepted, all in one write
/// transaction. When no seat is free the invitation stays pending.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails. Business outcomes such as a full
/// subscription are reported through [InvitationOutcome].
pub fn accept_invitation(
    token: &str,
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<InvitationOutcome, Error> {
    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let outcome = match find_pending_invitation(token, user_id, now, &transaction)? {
        Err(outcome) => outcome,
        Ok(invitation) => {
            match get_owned_active_subscription(invitation.inviter_id, &transaction)? {
                None => InvitationOutcome::NoActiveSubscription,
                Some(subscription) => {
                    match reserve_seat_in_transaction(subscription.id, user_id, &transaction)? {
                        SeatReservation::NoSeatsAvailable => InvitationOutcome::NoSeatsAvailable,
                        SeatReservation::Assigned | SeatReservation::AlreadyActive => {
                            set_invitation_status(
                                invitation.id,
                                InvitationStatus::Accepted,
                                Some(now),
                                &transaction,
                            )?;
                            InvitationOutcome::Accepted
                        }
                    }
                }
            }
        }
    };

    transaction.commit()?;

    if outcome.is_accepted() {
        tracing::info!("user {user_id} accepted an invitation");
    } else {
        tracing::info!("user {user_id} could not accept an invitation: {outcome:?}");
    }

    Ok(outcome)
}

/// Decline an invitation on behalf of `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails.
pub fn decline_invitation(
    token: &str,
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<InvitationOutcome, Error> {
    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let outcome = match find_pending_invitation(token, user_id, now, &transaction)? {
        Err(outcome) => outcome,
        Ok(invitation) => {
            set_invitation_status(
                invitation.id,
                InvitationStatus::Declined,
                Some(now),
                &transaction,
            )?;
            InvitationOutcome::Declined
        }
    };

    transaction.commit()?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, UserID,
        subscription::{
            Invitation, InvitationOutcome, InvitationStatus, NewInvitation, Subscription,
            SubscriptionStatus, accept_invitation, assign_seat, create_invitation, create_plan,
            create_subscription, decline_invitation, get_invitation_by_token, get_limits,
            set_subscription_status,
        },
        test_utils::{TestUser, create_test_user},
        user::create_user,
    };

    const INVITEE_EMAIL: &str = "invitee@example.com";

    fn subscribe(max_seats: i64) -> (TestUser, Subscription) {
        let test_user = create_test_user();
        let plan = create_plan("Family", max_seats, dec!(10), &test_user.connection).unwrap();
        let subscription = create_subscription(
            test_user.user.id,
            plan.id,
            SubscriptionStatus::Active,
            &test_user.connection,
        )
        .unwrap();

        (test_user, subscription)
    }

    fn invite(test_user: &TestUser, email: &str) -> Invitation {
        match create_invitation(
            test_user.user.id,
            email,
            Duration::days(7),
            OffsetDateTime::now_utc(),
            &test_user.connection,
        )
        .unwrap()
        {
            NewInvitation::Created(invitation) => invitation,
            other => panic!("expected an invitation, got {other:?}"),
        }
    }

    fn invitee(test_user: &TestUser) -> UserID {
        create_user(INVITEE_EMAIL, &test_user.connection).unwrap().id
    }

    #[test]
    fn create_invitation_normalises_email_and_sets_expiry() {
        let (test_user, _) = subscribe(2);
        let now = OffsetDateTime::now_utc();

        let NewInvitation::Created(invitation) = create_invitation(
            test_user.user.id,
            " Invitee@Example.com ",
            Duration::days(7),
            now,
            &test_user.connection,
        )
        .unwrap() else {
            panic!("expected an invitation");
        };

        assert_eq!(invitation.email, INVITEE_EMAIL);
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert!((invitation.expires_at - (now + Duration::days(7))).abs() < Duration::seconds(1));
        assert_eq!(invitation.token.len(), 36);
    }

    #[test]
    fn create_invitation_needs_subscription_and_free_seat() {
        let test_user = create_test_user();
        assert_eq!(
            create_invitation(
                test_user.user.id,
                INVITEE_EMAIL,
                Duration::days(7),
                OffsetDateTime::now_utc(),
                &test_user.connection
            ),
            Ok(NewInvitation::NoActiveSubscription)
        );

        let (test_user, _) = subscribe(1);
        assert_eq!(
            create_invitation(
                test_user.user.id,
                INVITEE_EMAIL,
                Duration::days(7),
                OffsetDateTime::now_utc(),
                &test_user.connection
            ),
            Ok(NewInvitation::NoSeatsAvailable)
        );
    }

    #[test]
    fn members_cannot_invite() {
        let (test_user, subscription) = subscribe(3);
        let member = invitee(&test_user);
        assign_seat(subscription.id, member, &test_user.connection).unwrap();

        let result = create_invitation(
            member,
            "friend@example.com",
            Duration::days(7),
            OffsetDateTime::now_utc(),
            &test_user.connection,
        );

        assert_eq!(result, Err(Error::NotSubscriptionOwner));
    }

    #[test]
    fn accepting_assigns_seat_and_is_final() {
        let (test_user, subscription) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        let user_id = invitee(&test_user);
        let now = OffsetDateTime::now_utc();

        let outcome = accept_invitation(&invitation.token, user_id, now, &test_user.connection);

        assert_eq!(outcome, Ok(InvitationOutcome::Accepted));
        assert!(outcome.unwrap().is_accepted());
        let limits = get_limits(user_id, &test_user.connection).unwrap().unwrap();
        assert_eq!(limits.subscription_id, subscription.id);
        assert_eq!(limits.available_seats, 0);
        let stored = get_invitation_by_token(&invitation.token, &test_user.connection).unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
        assert!(stored.responded_at.is_some());

        assert_eq!(
            accept_invitation(&invitation.token, user_id, now, &test_user.connection),
            Ok(InvitationOutcome::NotPending)
        );
    }

    #[test]
    fn full_subscription_leaves_invitation_pending() {
        let (test_user, subscription) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        let other = create_user("other@example.com", &test_user.connection)
            .unwrap()
            .id;
        assign_seat(subscription.id, other, &test_user.connection).unwrap();
        let user_id = invitee(&test_user);

        let outcome = accept_invitation(
            &invitation.token,
            user_id,
            OffsetDateTime::now_utc(),
            &test_user.connection,
        );

        assert_eq!(outcome, Ok(InvitationOutcome::NoSeatsAvailable));
        let stored = get_invitation_by_token(&invitation.token, &test_user.connection).unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);
    }

    #[test]
    fn expired_invitation_is_marked_expired() {
        let (test_user, _) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        let user_id = invitee(&test_user);
        let later = invitation.expires_at + Duration::seconds(1);

        let outcome = accept_invitation(&invitation.token, user_id, later, &test_user.connection);

        assert_eq!(outcome, Ok(InvitationOutcome::Expired));
        let stored = get_invitation_by_token(&invitation.token, &test_user.connection).unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
    }

    #[test]
    fn cancelled_subscription_blocks_acceptance() {
        let (test_user, subscription) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        set_subscription_status(
            subscription.id,
            SubscriptionStatus::Canceled,
            &test_user.connection,
        )
        .unwrap();
        let user_id = invitee(&test_user);

        let outcome = accept_invitation(
            &invitation.token,
            user_id,
            OffsetDateTime::now_utc(),
            &test_user.connection,
        );

        assert_eq!(outcome, Ok(InvitationOutcome::NoActiveSubscription));
    }

    #[test]
    fn unknown_token_and_wrong_user_are_not_found() {
        let (test_user, _) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        let stranger = create_user("stranger@example.com", &test_user.connection)
            .unwrap()
            .id;
        let now = OffsetDateTime::now_utc();

        assert_eq!(
            accept_invitation("not-a-token", stranger, now, &test_user.connection),
            Ok(InvitationOutcome::NotFound)
        );
        assert_eq!(
            accept_invitation(&invitation.token, stranger, now, &test_user.connection),
            Ok(InvitationOutcome::NotFound)
        );
    }

    #[test]
    fn decline_moves_pending_to_declined() {
        let (test_user, _) = subscribe(2);
        let invitation = invite(&test_user, INVITEE_EMAIL);
        let user_id = invitee(&test_user);
        let now = OffsetDateTime::now_utc();

        assert_eq!(
            decline_invitation(&invitation.token, user_id, now, &test_user.connection),
            Ok(InvitationOutcome::Declined)
        );
        assert_eq!(
            accept_invitation(&invitation.token, user_id, now, &test_user.connection),
            Ok(InvitationOutcome::NotPending)
        );
    }
}
