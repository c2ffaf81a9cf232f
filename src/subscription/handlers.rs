//! Endpoints for subscription status, invitations and removing members.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    subscription::{
        InvitationOutcome, NewInvitation, Seat, SubscriptionState, accept_invitation,
        create_invitation, deactivate_seat, decline_invitation, get_limits,
        get_owned_active_subscription, get_seats,
    },
};

/// The request body for inviting someone.
#[derive(Debug, Deserialize)]
pub struct InvitationForm {
    /// The invitee's email address.
    pub email: String,
}

/// The request body for responding to an invitation.
#[derive(Debug, Deserialize)]
pub struct InvitationResponseForm {
    /// The token from the invitation.
    pub token: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for InvitationOutcome {
    fn into_response(self) -> Response {
        match self {
            InvitationOutcome::Accepted => Json(json!({ "status": "accepted" })).into_response(),
            InvitationOutcome::Declined => Json(json!({ "status": "declined" })).into_response(),
            InvitationOutcome::NotFound => {
                error_response(StatusCode::NOT_FOUND, "the invitation could not be found")
            }
            InvitationOutcome::NotPending => error_response(
                StatusCode::CONFLICT,
                "the invitation has already been responded to",
            ),
            InvitationOutcome::Expired => {
                error_response(StatusCode::CONFLICT, "the invitation has expired")
            }
            InvitationOutcome::NoActiveSubscription => error_response(
                StatusCode::FORBIDDEN,
                "the subscription for this invitation is no longer active",
            ),
            InvitationOutcome::NoSeatsAvailable => error_response(
                StatusCode::FORBIDDEN,
                "there are no seats available on the subscription",
            ),
        }
    }
}

/// A route handler that returns the seat usage of the user's subscription.
pub async fn get_subscription_status_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let response = match get_limits(user_id, &connection)? {
        Some(limits) => Json(limits).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "you do not have an active subscription",
        ),
    };

    Ok(response)
}

/// A route handler for inviting someone to the user's subscription.
pub async fn create_invitation_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<InvitationForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let response = match create_invitation(
        user_id,
        &form.email,
        state.invitation_lifetime,
        OffsetDateTime::now_utc(),
        &connection,
    )? {
        NewInvitation::Created(invitation) => {
            (StatusCode::CREATED, Json(invitation)).into_response()
        }
        NewInvitation::NoActiveSubscription => error_response(
            StatusCode::FORBIDDEN,
            "you need an active subscription to invite others",
        ),
        NewInvitation::NoSeatsAvailable => error_response(
            StatusCode::FORBIDDEN,
            "there are no seats available on your subscription",
        ),
    };

    Ok(response)
}

/// A route handler for accepting an invitation.
pub async fn accept_invitation_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<InvitationResponseForm>,
) -> Result<InvitationOutcome, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    accept_invitation(&form.token, user_id, OffsetDateTime::now_utc(), &connection)
}

/// A route handler for declining an invitation.
pub async fn decline_invitation_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<InvitationResponseForm>,
) -> Result<InvitationOutcome, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    decline_invitation(&form.token, user_id, OffsetDateTime::now_utc(), &connection)
}

/// A route handler that lists the seats of the subscription the user pays for.
pub async fn get_seats_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Seat>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let subscription =
        get_owned_active_subscription(user_id, &connection)?.ok_or(Error::NotSubscriptionOwner)?;

    get_seats(subscription.id, &connection).map(Json)
}

/// A route handler for the owner to take a member's seat away.
pub async fn remove_member_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
    Path(member_id): Path<i64>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let subscription =
        get_owned_active_subscription(user_id, &connection)?.ok_or(Error::NotSubscriptionOwner)?;

    let member_id = UserID::new(member_id);
    if member_id == subscription.owner_id {
        return Err(Error::RemoveSubscriptionOwner);
    }

    if deactivate_seat(subscription.id, member_id, &connection)? {
        tracing::info!(
            "user {user_id} removed user {member_id} from subscription {}",
            subscription.id
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound)
    }
}
