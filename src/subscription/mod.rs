//! Shared subscriptions: plans, seats and invitations.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Duration;

use crate::AppState;

mod core;
mod handlers;
mod invitations;
mod seats;

pub use core::{
    PlanId, Subscription, SubscriptionId, SubscriptionPlan, SubscriptionStatus, create_plan,
    create_subscription, create_subscription_tables, get_owned_active_subscription, get_plan,
    get_subscription, set_subscription_status,
};
pub use handlers::{
    accept_invitation_endpoint, create_invitation_endpoint, decline_invitation_endpoint,
    get_seats_endpoint, get_subscription_status_endpoint, remove_member_endpoint,
};
pub use invitations::{
    Invitation, InvitationOutcome, InvitationStatus, NewInvitation, accept_invitation,
    create_invitation, decline_invitation, get_invitation_by_token,
};
pub use seats::{
    Seat, SeatReservation, SubscriptionLimits, assign_seat, deactivate_seat, get_limits,
    get_seats, get_subscription_limits, reserve_seat,
};

/// The state needed by the subscription endpoints.
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    /// The database connection for managing seats and invitations.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How long a new invitation stays valid for.
    pub invitation_lifetime: Duration,
}

impl FromRef<AppState> for SubscriptionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            invitation_lifetime: state.invitation_lifetime,
        }
    }
}
