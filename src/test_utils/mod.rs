#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{get_test_server, log_in_as, parse_json_body};

use rusqlite::Connection;
use rust_decimal_macros::dec;
use time::macros::date;

use crate::{
    User,
    account::{Account, NewAccount, create_account},
    db::initialize,
    user::create_user,
};

/// A fresh in-memory database with one user who owns one NZD account.
pub(crate) struct TestUser {
    pub connection: Connection,
    pub user: User,
    pub account: Account,
}

#[track_caller]
pub(crate) fn create_test_user() -> TestUser {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");
    let user = create_user("test@example.com", &connection).expect("could not create user");
    let account = create_account(
        user.id,
        NewAccount {
            name: "Everyday".to_owned(),
            balance: dec!(0),
            balance_date: date!(2025 - 01 - 01),
            currency: "NZD".to_owned(),
        },
        &connection,
    )
    .expect("could not create account");

    TestUser {
        connection,
        user,
        account,
    }
}
