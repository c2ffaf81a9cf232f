use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use kitty_rs::{
    CategoryName, NewAccount, NewCategory, SubscriptionStatus, create_account, create_category,
    create_plan, create_subscription, create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of kitty_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");
    let user = create_user("test@example.com", &conn)?;

    println!("Creating \"Family\" plan and subscription...");
    let plan = create_plan("Family", 5, Decimal::new(1499, 2), &conn)?;
    create_subscription(user.id, plan.id, SubscriptionStatus::Active, &conn)?;

    println!("Creating account and categories...");
    create_account(
        user.id,
        NewAccount {
            name: "Everyday".to_owned(),
            balance: Decimal::ZERO,
            balance_date: OffsetDateTime::now_utc().date(),
            currency: "NZD".to_owned(),
        },
        &conn,
    )?;

    create_category(user.id, NewCategory::income(CategoryName::new("Salary")?), &conn)?;
    for name in ["Groceries", "Rent", "Transport", "Eating Out"] {
        create_category(user.id, NewCategory::expense(CategoryName::new(name)?), &conn)?;
    }

    println!("Success! Log in as user {} (test@example.com).", user.id);

    Ok(())
}
