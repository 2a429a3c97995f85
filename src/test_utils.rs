//! Shared test utilities.
//!
//! Common helpers for setting up in-memory test databases and creating
//! accounts, pairs and ledger rows with sensible defaults.

use crate::{
    core::{identity, pairing},
    entities::{User, couple_pair, user},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Password every test account registers with.
pub const TEST_PASSWORD: &str = "Passw0rd1";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a test account.
///
/// # Defaults
/// * email: `<username>@example.com`
/// * password: [`TEST_PASSWORD`]
/// * full name: `"Test <username>"`
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<identity::UserProfile> {
    identity::register_user(
        db,
        username,
        &format!("{username}@example.com"),
        TEST_PASSWORD,
        &format!("Test {username}"),
    )
    .await
}

/// Registers a test account and grants it the admin role.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
) -> Result<identity::UserProfile> {
    let profile = create_test_user(db, username).await?;
    make_admin(db, profile.id).await?;
    Ok(profile)
}

/// Flips the admin role flag on an existing account.
pub async fn make_admin(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::UserNotFound {
            username: user_id.to_string(),
        })?;
    let mut active: user::ActiveModel = account.into();
    active.is_admin = Set(true);
    active.update(db).await?;
    Ok(())
}

/// Sets up a database with "alice" and "bob" paired via the full
/// invitation workflow. Returns (db, alice, bob, pair) for the common
/// shared-ledger test scenarios.
pub async fn setup_paired_couple() -> Result<(
    DatabaseConnection,
    identity::UserProfile,
    identity::UserProfile,
    couple_pair::Model,
)> {
    let db = setup_test_db().await?;
    let alice = create_test_user(&db, "alice").await?;
    let bob = create_test_user(&db, "bob").await?;

    let invitation = pairing::send_invitation(&db, alice.id, "bob", None).await?;
    let pair = pairing::accept_invitation(&db, invitation.id, bob.id).await?;

    Ok((db, alice, bob, pair))
}
