//! Identity business logic - registration, login and credential management.
//!
//! All read paths hand out [`UserProfile`] projections, never the raw user
//! model, so the password hash cannot leak to callers. Input validation
//! happens here before anything touches the database; unique-constraint
//! violations on username/email are mapped to a conflict error instead of a
//! generic storage failure.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

/// Public projection of a user row; carries everything the UI shows and
/// nothing it must not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Unique identifier
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Display name
    pub full_name: String,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        UserProfile {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
        }
    }
}

/// Registers a new account after validating every field.
///
/// The username must be 3-20 characters of letters, digits or underscore;
/// the email structurally valid; the password at least 8 characters with an
/// uppercase letter and a digit; the full name 2-50 characters. A username
/// or email already in use fails with a conflict error.
pub async fn register_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<UserProfile> {
    let username = username.trim();
    let email = email.trim();
    let full_name = full_name.trim();

    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)?;
    validate_full_name(full_name)?;

    let password_hash = hash_password(password)?;

    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        full_name: Set(full_name.to_string()),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match account.insert(db).await {
        Ok(created) => Ok(created.into()),
        Err(err) => Err(map_unique_violation(err)),
    }
}

/// Verifies credentials and returns the account's public profile.
///
/// User row and hash come back in a single query; the hash is dropped
/// before the profile is returned.
pub async fn login_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<UserProfile> {
    let account = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: username.to_string(),
        })?;

    if verify_password(password, &account.password_hash)? {
        Ok(account.into())
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Looks up a user's public profile by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<UserProfile>> {
    Ok(User::find_by_id(user_id).one(db).await?.map(Into::into))
}

/// Replaces a user's password with a freshly hashed one.
///
/// The new password goes through the same strength validation as
/// registration. Used by the administrative facade for resets.
pub async fn reset_password(
    db: &DatabaseConnection,
    user_id: i64,
    new_password: &str,
) -> Result<()> {
    validate_password(new_password)?;

    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: user_id.to_string(),
        })?;

    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.update(db).await?;
    Ok(())
}

/// Hashes a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn map_unique_violation(err: sea_orm::DbErr) -> Error {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        Error::CredentialsTaken
    } else {
        Error::Database(err)
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 || username.len() > 20 {
        return Err(Error::validation("Username must be 3-20 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::validation(
            "Username can only contain letters, numbers, and underscore",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let structurally_valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.len() >= 3
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    }) && !email.chars().any(char::is_whitespace);

    if structurally_valid {
        Ok(())
    } else {
        Err(Error::validation("Invalid email format"))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(Error::validation("Password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::validation("Password must contain uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::validation("Password must contain number"));
    }
    Ok(())
}

fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.len() < 2 || full_name.len() > 50 {
        return Err(Error::validation("Full name must be 2-50 characters"));
    }
    Ok(())
}
