//! User entity - Represents a registered account.
//!
//! Usernames and emails are unique across the system. The `password_hash`
//! column never leaves the crate through read paths: queries that hand user
//! data to callers project into `UserProfile` instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique system-wide
    #[sea_orm(unique)]
    pub username: String,
    /// Contact email, unique system-wide
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 hash of the user's password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Role flag gating the administrative facade
    pub is_admin: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// `User` rows are referenced by invitations, pairs and transactions, but
/// those links are declared on the referencing side.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
