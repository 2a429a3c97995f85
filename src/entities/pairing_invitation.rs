//! Pairing invitation entity - Represents a request to form a couple.
//!
//! An invitation is created `Pending` and reaches exactly one terminal
//! status: `Accepted` (receiver accepted, a couple pair was created),
//! `Rejected` (receiver declined) or `Cancelled` (sender withdrew it).
//! At most one `Pending` row may exist per unordered pair of users.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pairing invitation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pairing_invitations")]
pub struct Model {
    /// Unique identifier for the invitation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who sent the invitation
    pub sender_id: i64,
    /// User invited to pair
    pub receiver_id: i64,
    /// Name the resulting couple will carry
    pub couple_name: String,
    /// Current lifecycle status
    pub status: InvitationStatus,
    /// When the invitation was sent
    pub created_at: DateTimeUtc,
}

/// Lifecycle status of a pairing invitation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum InvitationStatus {
    /// Awaiting a decision from the receiver
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Receiver accepted; the couple pair exists
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    /// Receiver declined
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    /// Sender withdrew the invitation
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

/// Both endpoints of an invitation reference the `users` table.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Sending user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
    /// Receiving user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceiverId",
        to = "super::user::Column::Id"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}
