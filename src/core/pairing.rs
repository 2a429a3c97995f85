//! Couple pairing business logic - invitations, linkage and unpairing.
//!
//! Pairing is a two-step workflow: one user sends an invitation, the other
//! accepts it, and only then does the couple pair (the shared-ledger unit)
//! exist. Acceptance creates the pair and resolves the invitation in a
//! single database transaction; unpairing deletes the pair together with
//! every financial row scoped to it, also atomically, so no orphaned ledger
//! data can survive a partial failure.
//!
//! Invitation outcomes are uniformly represented as status values: the
//! receiver's decision marks `Accepted`/`Rejected`, a sender withdrawal
//! marks `Cancelled`. Rows are never deleted outside the user-delete path.

use crate::{
    core::identity::UserProfile,
    entities::{
        Budget, Category, CouplePair, InvitationStatus, PairingInvitation, RecurringTransaction,
        Transaction, User, budget, category, couple_pair, pairing_invitation,
        recurring_transaction, transaction, user,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Whether a pending invitation was sent by or addressed to the querying
/// user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationDirection {
    /// The querying user sent it
    Sent,
    /// The querying user received it
    Received,
}

/// A pending invitation tagged with its direction relative to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvitation {
    /// The invitation row
    pub invitation: pairing_invitation::Model,
    /// Direction relative to the querying user
    pub direction: InvitationDirection,
}

/// Sends a pairing invitation to another user, addressed by username.
///
/// Fails when the receiver does not exist, when sender and receiver are the
/// same account, when the two are already paired, or when a pending
/// invitation already links them in either direction. When no couple name
/// is given the pair-to-be is named `"<sender> & <receiver>"`.
pub async fn send_invitation(
    db: &DatabaseConnection,
    sender_id: i64,
    receiver_username: &str,
    couple_name: Option<String>,
) -> Result<pairing_invitation::Model> {
    let receiver = User::find()
        .filter(user::Column::Username.eq(receiver_username))
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: receiver_username.to_string(),
        })?;
    let sender = User::find_by_id(sender_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: sender_id.to_string(),
        })?;

    if sender.id == receiver.id {
        return Err(Error::SelfPairing);
    }
    if pair_between(db, sender.id, receiver.id).await?.is_some() {
        return Err(Error::AlreadyPaired);
    }
    if pending_between(db, sender.id, receiver.id).await?.is_some() {
        return Err(Error::DuplicateInvitation);
    }

    let couple_name = couple_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("{} & {}", sender.username, receiver.username));

    let invitation = pairing_invitation::ActiveModel {
        sender_id: Set(sender.id),
        receiver_id: Set(receiver.id),
        couple_name: Set(couple_name),
        status: Set(InvitationStatus::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    invitation.insert(db).await.map_err(Into::into)
}

/// Lists a user's pending invitations, sent and received, newest first.
pub async fn list_pending_invitations(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<PendingInvitation>> {
    let rows = PairingInvitation::find()
        .filter(pairing_invitation::Column::Status.eq(InvitationStatus::Pending))
        .filter(
            Condition::any()
                .add(pairing_invitation::Column::SenderId.eq(user_id))
                .add(pairing_invitation::Column::ReceiverId.eq(user_id)),
        )
        .order_by_desc(pairing_invitation::Column::CreatedAt)
        .order_by_desc(pairing_invitation::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|invitation| PendingInvitation {
            direction: if invitation.sender_id == user_id {
                InvitationDirection::Sent
            } else {
                InvitationDirection::Received
            },
            invitation,
        })
        .collect())
}

/// Accepts a pending invitation, forming the couple pair.
///
/// Only the receiver may accept. The pair insert and the status flip to
/// `Accepted` commit together; an invitation that is no longer pending
/// (including one accepted before) fails as not-found. If either party has
/// meanwhile paired with someone, acceptance fails rather than create a
/// second pair for them.
pub async fn accept_invitation(
    db: &DatabaseConnection,
    invitation_id: i64,
    acting_user_id: i64,
) -> Result<couple_pair::Model> {
    let txn = db.begin().await?;

    let invitation = PairingInvitation::find_by_id(invitation_id)
        .one(&txn)
        .await?
        .filter(|invitation| invitation.status == InvitationStatus::Pending)
        .ok_or(Error::InvitationNotFound { id: invitation_id })?;

    if invitation.receiver_id != acting_user_id {
        return Err(Error::unauthorized(
            "Only the invited user can accept this invitation",
        ));
    }
    if find_pair_for_user(&txn, invitation.sender_id).await?.is_some()
        || find_pair_for_user(&txn, invitation.receiver_id)
            .await?
            .is_some()
    {
        return Err(Error::AlreadyPaired);
    }

    let pair = couple_pair::ActiveModel {
        user1_id: Set(invitation.sender_id),
        user2_id: Set(invitation.receiver_id),
        couple_name: Set(invitation.couple_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut resolved: pairing_invitation::ActiveModel = invitation.into();
    resolved.status = Set(InvitationStatus::Accepted);
    resolved.update(&txn).await?;

    txn.commit().await?;
    Ok(pair)
}

/// Rejects a pending invitation; only the receiver may do so.
pub async fn reject_invitation(
    db: &DatabaseConnection,
    invitation_id: i64,
    acting_user_id: i64,
) -> Result<pairing_invitation::Model> {
    close_invitation(db, invitation_id, acting_user_id, InvitationStatus::Rejected).await
}

/// Cancels a pending invitation; only the sender may do so.
pub async fn cancel_invitation(
    db: &DatabaseConnection,
    invitation_id: i64,
    acting_user_id: i64,
) -> Result<pairing_invitation::Model> {
    close_invitation(db, invitation_id, acting_user_id, InvitationStatus::Cancelled).await
}

/// Returns the id of the couple pair containing the user, if any.
pub async fn get_couple_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<i64>> {
    Ok(find_pair_for_user(db, user_id).await?.map(|pair| pair.id))
}

/// Returns the public profile of the other member of a couple.
///
/// `None` when the pair does not exist or the user is not a member of it.
pub async fn get_partner(
    db: &DatabaseConnection,
    couple_id: i64,
    user_id: i64,
) -> Result<Option<UserProfile>> {
    let Some(pair) = CouplePair::find_by_id(couple_id).one(db).await? else {
        return Ok(None);
    };
    let partner_id = if pair.user1_id == user_id {
        pair.user2_id
    } else if pair.user2_id == user_id {
        pair.user1_id
    } else {
        return Ok(None);
    };
    Ok(User::find_by_id(partner_id).one(db).await?.map(Into::into))
}

/// Dissolves a couple, deleting the pair and all of its financial data.
///
/// Transactions, budgets, categories and recurring transactions scoped to
/// the couple go with it, in one database transaction.
pub async fn unpair(db: &DatabaseConnection, couple_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    CouplePair::find_by_id(couple_id)
        .one(&txn)
        .await?
        .ok_or(Error::CoupleNotFound { id: couple_id })?;
    delete_couple_cascade(&txn, couple_id).await?;

    txn.commit().await?;
    Ok(())
}

/// Deletes every financial row scoped to a couple, then the pair itself.
///
/// Children go first so the foreign keys stay satisfied throughout. Callers
/// supply the transaction scope.
pub(crate) async fn delete_couple_cascade<C>(conn: &C, couple_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Transaction::delete_many()
        .filter(transaction::Column::CoupleId.eq(couple_id))
        .exec(conn)
        .await?;
    Budget::delete_many()
        .filter(budget::Column::CoupleId.eq(couple_id))
        .exec(conn)
        .await?;
    Category::delete_many()
        .filter(category::Column::CoupleId.eq(couple_id))
        .exec(conn)
        .await?;
    RecurringTransaction::delete_many()
        .filter(recurring_transaction::Column::CoupleId.eq(couple_id))
        .exec(conn)
        .await?;
    CouplePair::delete_by_id(couple_id).exec(conn).await?;
    Ok(())
}

/// The couple pair a user belongs to, if any; membership is symmetric.
pub(crate) async fn find_pair_for_user<C>(
    conn: &C,
    user_id: i64,
) -> Result<Option<couple_pair::Model>>
where
    C: ConnectionTrait,
{
    CouplePair::find()
        .filter(
            Condition::any()
                .add(couple_pair::Column::User1Id.eq(user_id))
                .add(couple_pair::Column::User2Id.eq(user_id)),
        )
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn pair_between(
    db: &DatabaseConnection,
    a: i64,
    b: i64,
) -> Result<Option<couple_pair::Model>> {
    CouplePair::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(couple_pair::Column::User1Id.eq(a))
                        .add(couple_pair::Column::User2Id.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(couple_pair::Column::User1Id.eq(b))
                        .add(couple_pair::Column::User2Id.eq(a)),
                ),
        )
        .one(db)
        .await
        .map_err(Into::into)
}

async fn pending_between(
    db: &DatabaseConnection,
    a: i64,
    b: i64,
) -> Result<Option<pairing_invitation::Model>> {
    PairingInvitation::find()
        .filter(pairing_invitation::Column::Status.eq(InvitationStatus::Pending))
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(pairing_invitation::Column::SenderId.eq(a))
                        .add(pairing_invitation::Column::ReceiverId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(pairing_invitation::Column::SenderId.eq(b))
                        .add(pairing_invitation::Column::ReceiverId.eq(a)),
                ),
        )
        .one(db)
        .await
        .map_err(Into::into)
}

async fn close_invitation(
    db: &DatabaseConnection,
    invitation_id: i64,
    acting_user_id: i64,
    outcome: InvitationStatus,
) -> Result<pairing_invitation::Model> {
    let invitation = PairingInvitation::find_by_id(invitation_id)
        .one(db)
        .await?
        .filter(|invitation| invitation.status == InvitationStatus::Pending)
        .ok_or(Error::InvitationNotFound { id: invitation_id })?;

    let authorized = match outcome {
        InvitationStatus::Rejected => invitation.receiver_id == acting_user_id,
        InvitationStatus::Cancelled => invitation.sender_id == acting_user_id,
        InvitationStatus::Pending | InvitationStatus::Accepted => false,
    };
    if !authorized {
        let message = match outcome {
            InvitationStatus::Rejected => "Only the invited user can reject this invitation",
            _ => "Only the sender can cancel this invitation",
        };
        return Err(Error::unauthorized(message));
    }

    let mut resolved: pairing_invitation::ActiveModel = invitation.into();
    resolved.status = Set(outcome);
    resolved.update(db).await.map_err(Into::into)
}
