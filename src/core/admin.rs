//! Administrative facade - role-gated maintenance over users and ledgers.
//!
//! Every operation takes the acting user's id and passes through
//! [`require_admin`], which checks the `is_admin` role column; there is no
//! username-based gate. Destructive actions emit an `admin_audit` tracing
//! event (actor, action, target id, detail) for the append-only audit sink
//! to collect.

use crate::{
    core::identity::UserProfile,
    core::transaction::LedgerEntry,
    entities::{
        Budget, Category, CouplePair, PairingInvitation, Transaction, TransactionKind, User,
        category, pairing_invitation, transaction, user,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set, TransactionTrait,
};

/// Admin views are capped to the most recent rows.
const ADMIN_LEDGER_LIMIT: u64 = 100;

/// Everything the admin panel shows about one account.
#[derive(Debug, Clone)]
pub struct UserDetails {
    /// The account itself
    pub profile: UserProfile,
    /// How many ledger entries the account recorded
    pub transaction_count: u64,
    /// The account's partner, when paired
    pub partner: Option<PartnerInfo>,
}

/// A paired partner as shown in the admin panel.
#[derive(Debug, Clone)]
pub struct PartnerInfo {
    /// Couple pair id
    pub couple_id: i64,
    /// Couple display name
    pub couple_name: String,
    /// The partner's account
    pub profile: UserProfile,
}

/// Overall system counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStats {
    pub total_users: u64,
    pub total_couples: u64,
    pub total_transactions: u64,
    pub total_budgets: u64,
}

/// A system-wide ledger row for the admin panel.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct AdminLedgerRow {
    /// Transaction id
    pub id: i64,
    /// Recording user's name; `None` for recurrence-engine rows
    pub username: Option<String>,
    /// Category name
    pub category_name: String,
    /// Amount
    pub amount: f64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Calendar date
    pub date: chrono::NaiveDate,
    /// Free-text description
    pub description: String,
}

/// Checks that the acting user exists and carries the admin role.
pub async fn require_admin(db: &DatabaseConnection, acting_user_id: i64) -> Result<user::Model> {
    let account = User::find_by_id(acting_user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: acting_user_id.to_string(),
        })?;
    if !account.is_admin {
        return Err(Error::unauthorized("Administrator role required"));
    }
    Ok(account)
}

/// Promotes the configured bootstrap account to the admin role.
///
/// Called at startup with the username from configuration. Returns whether
/// the flag was flipped; an unknown username is not an error (the account
/// may simply not have registered yet).
pub async fn bootstrap_admin(db: &DatabaseConnection, username: &str) -> Result<bool> {
    let account = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    match account {
        Some(account) if !account.is_admin => {
            let mut active: user::ActiveModel = account.into();
            active.is_admin = Set(true);
            active.update(db).await?;
            tracing::info!(username, "Promoted bootstrap admin account");
            Ok(true)
        }
        Some(_) => Ok(false),
        None => {
            tracing::debug!(username, "Bootstrap admin account not registered yet");
            Ok(false)
        }
    }
}

/// Lists every account, newest first.
pub async fn list_users(
    db: &DatabaseConnection,
    acting_user_id: i64,
) -> Result<Vec<UserProfile>> {
    require_admin(db, acting_user_id).await?;
    Ok(User::find()
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Detailed view of one account: profile, activity count and partner.
pub async fn user_details(
    db: &DatabaseConnection,
    acting_user_id: i64,
    user_id: i64,
) -> Result<Option<UserDetails>> {
    require_admin(db, acting_user_id).await?;

    let Some(account) = User::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };

    let transaction_count = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    let partner = match super::pairing::find_pair_for_user(db, user_id).await? {
        Some(pair) => {
            let partner_id = if pair.user1_id == user_id {
                pair.user2_id
            } else {
                pair.user1_id
            };
            User::find_by_id(partner_id)
                .one(db)
                .await?
                .map(|p| PartnerInfo {
                    couple_id: pair.id,
                    couple_name: pair.couple_name,
                    profile: p.into(),
                })
        }
        None => None,
    };

    Ok(Some(UserDetails {
        profile: account.into(),
        transaction_count,
        partner,
    }))
}

/// Overall system counters for the admin dashboard.
pub async fn system_stats(db: &DatabaseConnection, acting_user_id: i64) -> Result<SystemStats> {
    require_admin(db, acting_user_id).await?;

    Ok(SystemStats {
        total_users: User::find().count(db).await?,
        total_couples: CouplePair::find().count(db).await?,
        total_transactions: Transaction::find().count(db).await?,
        total_budgets: Budget::find().count(db).await?,
    })
}

/// The most recent transactions across every couple, newest first.
pub async fn list_all_transactions(
    db: &DatabaseConnection,
    acting_user_id: i64,
) -> Result<Vec<AdminLedgerRow>> {
    require_admin(db, acting_user_id).await?;

    Transaction::find()
        .join(JoinType::InnerJoin, transaction::Relation::Category.def())
        .join(JoinType::LeftJoin, transaction::Relation::User.def())
        .select_only()
        .column(transaction::Column::Id)
        .column_as(user::Column::Username, "username")
        .column_as(category::Column::Name, "category_name")
        .column(transaction::Column::Amount)
        .column(transaction::Column::Kind)
        .column(transaction::Column::Date)
        .column(transaction::Column::Description)
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .limit(ADMIN_LEDGER_LIMIT)
        .into_model::<AdminLedgerRow>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every transaction one user recorded, newest first (admin view).
pub async fn transactions_for_user(
    db: &DatabaseConnection,
    acting_user_id: i64,
    user_id: i64,
) -> Result<Vec<LedgerEntry>> {
    require_admin(db, acting_user_id).await?;

    let rows = Transaction::find()
        .find_also_related(Category)
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, cat)| LedgerEntry {
            category_name: cat.map(|c| c.name).unwrap_or_default(),
            transaction: entry,
        })
        .collect())
}

/// Deletes an account together with all of its data.
///
/// If the account is paired, the couple and every financial row scoped to
/// it go first; invitations naming the account are removed as well. All of
/// it commits as one database transaction.
pub async fn delete_user(
    db: &DatabaseConnection,
    acting_user_id: i64,
    user_id: i64,
) -> Result<()> {
    let actor = require_admin(db, acting_user_id).await?;
    let txn = db.begin().await?;

    let account = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: user_id.to_string(),
        })?;

    if let Some(pair) = super::pairing::find_pair_for_user(&txn, user_id).await? {
        super::pairing::delete_couple_cascade(&txn, pair.id).await?;
    }
    PairingInvitation::delete_many()
        .filter(
            Condition::any()
                .add(pairing_invitation::Column::SenderId.eq(user_id))
                .add(pairing_invitation::Column::ReceiverId.eq(user_id)),
        )
        .exec(&txn)
        .await?;

    let username = account.username.clone();
    account.delete(&txn).await?;

    txn.commit().await?;
    audit(&actor, "DELETE_USER", user_id, &format!("Deleted user {username}"));
    Ok(())
}

/// Deletes any transaction, including recurrence-engine rows no user owns.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    acting_user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let actor = require_admin(db, acting_user_id).await?;

    let entry = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    entry.delete(db).await?;

    audit(&actor, "DELETE_TRANSACTION", transaction_id, "");
    Ok(())
}

/// Resets another user's password.
pub async fn reset_user_password(
    db: &DatabaseConnection,
    acting_user_id: i64,
    user_id: i64,
    new_password: &str,
) -> Result<()> {
    let actor = require_admin(db, acting_user_id).await?;
    super::identity::reset_password(db, user_id, new_password).await?;
    audit(&actor, "RESET_PASSWORD", user_id, "");
    Ok(())
}

fn audit(actor: &user::Model, action: &str, target_id: i64, details: &str) {
    tracing::info!(
        target: "admin_audit",
        admin = %actor.username,
        action,
        target_id,
        details,
    );
}
