//! Category business logic - couple-scoped buckets created on first use.
//!
//! Categories are name-driven: `ensure_category` resolves a name to a row,
//! creating it when absent. The insert goes through `ON CONFLICT DO NOTHING`
//! against the unique (couple_id, name) index, so two first-writes of the
//! same name converge on a single row instead of racing.

use crate::{
    entities::{Category, CategoryKind, category},
    errors::{Error, Result},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Finds a category by name within a couple.
pub async fn get_category<C>(
    conn: &C,
    couple_id: i64,
    name: &str,
) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::CoupleId.eq(couple_id))
        .filter(category::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Lists a couple's categories alphabetically.
pub async fn list_categories(
    db: &DatabaseConnection,
    couple_id: i64,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(category::Column::CoupleId.eq(couple_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves a category by name, creating it with `kind` when absent.
///
/// The kind only applies on creation; an existing row keeps whatever kind
/// its first use gave it (callers check consistency).
pub async fn ensure_category<C>(
    conn: &C,
    couple_id: i64,
    name: &str,
    kind: CategoryKind,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }

    let fresh = category::ActiveModel {
        couple_id: Set(couple_id),
        name: Set(name.to_string()),
        kind: Set(kind),
        ..Default::default()
    };
    Category::insert(fresh)
        .on_conflict(
            OnConflict::columns([category::Column::CoupleId, category::Column::Name])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    get_category(conn, couple_id, name)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: name.to_string(),
        })
}
