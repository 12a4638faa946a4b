/*!
# Funds Ledger

Every change to `campaigns.collected`, `users.current_funds` and
`users.withdrawable_funds` goes through this module. Each mutation is a single
conditional `UPDATE`; callers run them inside a transaction when several must
land together.

| operation | effect |
|---|---|
| `credit_campaign` | `collected += amount` |
| `close_campaign` | `is_ended = true` where it was still open |
| `credit_owner` | `current += amount`, `withdrawable += amount` |
| `reserve` | `withdrawable -= amount` where `withdrawable >= amount` |
| `settle` | `current -= amount` where `current >= amount` |
| `release` | `withdrawable += amount` |
| `lock_user`, `lock_campaign` | no change; holds the row until the transaction ends |
*/

use chrono::{DateTime, Utc};
use galang_entities::{campaigns, users};
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ColumnTrait as _, ConnectionTrait, EntityTrait, QueryFilter as _,
    QuerySelect as _, Select,
};
use tracing::debug;

use crate::{Error, Result};

/// Add a paid donation to the campaign's running total.
pub async fn credit_campaign<C: ConnectionTrait>(
    db: &C,
    campaign_id: i32,
    amount: i64,
) -> Result<()> {
    let result = campaigns::Entity::update_many()
        .col_expr(
            campaigns::Column::Collected,
            Expr::col(campaigns::Column::Collected).add(amount),
        )
        .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(campaigns::Column::Id.eq(campaign_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Campaign", campaign_id));
    }
    debug!(campaign_id, amount, "Credited campaign");
    Ok(())
}

/// Flip an open campaign to ended.
///
/// Returns `false` when the campaign was already ended (or does not exist), so
/// exactly one caller ever observes `true`.
pub async fn close_campaign<C: ConnectionTrait>(
    db: &C,
    campaign_id: i32,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = campaigns::Entity::update_many()
        .col_expr(campaigns::Column::IsEnded, Expr::value(true))
        .col_expr(campaigns::Column::EndedAt, Expr::value(Some(now)))
        .col_expr(campaigns::Column::UpdatedAt, Expr::value(now))
        .filter(campaigns::Column::Id.eq(campaign_id))
        .filter(campaigns::Column::IsEnded.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Credit funds raised by an ended campaign to its owner.
pub async fn credit_owner<C: ConnectionTrait>(db: &C, user_id: i32, amount: i64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let result = users::Entity::update_many()
        .col_expr(
            users::Column::CurrentFunds,
            Expr::col(users::Column::CurrentFunds).add(amount),
        )
        .col_expr(
            users::Column::WithdrawableFunds,
            Expr::col(users::Column::WithdrawableFunds).add(amount),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("User", user_id));
    }
    debug!(user_id, amount, "Credited owner");
    Ok(())
}

/// Hold `amount` of the user's withdrawable funds for a pending withdrawal.
pub async fn reserve<C: ConnectionTrait>(db: &C, user_id: i32, amount: i64) -> Result<()> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::WithdrawableFunds,
            Expr::col(users::Column::WithdrawableFunds).sub(amount),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .filter(users::Column::WithdrawableFunds.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id))?;
        return Err(Error::InsufficientFunds {
            requested: amount,
            available: user.withdrawable_funds,
        });
    }
    debug!(user_id, amount, "Reserved funds");
    Ok(())
}

/// Pay out a reservation: the money leaves `current_funds`.
pub async fn settle<C: ConnectionTrait>(db: &C, user_id: i32, amount: i64) -> Result<()> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::CurrentFunds,
            Expr::col(users::Column::CurrentFunds).sub(amount),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .filter(users::Column::CurrentFunds.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::InvalidState(format!(
            "user {user_id} holds less than {amount} in current funds"
        )));
    }
    debug!(user_id, amount, "Settled withdrawal");
    Ok(())
}

/// Return a rejected reservation to the withdrawable balance.
pub async fn release<C: ConnectionTrait>(db: &C, user_id: i32, amount: i64) -> Result<()> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::WithdrawableFunds,
            Expr::col(users::Column::WithdrawableFunds).add(amount),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("User", user_id));
    }
    debug!(user_id, amount, "Released reservation");
    Ok(())
}

/// Take the user's row lock ahead of a read-then-overwrite.
///
/// A no-op `UPDATE`, so PostgreSQL holds the row and SQLite the write lock until the
/// transaction ends; concurrent credits and reservations queue behind it.
pub(crate) async fn lock_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<()> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::UpdatedAt,
            SimpleExpr::from(Expr::col(users::Column::UpdatedAt)),
        )
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("User", user_id));
    }
    Ok(())
}

/// Campaign counterpart of [`lock_user`].
pub(crate) async fn lock_campaign<C: ConnectionTrait>(db: &C, campaign_id: i32) -> Result<()> {
    let result = campaigns::Entity::update_many()
        .col_expr(
            campaigns::Column::UpdatedAt,
            SimpleExpr::from(Expr::col(campaigns::Column::UpdatedAt)),
        )
        .filter(campaigns::Column::Id.eq(campaign_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Campaign", campaign_id));
    }
    Ok(())
}

/// Overwrite both balances. Only used when rebuilding from history.
pub(crate) async fn set_balances<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    current: i64,
    withdrawable: i64,
) -> Result<()> {
    users::Entity::update_many()
        .col_expr(users::Column::CurrentFunds, Expr::value(current))
        .col_expr(users::Column::WithdrawableFunds, Expr::value(withdrawable))
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

pub(crate) async fn set_collected<C: ConnectionTrait>(
    db: &C,
    campaign_id: i32,
    collected: i64,
) -> Result<()> {
    campaigns::Entity::update_many()
        .col_expr(campaigns::Column::Collected, Expr::value(collected))
        .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(campaigns::Column::Id.eq(campaign_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Sum one integer column over the rows `select` matches.
///
/// Summed client-side: PostgreSQL widens `SUM(bigint)` to `numeric`, SQLite does not.
pub(crate) async fn total<C, E>(db: &C, select: Select<E>, column: E::Column) -> Result<i64>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let amounts: Vec<i64> = select
        .select_only()
        .column(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(amounts.into_iter().sum())
}
