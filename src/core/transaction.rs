//! Transaction business logic - Store operations on live transaction records.
//!
//! This module owns the record invariants: ids come from the originating chat message,
//! amounts are finite and strictly positive when created, and `created_at` is set
//! once at insertion. Mutations go through `ActiveModel` partial updates so only the
//! touched column changes.

use crate::{
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Parses chat text as an expense amount.
///
/// Accepts anything `f64` parsing accepts after trimming, as long as the result is
/// finite and greater than zero. Ordinary conversation fails with
/// [`Error::InvalidAmount`], which callers are expected to ignore.
pub fn parse_amount(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount {
            input: trimmed.to_string(),
        }),
    }
}

/// Inserts a new, uncategorized transaction stamped with the current time.
pub async fn create_transaction(
    db: &DatabaseConnection,
    id: String,
    amount: f64,
    author: String,
) -> Result<transaction::Model> {
    create_transaction_at(db, id, amount, author, Utc::now()).await
}

/// Inserts a new, uncategorized transaction with an explicit creation time.
pub async fn create_transaction_at(
    db: &DatabaseConnection,
    id: String,
    amount: f64,
    author: String,
    created_at: DateTime<Utc>,
) -> Result<transaction::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount {
            input: amount.to_string(),
        });
    }

    let transaction_model = transaction::ActiveModel {
        id: Set(id),
        amount: Set(amount),
        author: Set(author),
        category: Set(None),
        category_prompt_message_id: Set(None),
        confirmation_message_id: Set(None),
        created_at: Set(created_at),
    };

    transaction_model.insert(db).await.map_err(Into::into)
}

/// Retrieves a specific transaction by id, `None` when it does not exist.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Records the id of the message carrying the category buttons.
pub async fn set_prompt_message(
    db: &DatabaseConnection,
    transaction: transaction::Model,
    message_id: String,
) -> Result<transaction::Model> {
    let mut active_model: transaction::ActiveModel = transaction.into();
    active_model.category_prompt_message_id = Set(Some(message_id));
    active_model.update(db).await.map_err(Into::into)
}

/// Sets the category. Any confirmation message id is cleared because the caller
/// has just removed that message.
pub async fn set_category(
    db: &DatabaseConnection,
    transaction: transaction::Model,
    category: String,
) -> Result<transaction::Model> {
    let mut active_model: transaction::ActiveModel = transaction.into();
    active_model.category = Set(Some(category));
    active_model.confirmation_message_id = Set(None);
    active_model.update(db).await.map_err(Into::into)
}

/// Replaces the amount, leaving every other field untouched.
pub async fn set_amount(
    db: &DatabaseConnection,
    transaction: transaction::Model,
    amount: f64,
) -> Result<transaction::Model> {
    let mut active_model: transaction::ActiveModel = transaction.into();
    active_model.amount = Set(amount);
    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a transaction. Returns whether a row was removed.
pub async fn delete_transaction(db: &DatabaseConnection, id: &str) -> Result<bool> {
    let result = Transaction::delete_by_id(id.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Retrieves every live transaction, oldest first.
pub async fn get_all_transactions(db: &DatabaseConnection) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .order_by_asc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves live transactions newest first, optionally capped at `limit`.
pub async fn get_recent_transactions(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find().order_by_desc(transaction::Column::CreatedAt);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.all(db).await.map_err(Into::into)
}

/// Deletes every live transaction and returns how many were removed.
pub async fn delete_all_transactions(db: &DatabaseConnection) -> Result<u64> {
    let result = Transaction::delete_many().exec(db).await?;
    Ok(result.rows_affected)
}
