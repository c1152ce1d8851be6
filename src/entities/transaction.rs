//! Transaction entity - One reported expense in the live (current month) ledger.
//!
//! The `id` is taken from the chat message that reported the amount, so a message
//! can never produce two transactions. The two optional message ids link the record
//! to the outbound messages the bot posted about it.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Id of the originating chat message
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Reported amount, positive at creation
    pub amount: f64,
    /// Display name of the user who reported the expense
    pub author: String,
    /// Selected category, `None` until the user picks one
    pub category: Option<String>,
    /// Message carrying the category buttons
    pub category_prompt_message_id: Option<String>,
    /// Separate confirmation message, removed on recategorization and deletion
    pub confirmation_message_id: Option<String>,
    /// When the transaction was recorded
    pub created_at: DateTimeUtc,
}

/// Transactions have no relationships; archives embed a JSON snapshot instead
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
