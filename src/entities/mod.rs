//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. Each entity has a Model struct
//! for data and an Entity struct for operations.

pub mod monthly_archive;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use monthly_archive::{
    Column as MonthlyArchiveColumn, Entity as MonthlyArchive, Model as MonthlyArchiveModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
