/// Month-over-month comparison and trend analysis
pub mod analytics;

/// Monthly archive snapshots and the archive store
pub mod archive;

/// Chat transport capability and button payloads
pub mod chat;

/// CSV export of archived months
pub mod export;

/// Transaction lifecycle state machine
pub mod lifecycle;

/// Monthly close orchestration
pub mod monthly;

/// Chat report formatting
pub mod report;

/// Balance, category totals and spending statistics
pub mod totals;

/// Store operations on live transactions
pub mod transaction;
