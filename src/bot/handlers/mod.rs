//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not slash
//! commands: gateway events feeding the ledger, and autocomplete.

/// Autocomplete handlers for export targets
pub mod autocomplete;
/// Message, edit and button events for the ledger channel
pub mod events;
