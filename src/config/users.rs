//! User configuration module for loading the two participants from environment variables.
//!
//! Only the two configured chat users may record expenses. Each one can be given a
//! friendly nickname in the `.env` file; without one they are shown as "Partner 1" or
//! "Partner 2". The name resolved here is what gets stored as a transaction's
//! `author`. It is derived from the user id alone, so a username change mid-month never
//! splits one person into two authors.

use crate::errors::{Error, Result};

/// One of the two people sharing expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Chat user id
    pub user_id: String,
    /// Name shown in reports and stored as the transaction author
    pub name: String,
}

/// The two configured participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participants {
    members: [Participant; 2],
}

impl Participants {
    /// Validates the two user ids and resolves their display names.
    ///
    /// Ids must be non-empty and distinct, and so must the resolved names, since the
    /// balance is keyed on the author name.
    pub fn new(user_ids: [String; 2], nicknames: [Option<String>; 2]) -> Result<Self> {
        let [first_id, second_id] = user_ids.map(|id| id.trim().to_string());
        let [first_nick, second_nick] = nicknames;

        if first_id.is_empty() || second_id.is_empty() {
            return Err(Error::Config {
                message: "COUPLE_USER_ID_1 and COUPLE_USER_ID_2 must both be set".to_string(),
            });
        }
        if first_id == second_id {
            return Err(Error::Config {
                message: "COUPLE_USER_ID_1 and COUPLE_USER_ID_2 must differ".to_string(),
            });
        }

        let resolve = |nickname: Option<String>, slot: u8| {
            nickname
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Partner {slot}"))
        };
        let members = [
            Participant {
                user_id: first_id,
                name: resolve(first_nick, 1),
            },
            Participant {
                user_id: second_id,
                name: resolve(second_nick, 2),
            },
        ];
        if members[0].name == members[1].name {
            return Err(Error::Config {
                message: format!("Both participants are named '{}'", members[0].name),
            });
        }

        Ok(Self { members })
    }

    /// Reads `COUPLE_USER_ID_1`, `COUPLE_USER_ID_2`, and the optional
    /// `USER_NICKNAME_1` / `USER_NICKNAME_2`.
    pub fn from_env() -> Result<Self> {
        let user_id = |slot: u8| -> Result<String> {
            std::env::var(format!("COUPLE_USER_ID_{slot}")).map_err(|e| Error::Config {
                message: format!("COUPLE_USER_ID_{slot}: {e}"),
            })
        };
        let nickname = |slot: u8| std::env::var(format!("USER_NICKNAME_{slot}")).ok();

        Self::new([user_id(1)?, user_id(2)?], [nickname(1), nickname(2)])
    }

    /// The author name for `user_id`, or `None` when the user is not a participant.
    #[must_use]
    pub fn author_for(&self, user_id: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|member| member.user_id == user_id)
            .map(|member| member.name.as_str())
    }

    /// Both participants, in configuration order.
    #[must_use]
    pub const fn members(&self) -> &[Participant; 2] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn ids() -> [String; 2] {
        ["42".to_string(), "7".to_string()]
    }

    #[test]
    fn test_nickname_used_as_author() {
        let participants = Participants::new(ids(), [Some("Sam".into()), Some("Robin".into())]).unwrap();

        assert_eq!(participants.author_for("42"), Some("Sam"));
        assert_eq!(participants.author_for("7"), Some("Robin"));
    }

    #[test]
    fn test_missing_nickname_falls_back_to_slot_name() {
        let participants = Participants::new(ids(), [None, Some("  ".into())]).unwrap();

        assert_eq!(participants.author_for("42"), Some("Partner 1"));
        assert_eq!(participants.author_for("7"), Some("Partner 2"));
    }

    #[test]
    fn test_outsiders_have_no_author() {
        let participants = Participants::new(ids(), [None, None]).unwrap();
        assert_eq!(participants.author_for("99"), None);
        assert_eq!(participants.author_for(""), None);
    }

    #[test]
    fn test_invalid_participants_rejected() {
        assert!(Participants::new(["42".into(), " ".into()], [None, None]).is_err());
        assert!(Participants::new(["42".into(), "42".into()], [None, None]).is_err());
        assert!(Participants::new(ids(), [Some("Sam".into()), Some("Sam".into())]).is_err());
    }
}
