//! Two-step administrator handover.
//!
//! The administrator nominates a candidate; the candidate takes over by
//! naming itself. The nomination is kept after acceptance, so the accepted
//! administrator can repeat the acceptance with no further effect.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::Address;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControl {
    pub administrator: Address,
    pub proposed_administrator: Address,
}

impl AccessControl {
    pub fn new(administrator: impl Into<Address>) -> Self {
        let administrator = administrator.into();
        Self {
            proposed_administrator: administrator.clone(),
            administrator,
        }
    }

    pub fn ensure_administrator(&self, sender: &Address) -> Result<(), LedgerError> {
        if *sender == self.administrator {
            Ok(())
        } else {
            Err(LedgerError::NotOwner {
                sender: sender.clone(),
            })
        }
    }

    /// Checks a nomination and returns the new proposed administrator.
    pub fn propose(&self, sender: &Address, candidate: &Address) -> Result<Address, LedgerError> {
        self.ensure_administrator(sender)?;
        Ok(candidate.clone())
    }

    /// Checks an acceptance and returns the new administrator.
    pub fn accept(&self, sender: &Address, candidate: &Address) -> Result<Address, LedgerError> {
        if *sender != self.proposed_administrator || *candidate != self.proposed_administrator {
            return Err(LedgerError::NotOwner {
                sender: sender.clone(),
            });
        }
        Ok(candidate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_self_nomination() {
        let access = AccessControl::new("admin");
        assert_eq!(access.administrator, "admin");
        assert_eq!(access.proposed_administrator, "admin");
    }

    #[test]
    fn only_administrator_may_propose() {
        let access = AccessControl::new("admin");
        assert_eq!(
            access.propose(&"mallory".into(), &"mallory".into()),
            Err(LedgerError::NotOwner {
                sender: "mallory".into()
            })
        );
        assert_eq!(
            access.propose(&"admin".into(), &"carol".into()).unwrap(),
            "carol"
        );
    }

    #[test]
    fn acceptance_requires_sender_and_candidate_to_match_nomination() {
        let mut access = AccessControl::new("admin");
        access.proposed_administrator = "carol".into();

        assert!(access.accept(&"admin".into(), &"carol".into()).is_err());
        assert!(access.accept(&"carol".into(), &"admin".into()).is_err());
        assert!(access.accept(&"dave".into(), &"dave".into()).is_err());
        assert_eq!(access.accept(&"carol".into(), &"carol".into()).unwrap(), "carol");
    }
}
