//! Result variants for lifecycle operations.
//!
//! Every expected business outcome is a variant here, never an error.
//! They serialize with an internal `status` tag so a route layer can hand
//! them straight to a client, and `Display` gives the line an operator
//! sees at the desk or gate.

use serde::{Deserialize, Serialize};
use std::fmt;

use gatepass_core::{Amount, Holder, Token, TokenCode, TokenId};

use crate::reference::RedemptionRef;

/// Summary of one `generate_batch` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated: u32,
    pub codes: Vec<TokenCode>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generated {} tokens", self.generated)
    }
}

/// A freshly assigned token, ready to be rendered as a QR pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedPass {
    pub token_id: TokenId,
    pub code: TokenCode,
    pub holder: Holder,
    pub price: Amount,
    pub assigned_at: i64,
    pub reference: RedemptionRef,
}

impl fmt::Display for IssuedPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Assigned to {} for {} ({})",
            self.holder, self.price, self.code
        )
    }
}

/// Outcome of assigning a specific, scanned code.
///
/// Variants are checked in this precedence: not found, already entered,
/// already assigned, assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignOutcome {
    Assigned(IssuedPass),
    AlreadyEntered {
        holder: Option<Holder>,
        entered_at: i64,
    },
    AlreadyAssigned {
        holder: Option<Holder>,
        price: Amount,
    },
    NotFound,
}

impl fmt::Display for AssignOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOutcome::Assigned(pass) => write!(f, "{}", pass),
            AssignOutcome::AlreadyEntered { holder, .. } => {
                write!(f, "Already entered by {}", holder_label(holder))
            }
            AssignOutcome::AlreadyAssigned { holder, price } => {
                write!(f, "Already assigned to {} for {}", holder_label(holder), price)
            }
            AssignOutcome::NotFound => f.write_str("Token not found"),
        }
    }
}

/// Outcome of assigning whichever unassigned token comes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignNextOutcome {
    Assigned(IssuedPass),
    NoTokensLeft,
}

impl AssignNextOutcome {
    pub fn pass(&self) -> Option<&IssuedPass> {
        match self {
            AssignNextOutcome::Assigned(pass) => Some(pass),
            AssignNextOutcome::NoTokensLeft => None,
        }
    }
}

impl fmt::Display for AssignNextOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignNextOutcome::Assigned(pass) => write!(f, "{}", pass),
            AssignNextOutcome::NoTokensLeft => f.write_str("No tokens left"),
        }
    }
}

/// Outcome of a gate scan.
///
/// The three refusals are distinct on purpose: an invalid code is denied,
/// an unpaid one is investigated, a repeat scan is explained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedeemOutcome {
    Granted {
        holder_name: String,
        entered_at: i64,
    },
    AlreadyEntered {
        holder_name: String,
        entered_at: i64,
    },
    Unpaid,
    Invalid,
}

impl RedeemOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, RedeemOutcome::Granted { .. })
    }
}

impl fmt::Display for RedeemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeemOutcome::Granted { holder_name, .. } => {
                write!(f, "Entry granted: {}", holder_name)
            }
            RedeemOutcome::AlreadyEntered { holder_name, .. } => {
                write!(f, "Already entered: {}", holder_name)
            }
            RedeemOutcome::Unpaid => f.write_str("Unpaid token: not assigned to anyone"),
            RedeemOutcome::Invalid => f.write_str("Invalid token"),
        }
    }
}

/// Read-only view of a scanned code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    Invalid,
    Unassigned {
        token_id: TokenId,
    },
    Assigned {
        token_id: TokenId,
        holder: Option<Holder>,
        price: Amount,
        entered: bool,
        entered_at: Option<i64>,
    },
}

impl LookupOutcome {
    pub(crate) fn from_token(token: Token) -> Self {
        if token.is_assigned() {
            LookupOutcome::Assigned {
                token_id: token.id,
                entered: token.is_entered(),
                entered_at: token.entered_at,
                holder: token.holder,
                price: token.price,
            }
        } else {
            LookupOutcome::Unassigned { token_id: token.id }
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupOutcome::Invalid => f.write_str("Invalid token"),
            LookupOutcome::Unassigned { .. } => f.write_str("Unassigned token"),
            LookupOutcome::Assigned {
                holder,
                price,
                entered,
                ..
            } => {
                write!(f, "Assigned to {} for {}", holder_label(holder), price)?;
                if *entered {
                    f.write_str(", already entered")?;
                }
                Ok(())
            }
        }
    }
}

fn holder_label(holder: &Option<Holder>) -> String {
    holder
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder() -> Holder {
        Holder {
            name: "Asha".into(),
            roll: "21CS001".into(),
        }
    }

    #[test]
    fn test_redeem_messages_distinct() {
        let messages = [
            RedeemOutcome::Granted {
                holder_name: "Asha".into(),
                entered_at: 1,
            }
            .to_string(),
            RedeemOutcome::AlreadyEntered {
                holder_name: "Asha".into(),
                entered_at: 1,
            }
            .to_string(),
            RedeemOutcome::Unpaid.to_string(),
            RedeemOutcome::Invalid.to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_status_tags() {
        let json = serde_json::to_value(RedeemOutcome::Unpaid).unwrap();
        assert_eq!(json, serde_json::json!({"status": "unpaid"}));

        let json = serde_json::to_value(AssignOutcome::AlreadyAssigned {
            holder: Some(holder()),
            price: Amount(400),
        })
        .unwrap();
        assert_eq!(json["status"], "already_assigned");
        assert_eq!(json["holder"]["name"], "Asha");
        assert_eq!(json["price"], 400);

        let json = serde_json::to_value(AssignNextOutcome::NoTokensLeft).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_tokens_left"}));
    }

    #[test]
    fn test_issued_pass_flattens_under_tag() {
        let code = TokenCode::from_bytes([1; 8]);
        let pass = IssuedPass {
            token_id: TokenId(7),
            code,
            holder: holder(),
            price: Amount(400),
            assigned_at: 10,
            reference: RedemptionRef::new("http://localhost:5000", code),
        };
        let outcome = AssignOutcome::Assigned(pass.clone());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "assigned");
        assert_eq!(json["code"], "0101010101010101");
        assert_eq!(
            json["reference"]["url"],
            "http://localhost:5000/verify/0101010101010101"
        );

        let back: AssignOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
        assert_eq!(
            outcome.to_string(),
            "Assigned to Asha (21CS001) for ₹400 (0101010101010101)"
        );
    }

    #[test]
    fn test_lookup_from_token() {
        let mut token = Token::new(TokenId(3), TokenCode::from_bytes([2; 8]));
        assert_eq!(
            LookupOutcome::from_token(token.clone()),
            LookupOutcome::Unassigned { token_id: TokenId(3) }
        );

        token.holder = Some(holder());
        token.price = Amount(250);
        token.assigned_at = Some(5);
        let outcome = LookupOutcome::from_token(token);
        assert_eq!(outcome.to_string(), "Assigned to Asha (21CS001) for ₹250");
    }
}
