use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use gm_common::Points;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------      EntryKind       ---------------------------------------------------------
/// Ledger entries either add points to a user's balance (debits, one per submitted order) or take points away
/// (credits, one per withdrawal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Debit,
    Credit,
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Debit => write!(f, "DEBIT"),
            EntryKind::Credit => write!(f, "CREDIT"),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been submitted, but the accrual service has not said anything about it yet.
    New,
    /// The accrual service knows about the order and is working on it.
    Processing,
    /// The order will not earn any points. Terminal.
    Invalid,
    /// The accrual has been calculated and credited. Terminal.
    Processed,
    /// Status of every credit (withdrawal) entry. Terminal.
    Withdrawn,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed | Self::Withdrawn)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::New | Self::Processing)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
            OrderStatusType::Withdrawn => write!(f, "WITHDRAWN"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// An order number as submitted by a user. The type itself does not validate anything; the order flow API rejects
/// numbers that fail the Luhn check before they ever reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub kind: EntryKind,
    pub status: OrderStatusType,
    /// Positive (or zero) for debits, negative for credits.
    pub amount: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What should happen when a status update arrives for an existing debit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Write the new status and amount.
    Apply,
    /// The entry already holds exactly this status and amount.
    Unchanged,
    /// The entry is terminal and the update would change it. Late, stale or contradictory verdicts end up here.
    Refuse,
}

impl LedgerEntry {
    /// Decides how a status update should be applied to this entry. Shared by every backend so that the terminal
    /// guard is identical everywhere.
    pub fn transition_to(&self, status: OrderStatusType, amount: Points) -> Transition {
        if self.status == status && self.amount == amount {
            Transition::Unchanged
        } else if self.status.is_terminal() {
            Transition::Refuse
        } else {
            Transition::Apply
        }
    }

    /// The amount awarded for this order, if it has been processed. Used for display; pending orders report nothing.
    pub fn accrual(&self) -> Option<Points> {
        match (self.kind, self.status) {
            (EntryKind::Debit, OrderStatusType::Processed) => Some(self.amount),
            _ => None,
        }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Settled accrual minus everything withdrawn so far. This is what can still be withdrawn.
    pub current: Points,
    /// Everything withdrawn so far, as a positive number.
    pub withdrawn: Points,
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, password_hash: S) -> Self {
        Self { username: username.into(), password_hash: password_hash.into() }
    }
}
