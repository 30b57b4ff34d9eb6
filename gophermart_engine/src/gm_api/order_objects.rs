use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{EntryKind, LedgerEntry, OrderStatusType};

/// Criteria for [`crate::LedgerManagement::search_entries`]. Empty fields do not constrain the search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryQueryFilter {
    pub user_id: Option<i64>,
    pub kind: Option<EntryKind>,
    pub statuses: Vec<OrderStatusType>,
}

impl EntryQueryFilter {
    /// Debit entries that still need a verdict from the accrual service.
    pub fn pending() -> Self {
        Self::default().with_kind(EntryKind::Debit).with_status(OrderStatusType::New).with_status(OrderStatusType::Processing)
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.kind.is_none() && self.statuses.is_empty()
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.user_id.map_or(true, |id| id == entry.user_id)
            && self.kind.map_or(true, |k| k == entry.kind)
            && (self.statuses.is_empty() || self.statuses.contains(&entry.status))
    }
}

impl Display for EntryQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All entries");
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(id) = self.user_id {
            parts.push(format!("user_id: {id}"));
        }
        if let Some(kind) = self.kind {
            parts.push(format!("kind: {kind}"));
        }
        if !self.statuses.is_empty() {
            let statuses = self.statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            parts.push(format!("statuses: [{statuses}]"));
        }
        write!(f, "{}", parts.join(". "))
    }
}

/// The result of a successful order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order is new, and has been queued for accrual.
    Accepted(LedgerEntry),
    /// The same user submitted this order before. Nothing was changed.
    AlreadySubmitted(LedgerEntry),
}

impl SubmitOutcome {
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            SubmitOutcome::Accepted(e) | SubmitOutcome::AlreadySubmitted(e) => e,
        }
    }
}
