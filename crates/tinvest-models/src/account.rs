use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Unspecified,
    New,
    Open,
    Closed,
}

/// A brokerage account as listed by the accounts service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub status: AccountStatus,
}

impl Account {
    pub fn is_open(&self) -> bool {
        self.status == AccountStatus::Open
    }
}
