use serde::{Deserialize, Serialize};

use crate::actions::EcoAction;

/// Published after every successful insert
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionInsertedMessage {
    pub user_id: String,
    pub action: EcoAction,
    /// RFC3339
    pub timestamp: String,
}
