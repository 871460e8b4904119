//! Branch (venue) models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bar or restaurant location owning bottles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
}
