use serde::{Deserialize, Serialize};

use super::WorkerId;

/// A member of the rotation pool. Owned by the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
}

impl Worker {
    pub fn new(id: WorkerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
