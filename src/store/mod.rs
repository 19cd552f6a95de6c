pub mod json_store;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, TrackerError};
use crate::metabolism::PhysicalParams;
use crate::nutrients::NutrientVector;
use crate::products::{Product, ProductType};

pub use json_store::JsonFileStore;

/// Everything persisted for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub custom_products: Vec<Arc<ProductType>>,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, Vec<Product>>,
    #[serde(default)]
    pub params: PhysicalParams,
    #[serde(default)]
    pub limits: NutrientVector,
}

impl UserRecord {
    /// Fresh record: empty catalog and history, zeroed params, no limits.
    pub fn empty(username: &str) -> Self {
        Self {
            username: username.to_string(),
            custom_products: Vec::new(),
            history: BTreeMap::new(),
            params: PhysicalParams::default(),
            limits: NutrientVector::unknown(),
        }
    }
}

/// Persistence for user records.
pub trait UserStore {
    /// Fails with [`TrackerError::NotFound`] when nothing is stored for `username`.
    fn load_user(&self, username: &str) -> Result<UserRecord>;

    fn save_user(&self, record: &UserRecord) -> Result<()>;

    /// Names of all users with stored data, sorted.
    fn list_users(&self) -> Result<Vec<String>>;
}

pub fn validate_username(username: &str) -> Result<()> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::invalid("username must not be empty"));
    }
    if trimmed != username {
        return Err(TrackerError::invalid(
            "username must not start or end with whitespace",
        ));
    }
    if username == "." || username == ".." || username.contains(['/', '\\']) {
        return Err(TrackerError::invalid(format!(
            "username '{}' is not usable as a file name",
            username
        )));
    }
    Ok(())
}
