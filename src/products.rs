use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, TrackerError};
use crate::nutrients::NutrientVector;

/// A named nutrient profile, values per 100g. Not tied to an eaten amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
    pub name: String,
    pub nutrients: NutrientVector,
}

impl ProductType {
    pub fn new(name: impl Into<String>, nutrients: NutrientVector) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TrackerError::invalid("product name must not be empty"));
        }
        Ok(Self { name, nutrients })
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One eaten amount of a product type. The type is shared, never owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredProduct")]
pub struct Product {
    product_type: Arc<ProductType>,
    weight: f64,
}

#[derive(Deserialize)]
struct StoredProduct {
    product_type: Arc<ProductType>,
    weight: f64,
}

impl TryFrom<StoredProduct> for Product {
    type Error = TrackerError;

    fn try_from(stored: StoredProduct) -> Result<Self> {
        Product::new(stored.product_type, stored.weight)
    }
}

impl Product {
    /// `weight` is in grams and must be positive.
    pub fn new(product_type: Arc<ProductType>, weight: f64) -> Result<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(TrackerError::invalid(format!(
                "weight of '{}' must be a positive number of grams, got {}",
                product_type.name, weight
            )));
        }
        Ok(Self { product_type, weight })
    }

    pub fn product_type(&self) -> &Arc<ProductType> {
        &self.product_type
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g\t{}", self.weight, self.product_type.name)
    }
}
