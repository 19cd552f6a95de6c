use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrackerError};
use crate::nutrients::{NutrientField, NutrientVector};
use crate::products::{Product, ProductType};

/// Total of one nutrient over a set of eaten products.
///
/// `complete` is false when at least one product had no value for the
/// nutrient and was left out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotal {
    pub field: NutrientField,
    pub total: f64,
    pub complete: bool,
}

impl fmt::Display for NutrientTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.complete {
            write!(f, "{:.2} {}", self.total, self.field.unit())
        } else {
            write!(
                f,
                "At least {:.2} {} (not every value given)",
                self.total,
                self.field.unit()
            )
        }
    }
}

/// Absolute amount of `field` in `product`, if known.
fn contribution(product: &Product, field: NutrientField) -> Option<f64> {
    product
        .product_type()
        .nutrients
        .get(field)
        .map(|per_100g| per_100g * product.weight() / 100.0)
}

/// Combines eaten products into a new product type, per 100g of the mix.
///
/// Each nutrient is averaged over the ingredients that know it, weighted by
/// their share of the total mass. A nutrient no ingredient knows stays unknown.
pub fn combine(name: &str, ingredients: &[Product]) -> Result<ProductType> {
    if ingredients.is_empty() {
        return Err(TrackerError::invalid("cannot combine an empty ingredient list"));
    }
    if let Some(bad) = ingredients
        .iter()
        .find(|p| !p.weight().is_finite() || p.weight() <= 0.0)
    {
        return Err(TrackerError::invalid(format!(
            "weight of '{}' must be positive, got {}",
            bad.product_type().name,
            bad.weight()
        )));
    }
    let total_weight: f64 = ingredients.iter().map(Product::weight).sum();
    if !total_weight.is_finite() || total_weight <= 0.0 {
        return Err(TrackerError::invalid(format!(
            "total ingredient weight must be a positive number, got {}",
            total_weight
        )));
    }

    let scale_factor = 100.0 / total_weight;
    let mut combined = NutrientVector::unknown();
    for field in NutrientField::ALL {
        let mut sum: Option<f64> = None;
        for ingredient in ingredients {
            if let Some(amount) = contribution(ingredient, field) {
                sum = Some(sum.unwrap_or(0.0) + amount);
            }
        }
        combined.set(field, sum.map(|s| s * scale_factor))?;
    }

    tracing::debug!(
        name,
        ingredients = ingredients.len(),
        total_weight,
        "combined product"
    );
    ProductType::new(name, combined)
}

/// Sums one nutrient over `records`, reporting whether every record knew it.
pub fn sum_nutrient(field: NutrientField, records: &[Product]) -> NutrientTotal {
    let mut total = 0.0;
    let mut complete = true;
    for record in records {
        match contribution(record, field) {
            Some(amount) => total += amount,
            None => complete = false,
        }
    }
    NutrientTotal {
        field,
        total,
        complete,
    }
}
