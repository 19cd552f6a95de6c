use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Result, TrackerError};

/// The fixed nutrient schema, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NutrientField {
    #[serde(rename = "nf_calories")]
    Calories,
    #[serde(rename = "nf_total_fat")]
    TotalFat,
    #[serde(rename = "nf_saturated_fat")]
    SaturatedFat,
    #[serde(rename = "nf_cholesterol")]
    Cholesterol,
    #[serde(rename = "nf_total_carbohydrate")]
    TotalCarbohydrate,
    #[serde(rename = "nf_sugars")]
    Sugars,
    #[serde(rename = "nf_dietary_fiber")]
    DietaryFiber,
    #[serde(rename = "nf_protein")]
    Protein,
    #[serde(rename = "nf_sodium")]
    Sodium,
}

impl NutrientField {
    pub const ALL: [NutrientField; 9] = [
        NutrientField::Calories,
        NutrientField::TotalFat,
        NutrientField::SaturatedFat,
        NutrientField::Cholesterol,
        NutrientField::TotalCarbohydrate,
        NutrientField::Sugars,
        NutrientField::DietaryFiber,
        NutrientField::Protein,
        NutrientField::Sodium,
    ];

    /// Schema key, matching the Nutritionix field names.
    pub fn name(self) -> &'static str {
        match self {
            NutrientField::Calories => "nf_calories",
            NutrientField::TotalFat => "nf_total_fat",
            NutrientField::SaturatedFat => "nf_saturated_fat",
            NutrientField::Cholesterol => "nf_cholesterol",
            NutrientField::TotalCarbohydrate => "nf_total_carbohydrate",
            NutrientField::Sugars => "nf_sugars",
            NutrientField::DietaryFiber => "nf_dietary_fiber",
            NutrientField::Protein => "nf_protein",
            NutrientField::Sodium => "nf_sodium",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NutrientField::Calories => "calories",
            NutrientField::TotalFat => "total fat",
            NutrientField::SaturatedFat => "saturated fat",
            NutrientField::Cholesterol => "cholesterol",
            NutrientField::TotalCarbohydrate => "total carbohydrate",
            NutrientField::Sugars => "sugars",
            NutrientField::DietaryFiber => "dietary fiber",
            NutrientField::Protein => "protein",
            NutrientField::Sodium => "sodium",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            NutrientField::Calories => "kcal",
            NutrientField::Cholesterol | NutrientField::Sodium => "mg",
            _ => "g",
        }
    }

    /// Accepts the schema key (`nf_protein`), the bare key (`protein`) or the
    /// label with underscores (`total_fat`).
    pub fn from_name(name: &str) -> Option<NutrientField> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        let bare = normalized.strip_prefix("nf_").unwrap_or(normalized.as_str());
        NutrientField::ALL.into_iter().find(|field| {
            field.name().strip_prefix("nf_") == Some(bare)
                || field.label().replace(' ', "_") == bare
        })
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NutrientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-100g nutrient values. `None` means "not determined", which is not
/// the same as a measured zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredNutrients")]
pub struct NutrientVector {
    values: [Option<f64>; 9],
}

/// Unchecked shape of a stored vector; goes through [`NutrientVector::set`].
#[derive(Deserialize)]
struct StoredNutrients {
    #[serde(default)]
    values: [Option<f64>; 9],
}

impl TryFrom<StoredNutrients> for NutrientVector {
    type Error = TrackerError;

    fn try_from(stored: StoredNutrients) -> Result<Self> {
        let mut vector = NutrientVector::unknown();
        for (field, value) in NutrientField::ALL.into_iter().zip(stored.values) {
            vector.set(field, value)?;
        }
        Ok(vector)
    }
}

impl NutrientVector {
    /// All fields unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Builds a vector from `name -> value` pairs. Absent fields stay unknown;
    /// names outside the schema are skipped. Two names for the same field
    /// (`protein` and `nf_protein`) are rejected.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        let mut vector = Self::unknown();
        let mut seen = HashSet::new();
        for (name, value) in map {
            match NutrientField::from_name(name) {
                Some(field) => {
                    if !seen.insert(field) {
                        return Err(TrackerError::invalid(format!(
                            "{} is given more than once",
                            field
                        )));
                    }
                    vector.set(field, Some(*value))?
                }
                None => tracing::debug!(nutrient = %name, "ignoring nutrient outside schema"),
            }
        }
        Ok(vector)
    }

    pub fn get(&self, field: NutrientField) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: NutrientField, value: Option<f64>) -> Result<()> {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(TrackerError::invalid(format!(
                    "{} must be a non-negative number, got {}",
                    field, v
                )));
            }
        }
        self.values[field.index()] = value;
        Ok(())
    }

    /// Builder form of [`NutrientVector::set`].
    pub fn with(mut self, field: NutrientField, value: Option<f64>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientField, Option<f64>)> + '_ {
        NutrientField::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    pub fn is_all_unknown(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map_leaves_absent_fields_unknown() {
        let mut map = HashMap::new();
        map.insert("nf_calories".to_string(), 52.0);
        map.insert("nf_sugars".to_string(), 0.0);
        map.insert("other".to_string(), 1.0);

        let vector = NutrientVector::from_map(&map).unwrap();
        assert_eq!(vector.get(NutrientField::Calories), Some(52.0));
        assert_eq!(vector.get(NutrientField::Sugars), Some(0.0)); // measured zero kept
        assert_eq!(vector.get(NutrientField::Protein), None);
        assert_eq!(vector.iter().filter(|(_, v)| v.is_some()).count(), 2);
    }

    #[test]
    fn test_from_map_rejects_negative_values() {
        let mut map = HashMap::new();
        map.insert("nf_protein".to_string(), -1.0);
        let result = NutrientVector::from_map(&map);
        assert!(matches!(result, Err(TrackerError::InvalidInput(_))));
    }

    #[test]
    fn test_from_map_rejects_aliased_field() {
        let mut map = HashMap::new();
        map.insert("protein".to_string(), 3.0);
        map.insert("nf_protein".to_string(), 4.0);
        assert!(matches!(
            NutrientVector::from_map(&map),
            Err(TrackerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stored_vector_is_validated() {
        let ok: NutrientVector =
            serde_json::from_str(r#"{"values":[52.0,null,null,null,null,0.0,null,null,null]}"#)
                .unwrap();
        assert_eq!(ok.get(NutrientField::Calories), Some(52.0));
        assert_eq!(ok.get(NutrientField::Sugars), Some(0.0));

        let negative = serde_json::from_str::<NutrientVector>(
            r#"{"values":[-500.0,null,null,null,null,null,null,null,null]}"#,
        );
        assert!(negative.is_err());

        let missing: NutrientVector = serde_json::from_str("{}").unwrap();
        assert!(missing.is_all_unknown());
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!(NutrientField::from_name("nf_calories"), Some(NutrientField::Calories));
        assert_eq!(NutrientField::from_name("calories"), Some(NutrientField::Calories));
        assert_eq!(NutrientField::from_name("Total Fat"), Some(NutrientField::TotalFat));
        assert_eq!(NutrientField::from_name("total_carbohydrate"), Some(NutrientField::TotalCarbohydrate));
        assert_eq!(NutrientField::from_name("vitamin_c"), None);
    }

    #[test]
    fn test_schema_order_is_fixed() {
        let names: Vec<&str> = NutrientField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "nf_calories",
                "nf_total_fat",
                "nf_saturated_fat",
                "nf_cholesterol",
                "nf_total_carbohydrate",
                "nf_sugars",
                "nf_dietary_fiber",
                "nf_protein",
                "nf_sodium",
            ]
        );
    }

    #[test]
    fn test_unknown_vector_round_trips_through_json() {
        let vector = NutrientVector::unknown()
            .with(NutrientField::Sodium, Some(0.0))
            .unwrap();
        let json = serde_json::to_string(&vector).unwrap();
        let back: NutrientVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vector);
        assert!(NutrientVector::unknown().is_all_unknown());
    }
}
