use serde::{Deserialize, Serialize};

pub const NUTRITIONIX_BASE_URL: &str = "https://trackapi.nutritionix.com/v2/";
pub const SEARCH_INSTANT_PATH: &str = "search/instant";
pub const SEARCH_ITEM_PATH: &str = "search/item";

pub const DEFAULT_APP_ID_ENV_VAR: &str = "NUTRITIONIX_APP_ID";
pub const DEFAULT_APP_KEY_ENV_VAR: &str = "NUTRITIONIX_APP_KEY";

/// What a caller sees of a search hit before asking for details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub display_name: String,
    pub external_id: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct SearchInstantQuery<'a> {
    pub query: &'a str,
    pub branded: bool,
    pub common: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct SearchItemQuery<'a> {
    pub nix_item_id: &'a str,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrandedFood {
    pub food_name: String,
    pub nix_item_id: String,
    #[serde(default)]
    pub brand_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchInstantResponse {
    #[serde(default)]
    pub branded: Vec<BrandedFood>,
}

/// One entry of `search/item`. Nutrient values are per serving.
#[derive(Debug, Deserialize, Clone)]
pub struct FoodDetails {
    pub food_name: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub serving_weight_grams: Option<f64>,
    #[serde(default)]
    pub nf_calories: Option<f64>,
    #[serde(default)]
    pub nf_total_fat: Option<f64>,
    #[serde(default)]
    pub nf_saturated_fat: Option<f64>,
    #[serde(default)]
    pub nf_cholesterol: Option<f64>,
    #[serde(default)]
    pub nf_total_carbohydrate: Option<f64>,
    #[serde(default)]
    pub nf_sugars: Option<f64>,
    #[serde(default)]
    pub nf_dietary_fiber: Option<f64>,
    #[serde(default)]
    pub nf_protein: Option<f64>,
    #[serde(default)]
    pub nf_sodium: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchItemResponse {
    #[serde(default)]
    pub foods: Vec<FoodDetails>,
}

impl From<BrandedFood> for CandidateSummary {
    fn from(food: BrandedFood) -> Self {
        let display_name = match food.brand_name {
            Some(brand) if !brand.is_empty() => format!("{} ({})", food.food_name, brand),
            _ => food.food_name,
        };
        CandidateSummary {
            display_name,
            external_id: food.nix_item_id,
        }
    }
}
