use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;
use thiserror::Error;

use super::endpoints::{
    CandidateSummary, FoodDetails, SearchInstantQuery, SearchInstantResponse, SearchItemQuery,
    SearchItemResponse, DEFAULT_APP_ID_ENV_VAR, DEFAULT_APP_KEY_ENV_VAR, NUTRITIONIX_BASE_URL,
    SEARCH_INSTANT_PATH, SEARCH_ITEM_PATH,
};
use crate::error::TrackerError;
use crate::nutrients::{NutrientField, NutrientVector};
use crate::products::ProductType;

/// Failures of the remote food database client.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Nutritionix credential not found in environment: {0}")]
    MissingCredentials(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("No food item with id {0}")]
    NotFound(String),
    #[error("Invalid food item: {0}")]
    InvalidItem(String),
}

/// Remote food database, as the tracker needs it.
#[async_trait]
pub trait FoodLookup: Send + Sync {
    async fn search_by_name(&self, query: &str) -> Result<Vec<CandidateSummary>, LookupError>;

    async fn details_by_id(&self, external_id: &str) -> Result<ProductType, LookupError>;
}

/// Looks up `external_id`, reading a missing item as "no candidate".
///
/// Any other failure is returned as is; it is never replaced by an empty
/// nutrient profile.
pub async fn resolve_candidate(
    lookup: &dyn FoodLookup,
    external_id: &str,
) -> Result<Option<ProductType>, LookupError> {
    match lookup.details_by_id(external_id).await {
        Ok(product_type) => Ok(Some(product_type)),
        Err(LookupError::NotFound(id)) => {
            tracing::info!(external_id = %id, "food item not found");
            Ok(None)
        }
        Err(err) => {
            tracing::warn!(external_id, error = %err, "food lookup failed");
            Err(err)
        }
    }
}

/// Like [`resolve_candidate`], for callers that need the item: a missing item
/// is [`TrackerError::NotFound`] and any other failure is
/// [`TrackerError::LookupUnavailable`].
pub async fn fetch_product_type(
    lookup: &dyn FoodLookup,
    external_id: &str,
) -> crate::Result<ProductType> {
    resolve_candidate(lookup, external_id)
        .await?
        .ok_or_else(|| TrackerError::not_found(format!("food item '{}'", external_id)))
}

/// Client for the Nutritionix v2 API. Credentials are read from the named
/// environment variables on every call.
#[derive(Debug, Clone)]
pub struct NutritionixClient {
    client: Client,
    base_url: String,
    app_id_env_var: String,
    app_key_env_var: String,
}

impl NutritionixClient {
    pub fn new(
        base_url: &str,
        app_id_env_var: &str,
        app_key_env_var: &str,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        dotenv().ok();
        let client = Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            app_id_env_var: app_id_env_var.to_string(),
            app_key_env_var: app_key_env_var.to_string(),
        })
    }

    pub fn with_defaults() -> Result<Self, LookupError> {
        Self::new(
            NUTRITIONIX_BASE_URL,
            DEFAULT_APP_ID_ENV_VAR,
            DEFAULT_APP_KEY_ENV_VAR,
            Duration::from_secs(10),
        )
    }

    fn credentials(&self) -> Result<(String, String), LookupError> {
        dotenv().ok();
        let app_id = env::var(&self.app_id_env_var)
            .map_err(|_| LookupError::MissingCredentials(self.app_id_env_var.clone()))?;
        let app_key = env::var(&self.app_key_env_var)
            .map_err(|_| LookupError::MissingCredentials(self.app_key_env_var.clone()))?;
        Ok((app_id, app_key))
    }

    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T, LookupError>
    where
        Q: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let (app_id, app_key) = self.credentials()?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "nutritionix request");

        let response = self
            .client
            .get(&url)
            .header("x-app-id", app_id)
            .header("x-app-key", app_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(LookupError::ApiError { status, error_body })
        }
    }
}

#[async_trait]
impl FoodLookup for NutritionixClient {
    async fn search_by_name(&self, query: &str) -> Result<Vec<CandidateSummary>, LookupError> {
        let params = SearchInstantQuery {
            query,
            branded: true,
            common: false,
        };
        let response: SearchInstantResponse = self.get_json(SEARCH_INSTANT_PATH, &params).await?;
        tracing::debug!(query, hits = response.branded.len(), "nutritionix search");
        Ok(response.branded.into_iter().map(CandidateSummary::from).collect())
    }

    async fn details_by_id(&self, external_id: &str) -> Result<ProductType, LookupError> {
        let params = SearchItemQuery {
            nix_item_id: external_id,
        };
        let response = match self
            .get_json::<_, SearchItemResponse>(SEARCH_ITEM_PATH, &params)
            .await
        {
            Err(LookupError::ApiError { status, .. }) if status == reqwest::StatusCode::NOT_FOUND => {
                return Err(LookupError::NotFound(external_id.to_string()));
            }
            other => other?,
        };
        let details = response
            .foods
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(external_id.to_string()))?;
        food_details_to_product_type(details)
    }
}

/// Converts per-serving Nutritionix values into a per-100g product type.
///
/// Without a usable serving weight the values are taken as reported.
pub fn food_details_to_product_type(details: FoodDetails) -> Result<ProductType, LookupError> {
    let per_serving = [
        (NutrientField::Calories, details.nf_calories),
        (NutrientField::TotalFat, details.nf_total_fat),
        (NutrientField::SaturatedFat, details.nf_saturated_fat),
        (NutrientField::Cholesterol, details.nf_cholesterol),
        (NutrientField::TotalCarbohydrate, details.nf_total_carbohydrate),
        (NutrientField::Sugars, details.nf_sugars),
        (NutrientField::DietaryFiber, details.nf_dietary_fiber),
        (NutrientField::Protein, details.nf_protein),
        (NutrientField::Sodium, details.nf_sodium),
    ];
    let scale = match details.serving_weight_grams {
        Some(grams) if grams.is_finite() && grams > 0.0 => 100.0 / grams,
        _ => 1.0,
    };

    let mut nutrients = NutrientVector::unknown();
    for (field, value) in per_serving {
        let value = value.map(|v| v * scale);
        nutrients
            .set(field, value)
            .map_err(|e| LookupError::InvalidItem(e.to_string()))?;
    }

    let name = match details.brand_name {
        Some(brand) if !brand.is_empty() => format!("{} ({})", details.food_name, brand),
        _ => details.food_name,
    };
    ProductType::new(name, nutrients).map_err(|e| LookupError::InvalidItem(e.to_string()))
}
