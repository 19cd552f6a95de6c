pub mod connection;
pub mod endpoints;

pub use connection::{fetch_product_type, resolve_candidate, FoodLookup, LookupError, NutritionixClient};
pub use endpoints::CandidateSummary;
