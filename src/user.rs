use chrono::NaiveDate;
use std::sync::Arc;

use crate::aggregator::{sum_nutrient, NutrientTotal};
use crate::error::{Result, TrackerError};
use crate::metabolism::PhysicalParams;
use crate::nutrients::{NutrientField, NutrientVector};
use crate::products::{Product, ProductType};
use crate::store::{validate_username, UserRecord, UserStore};

/// An open user session. Every mutation is written through to the store and
/// only kept once the store accepted it.
///
/// Readers get owned copies or indices, never references into the stored
/// lists, so display code cannot change history behind the store's back.
pub struct User<S: UserStore> {
    store: S,
    record: UserRecord,
}

impl<S: UserStore> User<S> {
    /// Loads `username`, or starts an empty record when nothing is stored yet.
    pub fn open(store: S, username: &str) -> Result<Self> {
        validate_username(username)?;
        let record = match store.load_user(username) {
            Ok(record) => record,
            Err(TrackerError::NotFound(_)) => {
                tracing::info!(username, "no stored data, starting a new user");
                UserRecord::empty(username)
            }
            Err(e) => return Err(e),
        };
        Ok(Self { store, record })
    }

    pub fn username(&self) -> &str {
        &self.record.username
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    pub fn save(&self) -> Result<()> {
        self.store.save_user(&self.record)
    }

    /// Saves `record` and makes it current; on failure the session is unchanged.
    fn commit(&mut self, record: UserRecord) -> Result<()> {
        self.store.save_user(&record)?;
        self.record = record;
        Ok(())
    }

    // Custom products are the ones created and described by the user.

    pub fn custom_products(&self) -> &[Arc<ProductType>] {
        &self.record.custom_products
    }

    pub fn find_custom_product(&self, name: &str) -> Option<Arc<ProductType>> {
        self.record
            .custom_products
            .iter()
            .find(|product| product.name == name)
            .cloned()
    }

    pub fn add_custom_product(&mut self, product_type: ProductType) -> Result<Arc<ProductType>> {
        let product_type = Arc::new(product_type);
        let mut record = self.record.clone();
        record.custom_products.push(product_type.clone());
        self.commit(record)?;
        tracing::info!(username = %self.record.username, product = %product_type.name, "added custom product");
        Ok(product_type)
    }

    pub fn create_custom_product(
        &mut self,
        name: &str,
        nutrients: NutrientVector,
    ) -> Result<Arc<ProductType>> {
        self.add_custom_product(ProductType::new(name, nutrients)?)
    }

    pub fn remove_custom_product(&mut self, index: usize) -> Result<Arc<ProductType>> {
        if index >= self.record.custom_products.len() {
            return Err(TrackerError::not_found(format!(
                "custom product #{} (have {})",
                index,
                self.record.custom_products.len()
            )));
        }
        let mut record = self.record.clone();
        let removed = record.custom_products.remove(index);
        self.commit(record)?;
        tracing::info!(username = %self.record.username, product = %removed.name, "removed custom product");
        Ok(removed)
    }

    // Eaten products, keyed by the day they were eaten.

    /// Copy of the records for `date`, in insertion order. Empty if none.
    pub fn eaten_on(&self, date: NaiveDate) -> Vec<Product> {
        self.record.history.get(&date).cloned().unwrap_or_default()
    }

    pub fn add_eaten(&mut self, date: NaiveDate, product: Product) -> Result<()> {
        let mut record = self.record.clone();
        record.history.entry(date).or_default().push(product.clone());
        self.commit(record)?;
        tracing::info!(username = %self.record.username, %date, %product, "logged eaten product");
        Ok(())
    }

    pub fn eat(
        &mut self,
        date: NaiveDate,
        product_type: Arc<ProductType>,
        weight: f64,
    ) -> Result<Product> {
        let product = Product::new(product_type, weight)?;
        self.add_eaten(date, product.clone())?;
        Ok(product)
    }

    pub fn remove_eaten(&mut self, date: NaiveDate, index: usize) -> Result<Product> {
        let mut record = self.record.clone();
        let day = match record.history.get_mut(&date) {
            Some(day) if index < day.len() => day,
            _ => {
                return Err(TrackerError::not_found(format!(
                    "eaten product #{} on {}",
                    index, date
                )))
            }
        };
        let removed = day.remove(index);
        if day.is_empty() {
            record.history.remove(&date);
        }
        self.commit(record)?;
        tracing::info!(username = %self.record.username, %date, product = %removed, "removed eaten product");
        Ok(removed)
    }

    /// Amount of `field` eaten on `date`, with the completeness flag.
    pub fn count_nutrient(&self, field: NutrientField, date: NaiveDate) -> NutrientTotal {
        match self.record.history.get(&date) {
            Some(day) => sum_nutrient(field, day),
            None => sum_nutrient(field, &[]),
        }
    }

    // Body parameters and limits.

    pub fn params(&self) -> PhysicalParams {
        self.record.params
    }

    pub fn set_params(&mut self, params: PhysicalParams) -> Result<()> {
        let mut record = self.record.clone();
        record.params = params;
        self.commit(record)
    }

    pub fn metabolic_estimate(&self) -> Option<f64> {
        self.record.params.metabolic_estimate()
    }

    pub fn limits(&self) -> &NutrientVector {
        &self.record.limits
    }

    pub fn set_limit(&mut self, field: NutrientField, value: Option<f64>) -> Result<()> {
        let mut record = self.record.clone();
        record.limits.set(field, value)?;
        self.commit(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use tempfile::tempdir;

    /// Loads nothing and refuses every write.
    struct ReadOnlyStore;

    impl UserStore for ReadOnlyStore {
        fn load_user(&self, username: &str) -> Result<UserRecord> {
            Err(TrackerError::not_found(username))
        }

        fn save_user(&self, _record: &UserRecord) -> Result<()> {
            Err(TrackerError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn list_users(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn calories(per_100g: Option<f64>) -> NutrientVector {
        NutrientVector::unknown()
            .with(NutrientField::Calories, per_100g)
            .unwrap()
    }

    #[test]
    fn test_open_unknown_user_starts_empty() {
        let dir = tempdir().unwrap();
        let user = User::open(JsonFileStore::new(dir.path()), "newUser").unwrap();
        assert_eq!(user.username(), "newUser");
        assert!(user.custom_products().is_empty());
        assert!(user.eaten_on(day(1)).is_empty());
        assert!(user.limits().is_all_unknown());
        // nothing written until the first change
        assert!(!dir.path().join("newUser_data.json").exists());
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = tempdir().unwrap();
        {
            let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
            let bread = user.create_custom_product("bread", calories(Some(250.0))).unwrap();
            user.eat(day(2), bread, 80.0).unwrap();
            user.set_limit(NutrientField::Calories, Some(2000.0)).unwrap();
        }
        let user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        assert_eq!(user.custom_products().len(), 1);
        assert_eq!(user.eaten_on(day(2)).len(), 1);
        assert_eq!(user.limits().get(NutrientField::Calories), Some(2000.0));
        let total = user.count_nutrient(NutrientField::Calories, day(2));
        assert!((total.total - 200.0).abs() < 1e-9);
        assert!(total.complete);
    }

    #[test]
    fn test_eaten_on_returns_a_copy() {
        let dir = tempdir().unwrap();
        let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        let apple = user.create_custom_product("apple", calories(Some(52.0))).unwrap();
        user.eat(day(3), apple, 150.0).unwrap();

        let mut copy = user.eaten_on(day(3));
        copy.clear();
        assert_eq!(user.eaten_on(day(3)).len(), 1);
    }

    #[test]
    fn test_remove_eaten_by_index() {
        let dir = tempdir().unwrap();
        let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        let apple = user.create_custom_product("apple", calories(Some(52.0))).unwrap();
        let pear = user.create_custom_product("pear", calories(None)).unwrap();
        user.eat(day(4), apple, 100.0).unwrap();
        user.eat(day(4), pear, 100.0).unwrap();

        let partial = user.count_nutrient(NutrientField::Calories, day(4));
        assert!(!partial.complete);

        let removed = user.remove_eaten(day(4), 1).unwrap();
        assert_eq!(removed.product_type().name, "pear");
        assert!(user.count_nutrient(NutrientField::Calories, day(4)).complete);

        assert!(matches!(
            user.remove_eaten(day(4), 5),
            Err(TrackerError::NotFound(_))
        ));
        assert!(matches!(
            user.remove_eaten(day(9), 0),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_custom_product_out_of_range() {
        let dir = tempdir().unwrap();
        let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        assert!(matches!(
            user.remove_custom_product(0),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let dir = tempdir().unwrap();
        let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        assert!(user.create_custom_product("", calories(None)).is_err());
        let apple = user.create_custom_product("apple", calories(Some(52.0))).unwrap();
        assert!(matches!(
            user.eat(day(5), apple, 0.0),
            Err(TrackerError::InvalidInput(_))
        ));
        assert!(user.eaten_on(day(5)).is_empty());
    }

    #[test]
    fn test_failed_save_leaves_session_unchanged() {
        let mut user = User::open(ReadOnlyStore, "anna").unwrap();
        let apple = Arc::new(ProductType::new("apple", calories(Some(52.0))).unwrap());

        assert!(user
            .add_custom_product(ProductType::new("apple", calories(Some(52.0))).unwrap())
            .is_err());
        assert!(user.custom_products().is_empty());

        assert!(user.eat(day(6), apple, 100.0).is_err());
        assert!(user.eaten_on(day(6)).is_empty());

        assert!(user.set_limit(NutrientField::Calories, Some(1800.0)).is_err());
        assert!(user.limits().is_all_unknown());

        let params = PhysicalParams {
            age: 30.0,
            ..PhysicalParams::default()
        };
        assert!(user.set_params(params).is_err());
        assert_eq!(user.params(), PhysicalParams::default());

        assert_eq!(user.record(), &UserRecord::empty("anna"));
    }

    #[test]
    fn test_failed_removal_keeps_the_entry() {
        let dir = tempdir().unwrap();
        let mut user = User::open(JsonFileStore::new(dir.path()), "anna").unwrap();
        let apple = user.create_custom_product("apple", calories(Some(52.0))).unwrap();
        user.eat(day(7), apple, 100.0).unwrap();

        // same record, now behind a store that rejects writes
        let mut stuck = User {
            store: ReadOnlyStore,
            record: user.record().clone(),
        };
        assert!(stuck.remove_eaten(day(7), 0).is_err());
        assert_eq!(stuck.eaten_on(day(7)).len(), 1);
        assert!(stuck.remove_custom_product(0).is_err());
        assert_eq!(stuck.custom_products().len(), 1);
    }
}
