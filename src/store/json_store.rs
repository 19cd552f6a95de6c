use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{validate_username, UserRecord, UserStore};
use crate::error::{Result, TrackerError};

const USER_FILE_SUFFIX: &str = "_data.json";

/// Stores each user as `<dir>/<username>_data.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}{}", username, USER_FILE_SUFFIX))
    }
}

impl UserStore for JsonFileStore {
    fn load_user(&self, username: &str) -> Result<UserRecord> {
        validate_username(username)?;
        let path = self.user_path(username);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TrackerError::not_found(format!("user '{}'", username)));
            }
            Err(e) => return Err(e.into()),
        };
        let record: UserRecord = serde_json::from_str(&content)?;
        tracing::debug!(username, path = %path.display(), "loaded user data");
        Ok(record)
    }

    fn save_user(&self, record: &UserRecord) -> Result<()> {
        validate_username(&record.username)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.user_path(&record.username);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(username = %record.username, path = %path.display(), "saved user data");
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut users = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(username) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(USER_FILE_SUFFIX))
                .filter(|name| !name.is_empty())
            {
                users.push(username.to_string());
            }
        }
        users.sort();
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrients::{NutrientField, NutrientVector};
    use crate::products::{Product, ProductType};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sample_record() -> UserRecord {
        let mut record = UserRecord::empty("jedrzej");
        let egg = Arc::new(
            ProductType::new(
                "egg",
                NutrientVector::unknown()
                    .with(NutrientField::Calories, Some(155.0))
                    .unwrap()
                    .with(NutrientField::Sugars, Some(0.0))
                    .unwrap(),
            )
            .unwrap(),
        );
        record.custom_products.push(egg.clone());
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        record
            .history
            .entry(date)
            .or_default()
            .push(Product::new(egg, 60.0).unwrap());
        record.limits.set(NutrientField::Sodium, Some(2300.0)).unwrap();
        record
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let record = sample_record();

        store.save_user(&record).unwrap();
        let loaded = store.load_user("jedrzej").unwrap();
        assert_eq!(loaded, record);
        assert!(dir.path().join("jedrzej_data.json").exists());
        assert!(!dir.path().join("jedrzej_data.json.tmp").exists());
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let result = store.load_user("nobody");
        assert!(matches!(result, Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken_data.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.load_user("broken"),
            Err(TrackerError::Serialization(_))
        ));
    }

    #[test]
    fn test_list_users() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_user(&UserRecord::empty("zoe")).unwrap();
        store.save_user(&UserRecord::empty("adam")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        assert_eq!(store.list_users().unwrap(), vec!["adam", "zoe"]);
    }

    #[test]
    fn test_list_users_in_missing_dir() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("not-created-yet"));
        assert!(store.list_users().unwrap().is_empty());
    }
}
