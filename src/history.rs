use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::aggregator::NutrientTotal;
use crate::error::{Result, TrackerError};
use crate::nutrients::NutrientField;
use crate::store::UserStore;
use crate::user::User;

/// Longest window [`nutrient_history`] accepts.
pub const MAX_HISTORY_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub days_ago: u32,
    pub total: NutrientTotal,
}

/// Daily totals of one nutrient, oldest day first, with the reference lines
/// to compare them against.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientHistory {
    pub field: NutrientField,
    pub points: Vec<DailyPoint>,
    pub limit: Option<f64>,
    /// Metabolic estimate; only set for calories.
    pub metabolic_reference: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    days_ago: u32,
    nutrient: &'a str,
    total: f64,
    unit: &'a str,
    complete: bool,
}

/// Collects `days` daily totals ending with `end`.
pub fn nutrient_history<S: UserStore>(
    user: &User<S>,
    field: NutrientField,
    end: NaiveDate,
    days: u32,
) -> Result<NutrientHistory> {
    if days == 0 || days > MAX_HISTORY_DAYS {
        return Err(TrackerError::invalid(format!(
            "history covers 1 to {} days, got {}",
            MAX_HISTORY_DAYS, days
        )));
    }

    let mut points = Vec::with_capacity(days as usize);
    for days_ago in (0..days).rev() {
        let date = end
            .checked_sub_days(Days::new(u64::from(days_ago)))
            .ok_or_else(|| TrackerError::invalid(format!("{} days before {} is out of range", days_ago, end)))?;
        points.push(DailyPoint {
            date,
            days_ago,
            total: user.count_nutrient(field, date),
        });
    }

    let metabolic_reference = match field {
        NutrientField::Calories => user.metabolic_estimate(),
        _ => None,
    };

    Ok(NutrientHistory {
        field,
        points,
        limit: user.limits().get(field),
        metabolic_reference,
    })
}

impl NutrientHistory {
    pub fn days_over_limit(&self) -> usize {
        match self.limit {
            Some(limit) => self.points.iter().filter(|p| p.total.total > limit).count(),
            None => 0,
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for point in &self.points {
            wtr.serialize(CsvRow {
                date: point.date.to_string(),
                days_ago: point.days_ago,
                nutrient: self.field.name(),
                total: point.total.total,
                unit: self.field.unit(),
                complete: point.total.complete,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)?;
        tracing::info!(path = %path.display(), rows = self.points.len(), "exported nutrient history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolism::{Gender, PhysicalParams};
    use crate::nutrients::NutrientVector;
    use crate::store::JsonFileStore;
    use tempfile::tempdir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn user_with_meals(dir: &Path) -> User<JsonFileStore> {
        let mut user = User::open(JsonFileStore::new(dir), "anna").unwrap();
        let soup = user
            .create_custom_product(
                "soup",
                NutrientVector::unknown()
                    .with(NutrientField::Calories, Some(80.0))
                    .unwrap(),
            )
            .unwrap();
        let mystery = user
            .create_custom_product("mystery", NutrientVector::unknown())
            .unwrap();
        user.eat(date(8), soup.clone(), 500.0).unwrap();
        user.eat(date(10), soup, 250.0).unwrap();
        user.eat(date(10), mystery, 100.0).unwrap();
        user
    }

    #[test]
    fn test_history_is_ordered_and_fills_empty_days() {
        let dir = tempdir().unwrap();
        let user = user_with_meals(dir.path());

        let history = nutrient_history(&user, NutrientField::Calories, date(10), 4).unwrap();
        let dates: Vec<NaiveDate> = history.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(7), date(8), date(9), date(10)]);
        assert_eq!(history.points[0].days_ago, 3);

        assert_eq!(history.points[0].total.total, 0.0);
        assert!(history.points[0].total.complete);
        assert!((history.points[1].total.total - 400.0).abs() < 1e-9);
        assert!((history.points[3].total.total - 200.0).abs() < 1e-9);
        assert!(!history.points[3].total.complete);
    }

    #[test]
    fn test_reference_lines() {
        let dir = tempdir().unwrap();
        let mut user = user_with_meals(dir.path());
        user.set_limit(NutrientField::Calories, Some(300.0)).unwrap();
        user.set_params(PhysicalParams {
            gender: Some(Gender::Female),
            age: 40.0,
            height: 170.0,
            weight: 65.0,
        })
        .unwrap();

        let calories = nutrient_history(&user, NutrientField::Calories, date(10), 3).unwrap();
        assert_eq!(calories.limit, Some(300.0));
        assert!(calories.metabolic_reference.is_some());
        assert_eq!(calories.days_over_limit(), 1);

        let protein = nutrient_history(&user, NutrientField::Protein, date(10), 3).unwrap();
        assert_eq!(protein.limit, None);
        assert_eq!(protein.metabolic_reference, None);
        assert_eq!(protein.days_over_limit(), 0);
    }

    #[test]
    fn test_zero_days_rejected() {
        let dir = tempdir().unwrap();
        let user = user_with_meals(dir.path());
        assert!(nutrient_history(&user, NutrientField::Calories, date(10), 0).is_err());
    }

    #[test]
    fn test_window_is_capped() {
        let dir = tempdir().unwrap();
        let user = user_with_meals(dir.path());
        assert!(matches!(
            nutrient_history(&user, NutrientField::Calories, date(10), u32::MAX),
            Err(TrackerError::InvalidInput(_))
        ));
        let year = nutrient_history(&user, NutrientField::Calories, date(10), MAX_HISTORY_DAYS).unwrap();
        assert_eq!(year.points.len(), MAX_HISTORY_DAYS as usize);
        assert_eq!(year.points.last().map(|p| p.date), Some(date(10)));
    }

    #[test]
    fn test_csv_export() {
        let dir = tempdir().unwrap();
        let user = user_with_meals(dir.path());
        let history = nutrient_history(&user, NutrientField::Calories, date(10), 2).unwrap();

        let mut buf = Vec::new();
        history.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,days_ago,nutrient,total,unit,complete");
        assert_eq!(lines[1], "2024-06-09,1,nf_calories,0.0,kcal,true");
        assert_eq!(lines[2], "2024-06-10,0,nf_calories,200.0,kcal,false");
    }
}
