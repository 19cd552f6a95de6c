use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::nutrients::NutrientField;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log eaten food and track nutrients against your limits", long_about = None)]
pub struct Cli {
    /// Directory holding the user data files (overrides NUTRI_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User whose data to work on
    #[arg(short, long, global = true, default_value = "newUser")]
    pub user: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List users with saved data
    Users,
    /// Show what was eaten on a day and the calorie total
    Day {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Log an amount of one of your custom products
    Eat {
        #[arg(short, long)]
        product: String,
        /// Grams eaten
        #[arg(short, long)]
        weight: f64,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Fetch a food by Nutritionix item id and log an amount of it
    EatRemote {
        #[arg(long)]
        id: String,
        /// Grams eaten
        #[arg(short, long)]
        weight: f64,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Remove an eaten product by its position in the day's list
    Uneat {
        #[arg(short, long)]
        index: usize,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Search the remote food database
    Search {
        query: String,
        /// Show details of the N-th result (1-based); may be repeated
        #[arg(long)]
        pick: Vec<usize>,
    },
    /// Manage custom products
    #[command(subcommand)]
    Products(ProductsCommand),
    /// Show or set body parameters
    Params(ParamsArgs),
    /// Set or clear a daily nutrient limit
    Limit {
        #[arg(short, long, value_parser = parse_nutrient)]
        nutrient: NutrientField,
        #[arg(short, long, conflicts_with = "clear", required_unless_present = "clear")]
        value: Option<f64>,
        #[arg(long)]
        clear: bool,
    },
    /// Daily totals of one nutrient over the last days
    History {
        #[arg(short, long, value_parser = parse_nutrient, default_value = "nf_calories")]
        nutrient: NutrientField,
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(3..=30))]
        days: u32,
        /// Also write the totals to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommand {
    List,
    Add {
        #[arg(short, long)]
        name: String,
        /// field=value per 100g, e.g. nf_protein=12.5; repeatable
        #[arg(long = "nutrient", value_parser = parse_nutrient_value)]
        nutrients: Vec<(NutrientField, f64)>,
    },
    Remove {
        #[arg(short, long)]
        index: usize,
    },
    /// Create a product out of weighted custom and remote products
    Combine {
        #[arg(short, long)]
        name: String,
        /// NAME:GRAMS of a custom product; repeatable
        #[arg(
            long = "ingredient",
            value_parser = parse_ingredient,
            required_unless_present = "remote_ingredients"
        )]
        ingredients: Vec<(String, f64)>,
        /// ID:GRAMS of a Nutritionix item; repeatable
        #[arg(long = "remote-ingredient", value_parser = parse_ingredient)]
        remote_ingredients: Vec<(String, f64)>,
    },
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[arg(long)]
    pub gender: Option<String>,
    /// Years
    #[arg(long)]
    pub age: Option<f64>,
    /// Centimetres
    #[arg(long)]
    pub height: Option<f64>,
    /// Kilograms
    #[arg(long)]
    pub weight: Option<f64>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_nutrient(s: &str) -> Result<NutrientField, String> {
    NutrientField::from_name(s).ok_or_else(|| {
        let known: Vec<&str> = NutrientField::ALL.iter().map(|f| f.name()).collect();
        format!("unknown nutrient '{}', expected one of: {}", s, known.join(", "))
    })
}

fn parse_nutrient_value(s: &str) -> Result<(NutrientField, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let field = parse_nutrient(name)?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for {}: {}", field, e))?;
    Ok((field, value))
}

fn parse_ingredient(s: &str) -> Result<(String, f64), String> {
    let (name, grams) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:GRAMS, got '{}'", s))?;
    let grams = grams
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad weight for '{}': {}", name, e))?;
    Ok((name.to_string(), grams))
}
