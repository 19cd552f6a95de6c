use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

use nutri_log::aggregator::combine;
use nutri_log::api_connection::{
    fetch_product_type, resolve_candidate, FoodLookup, NutritionixClient,
};
use nutri_log::cli::{parse_args, Command, ParamsArgs, ProductsCommand};
use nutri_log::config::AppConfig;
use nutri_log::history::nutrient_history;
use nutri_log::metabolism::{Gender, PhysicalParams};
use nutri_log::nutrients::{NutrientField, NutrientVector};
use nutri_log::products::{Product, ProductType};
use nutri_log::session::RecentProducts;
use nutri_log::store::{JsonFileStore, UserStore};
use nutri_log::user::User;

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "nutri_log=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_product_type(product_type: &ProductType) {
    println!("{}", product_type.name);
    for (field, value) in product_type.nutrients.iter() {
        match value {
            Some(v) => println!("  {:<24} {:>10.2} {}/100g", field.name(), v, field.unit()),
            None => println!("  {:<24} {:>10}", field.name(), "unknown"),
        }
    }
}

fn print_day<S: UserStore>(user: &User<S>, date: NaiveDate) {
    let eaten = user.eaten_on(date);
    println!("{} on {}:", user.username(), date);
    if eaten.is_empty() {
        println!("  (nothing logged)");
    }
    for (idx, product) in eaten.iter().enumerate() {
        println!("  [{}] {}", idx, product);
    }
    println!("Calories: {}", user.count_nutrient(NutrientField::Calories, date));
}

fn nutrient_vector_from_args(values: &[(NutrientField, f64)]) -> Result<NutrientVector> {
    let mut nutrients = NutrientVector::unknown();
    for (field, value) in values {
        nutrients.set(*field, Some(*value))?;
    }
    Ok(nutrients)
}

fn lookup_client(config: &AppConfig) -> Result<NutritionixClient> {
    NutritionixClient::new(
        &config.lookup.base_url,
        &config.lookup.app_id_env_var,
        &config.lookup.app_key_env_var,
        config.lookup.timeout,
    )
    .map_err(|e| anyhow!("Failed to build Nutritionix client: {}", e))
}

async fn search(config: &AppConfig, query: &str, picks: &[usize]) -> Result<()> {
    let client = lookup_client(config)?;
    let candidates = client
        .search_by_name(query)
        .await
        .map_err(|e| anyhow!("Search for '{}' failed: {}", query, e))?;

    if candidates.is_empty() {
        println!("No products found for '{}'", query);
        return Ok(());
    }
    println!("Search results:");
    for (idx, candidate) in candidates.iter().enumerate() {
        println!("  {:>2}. {}  [id {}]", idx + 1, candidate.display_name, candidate.external_id);
    }

    let mut recent = RecentProducts::with_capacity(config.recent_limit);
    for &pick in picks {
        let candidate = pick
            .checked_sub(1)
            .and_then(|idx| candidates.get(idx))
            .ok_or_else(|| anyhow!("No result number {} (have {})", pick, candidates.len()))?;
        match resolve_candidate(&client, &candidate.external_id).await {
            Ok(Some(product_type)) => {
                println!();
                print_product_type(&product_type);
                recent.push(Arc::new(product_type));
            }
            Ok(None) => println!("No details available for '{}'", candidate.display_name),
            Err(e) => eprintln!("Lookup of '{}' failed: {}", candidate.display_name, e),
        }
    }

    if !recent.is_empty() {
        println!("\nRecent products:");
        for product_type in recent.iter() {
            println!("  {}", product_type.name);
        }
    }
    Ok(())
}

fn update_params<S: UserStore>(user: &mut User<S>, args: &ParamsArgs) -> Result<()> {
    let changed = args.gender.is_some()
        || args.age.is_some()
        || args.height.is_some()
        || args.weight.is_some();
    if changed {
        let mut params: PhysicalParams = user.params();
        if let Some(gender) = &args.gender {
            params.gender = Some(gender.parse::<Gender>()?);
        }
        params.age = args.age.unwrap_or(params.age);
        params.height = args.height.unwrap_or(params.height);
        params.weight = args.weight.unwrap_or(params.weight);
        user.set_params(params)?;
    }

    let params = user.params();
    match params.gender {
        Some(gender) => println!("Gender: {}", gender),
        None => println!("Gender: not set"),
    }
    println!("Age:    {} years", params.age);
    println!("Height: {} cm", params.height);
    println!("Weight: {} kg", params.weight);
    match user.metabolic_estimate() {
        Some(ppm) => println!("Estimated daily requirement: {:.2} kcal", ppm),
        None => println!("Estimated daily requirement: undetermined"),
    }
    Ok(())
}

async fn products<S: UserStore>(
    config: &AppConfig,
    user: &mut User<S>,
    command: ProductsCommand,
) -> Result<()> {
    match command {
        ProductsCommand::List => {
            if user.custom_products().is_empty() {
                println!("No custom products yet");
            }
            for (idx, product_type) in user.custom_products().iter().enumerate() {
                print!("[{}] ", idx);
                print_product_type(product_type);
            }
        }
        ProductsCommand::Add { name, nutrients } => {
            let nutrients = nutrient_vector_from_args(&nutrients)?;
            let created = user.create_custom_product(&name, nutrients)?;
            println!("Added custom product '{}'", created.name);
        }
        ProductsCommand::Remove { index } => {
            let removed = user.remove_custom_product(index)?;
            println!("Removed custom product '{}'", removed.name);
        }
        ProductsCommand::Combine {
            name,
            ingredients,
            remote_ingredients,
        } => {
            let mut records = Vec::with_capacity(ingredients.len() + remote_ingredients.len());
            for (ingredient, grams) in ingredients {
                let product_type = user
                    .find_custom_product(&ingredient)
                    .ok_or_else(|| anyhow!("No custom product named '{}'", ingredient))?;
                records.push(Product::new(product_type, grams)?);
            }
            if !remote_ingredients.is_empty() {
                let client = lookup_client(config)?;
                for (id, grams) in remote_ingredients {
                    let product_type = fetch_product_type(&client, &id)
                        .await
                        .with_context(|| format!("Remote ingredient {} is not usable", id))?;
                    records.push(Product::new(Arc::new(product_type), grams)?);
                }
            }
            let combined = combine(&name, &records)?;
            print_product_type(&combined);
            user.add_custom_product(combined)?;
        }
    }
    Ok(())
}

async fn run(config: AppConfig, cli_user: &str, command: Command) -> Result<()> {
    let store = JsonFileStore::new(&config.data_dir);

    if let Command::Users = command {
        let users = store.list_users().context("Failed to list users")?;
        if users.is_empty() {
            println!("No saved users in {}", store.dir().display());
        }
        for username in users {
            println!("{}", username);
        }
        return Ok(());
    }
    if let Command::Search { query, pick } = &command {
        return search(&config, query, pick).await;
    }

    let mut user = User::open(store, cli_user)
        .with_context(|| format!("Failed to open user '{}'", cli_user))?;

    match command {
        Command::Users | Command::Search { .. } => {}
        Command::Day { date } => print_day(&user, date.unwrap_or_else(today)),
        Command::Eat { product, weight, date } => {
            let date = date.unwrap_or_else(today);
            let product_type = user
                .find_custom_product(&product)
                .ok_or_else(|| anyhow!("No custom product named '{}'", product))?;
            user.eat(date, product_type, weight)?;
            print_day(&user, date);
        }
        Command::EatRemote { id, weight, date } => {
            let date = date.unwrap_or_else(today);
            let client = lookup_client(&config)?;
            let product_type = fetch_product_type(&client, &id)
                .await
                .with_context(|| format!("Lookup of item {} failed", id))?;
            user.eat(date, Arc::new(product_type), weight)?;
            print_day(&user, date);
        }
        Command::Uneat { index, date } => {
            let date = date.unwrap_or_else(today);
            let removed = user.remove_eaten(date, index)?;
            println!("Removed {}", removed);
            print_day(&user, date);
        }
        Command::Products(products_command) => {
            products(&config, &mut user, products_command).await?
        }
        Command::Params(args) => update_params(&mut user, &args)?,
        Command::Limit { nutrient, value, clear } => {
            let value = if clear { None } else { value };
            user.set_limit(nutrient, value)?;
            match value {
                Some(v) => println!("Limit for {} set to {} {}", nutrient, v, nutrient.unit()),
                None => println!("Limit for {} cleared", nutrient),
            }
        }
        Command::History { nutrient, days, csv } => {
            let history = nutrient_history(&user, nutrient, today(), days)?;
            println!("{} over the last {} days:", nutrient.label(), days);
            for point in &history.points {
                println!("  {} ({:>2} days ago)  {}", point.date, point.days_ago, point.total);
            }
            if let Some(limit) = history.limit {
                println!("Limit: {:.2} {} (exceeded on {} days)", limit, nutrient.unit(), history.days_over_limit());
            }
            if let Some(ppm) = history.metabolic_reference {
                println!("Estimated daily requirement: {:.2} kcal", ppm);
            }
            if let Some(path) = csv {
                history
                    .export_csv(&path)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli_args = parse_args();
    let mut config = AppConfig::from_env();
    if let Some(dir) = cli_args.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), user = %cli_args.user, "starting");

    run(config, &cli_args.user, cli_args.command).await
}
