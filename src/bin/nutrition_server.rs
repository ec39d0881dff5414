// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Nutrition Server Binary
//!
//! Serves the nutrition HTTP API together with the health endpoints.

use anyhow::Result;
use clap::Parser;
use nutrition_engine::{
    config::{NutritionConfig, ServerConfig},
    database::Database,
    diet_plan::DietPlanService,
    health::{self, HealthChecker},
    intelligence::NutritionCalculator,
    logging,
    routes::{self, NutritionRoutes},
};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "nutrition-server")]
#[command(about = "HTTP API for nutrition calculations, body-fat estimates and diet plans")]
pub struct Args {
    /// Port to listen on; overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Server configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Nutrition formula configuration file path
    #[arg(short, long)]
    nutrition_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_from_env()?;

    let args = Args::parse();

    let mut config = ServerConfig::load(args.config)?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    let nutrition_config =
        NutritionConfig::load(args.nutrition_config.or(config.nutrition_config_path.clone()))?;
    info!("Nutrition configuration loaded");

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized: {}", config.database_url);

    let timeout = Duration::from_secs(config.diet_backend_timeout_secs);
    let mut diet_plans = DietPlanService::new(NutritionCalculator::new(nutrition_config.clone()));
    let mut health_checker = HealthChecker::new(database, nutrition_config);

    if let Some(backend) = config.diet_backend()? {
        info!("Diet plan backend: {}", backend);
        diet_plans = diet_plans.with_backend(backend.clone(), timeout)?;
        health_checker = health_checker.with_diet_backend(backend, timeout);
    } else {
        info!("No diet plan backend configured, plans are generated locally");
    }

    let filter = routes::server_routes(
        NutritionRoutes::new(diet_plans),
        health::middleware::routes(health_checker),
    );

    info!("Nutrition server listening on port {}", config.http_port);
    warp::serve(filter).run(([0, 0, 0, 0], config.http_port)).await;

    Ok(())
}
