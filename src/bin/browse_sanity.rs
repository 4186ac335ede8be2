//! Small sanity run of the browsing state machine
//!
//! Without arguments it runs against an in-memory catalog. With `--live` it
//! loads the configuration (file at `--config <path>` or the per-user file,
//! plus `MEDEQUIP__*` overrides) and queries the configured dataset.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use medequip_storefront_lib::application::{StorefrontGateway, StorefrontSession};
use medequip_storefront_lib::domain::{FilterCriteria, RouteSlug};
use medequip_storefront_lib::infrastructure::config::{AppConfig, BrowsingConfig, ConfigManager};
use medequip_storefront_lib::infrastructure::logging::init_logging_with_config;
use medequip_storefront_lib::infrastructure::SanityGateway;
use medequip_storefront_lib::test_utils::{InMemoryStorefront, fixtures};

async fn exercise<G: StorefrontGateway>(session: &StorefrontSession<G>) -> Result<()> {
    let page = session.open_products(&RouteSlug::None).await?;
    println!("📋 {} - {}", page.heading.title, page.heading.description);

    let products = &session.products;
    println!(
        "   {} products, {} page(s)",
        products.displayed_len().await,
        products.total_pages().await
    );

    for query in ["ge", "portable monitor", ""] {
        let outcome = products.search(query, None).await?;
        println!(
            "🔍 search {:?}: {:?} -> {} shown",
            query,
            outcome,
            products.displayed_len().await
        );
    }

    let filtered = products
        .apply_filters(&FilterCriteria::new().departments(["imaging"]))
        .await?;
    println!("🧰 department=imaging: {:?}", filtered);

    if products.total_pages().await > 1 {
        products.set_page(2).await;
        println!("📄 page 2 holds {} item(s)", products.displayed_slice().await.len());
    }

    let options = session.filter_options().await?;
    println!(
        "🏷️  {} department and {} brand filter options",
        options.departments.len(),
        options.brands.len()
    );
    Ok(())
}

fn config_path_arg(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--live") {
        let config = match config_path_arg(&args) {
            Some(path) => AppConfig::load(Some(path.as_path()))?,
            None => ConfigManager::new()?.load_config().await?,
        };
        init_logging_with_config(&config.logging)?;

        let gateway = SanityGateway::new(&config.gateway).context("Failed to build gateway")?;
        println!("🌐 Live run against {}", gateway.endpoint());
        let session = StorefrontSession::new(Arc::new(gateway), &config.browsing);
        return exercise(&session).await;
    }

    init_logging_with_config(&AppConfig::default().logging)?;
    let store = InMemoryStorefront::new(
        fixtures::products(14),
        fixtures::brands(),
        fixtures::blog_posts(),
    )
    .with_departments(fixtures::departments())
    .with_department_count("imaging", 5)
    .with_brand_count("brand-ge", 3);

    let session = StorefrontSession::new(Arc::new(store), &BrowsingConfig::default());
    exercise(&session).await?;

    let gateway = session.gateway();
    println!(
        "✅ In-memory run finished: {} product gateway call(s)",
        gateway.products.total_calls()
    );
    Ok(())
}
