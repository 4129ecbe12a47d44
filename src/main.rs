//! Folio - content service bootstrap
//!
//! Prepares a deployment: loads configuration, connects to the database,
//! applies pending migrations and makes sure every configured emailing list
//! exists.

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::{
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            PostRepository, SqlxCategoryRepository, SqlxEmailingListRepository, SqlxPostRepository,
        },
        DatabasePool,
    },
    models::{ListParams, PostFilter},
    services::{CategoryService, EmailingListService, PostService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Folio {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create every configured emailing list up front
    let emailing = EmailingListService::new(
        SqlxEmailingListRepository::boxed(pool.clone()),
        config.emailing.clone(),
    );
    for choice in &config.emailing.lists {
        let list = emailing.emailing_list_factory(&choice.name).await?;
        let subscribers = emailing.get_emails_list(&list)?.len();
        tracing::info!(
            "Emailing list '{}' ready with {} subscriber(s)",
            emailing.label(&list),
            subscribers
        );
    }

    let posts = SqlxPostRepository::boxed(pool.clone());
    let categories = CategoryService::new(SqlxCategoryRepository::boxed(pool.clone()), posts.clone());
    for category in categories.list().await? {
        let count = posts
            .count(None, &PostFilter::new().with_category(category.id))
            .await?;
        tracing::info!("Category '{}': {} post(s)", category, count);
    }

    let cache = create_cache(&config.cache);
    let post_service = PostService::new(posts, cache)
        .with_cache_ttl(Duration::from_secs(config.cache.ttl_seconds));
    let published = post_service
        .list_paged(false, &PostFilter::default(), &ListParams::new(1, 1))
        .await?;
    tracing::info!("{} published post(s)", published.total);

    pool.close().await;
    tracing::info!("Folio is ready");
    Ok(())
}
