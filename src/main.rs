use anyhow::{bail, Result};
use feed_engine::{FeedEngine, FeedEvent};
use hashfeed_core::{time, AppConfig, Post};
use search_client::{AppCredentials, Authenticator, AvatarLoader, SearchClient, TokenStore};
use std::path::Path;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("hashfeed=info,feed_engine=info,search_client=info")
        .init();

    let Some(query) = std::env::args().nth(1) else {
        bail!("usage: hashfeed <hashtag>");
    };

    let config = load_config()?;
    tracing::info!("Starting Hashfeed - hashtag feed");

    let token_store = TokenStore::new();
    let authenticator = Authenticator::new(AppCredentials::from(&config), token_store.clone());
    authenticator.login().await?;

    let client = SearchClient::new(token_store, config.page_size);
    let (engine, mut events) = FeedEngine::new(
        client,
        Duration::from_secs(config.poll_interval_secs),
        config.page_size as usize,
    );
    engine.start_query(&query)?;

    let avatars = AvatarLoader::new();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    FeedEvent::TimelineUpdated(posts) => {
                        prefetch_avatars(&engine, &avatars, &posts);
                        render_timeline(&query, &posts);
                    }
                    FeedEvent::NewPostsAvailable(added) => {
                        println!("-- {added} new post(s) available --");
                    }
                    FeedEvent::LoadFailed(message) => {
                        eprintln!("Failed to load content: {message}");
                    }
                    FeedEvent::PollFailed(message) => {
                        eprintln!("Failed to load latest: {message}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                engine.shutdown();
                break;
            }
        }
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let config = match std::env::var("HASHFEED_CONFIG") {
        Ok(path) => AppConfig::load(Path::new(&path))?,
        Err(_) if Path::new("hashfeed.toml").exists() => {
            AppConfig::load(Path::new("hashfeed.toml"))?
        }
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Warm the engine's image cache for rows about to render; each miss is
/// fetched on its own task and inserted when it lands.
fn prefetch_avatars(engine: &FeedEngine<SearchClient>, avatars: &AvatarLoader, posts: &[Post]) {
    for post in posts {
        if post.image_url.is_empty() || engine.cached_image(post.id).is_some() {
            continue;
        }
        let engine = engine.clone();
        let avatars = avatars.clone();
        let (id, url) = (post.id, post.image_url.clone());
        tokio::spawn(async move {
            match avatars.fetch(&url).await {
                Ok(image) => engine.store_image(id, image),
                Err(e) => tracing::warn!(id, "avatar load failed: {e}"),
            }
        });
    }
}

fn render_timeline(query: &str, posts: &[Post]) {
    if posts.is_empty() {
        println!("No results for #{query}");
        return;
    }

    println!("== #{query} ({} posts) ==", posts.len());
    for post in posts {
        println!(
            "{} {} · {}",
            post.author_name,
            post.display_handle(),
            time::display_age_now(&post.created_at)
        );
        println!("  {}", post.body);
        println!(
            "  retweets: {}  favorites: {}",
            post.retweet_count, post.favorite_count
        );
    }
}
