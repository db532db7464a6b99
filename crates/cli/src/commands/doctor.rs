//! `hottake doctor` - Diagnose configuration, agents, search and cache.

use hottake_cache::{CacheStore, RedisStore};
use hottake_config::{AppConfig, CacheBackend};
use std::time::Duration;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 hottake doctor");
    println!("=================");
    println!();

    let mut issues = 0;

    // Config file
    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("✅ Config file: {}", config_path.display());
    } else {
        println!("⚠️  Config file not found: {} (using defaults)", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("✅ Config valid");
            config
        }
        Err(e) => {
            println!("❌ Config invalid: {e}");
            println!();
            println!("1 issue found.");
            return Ok(());
        }
    };

    // Agents
    let agents = hottake_providers::build_from_config(&config);
    if agents.has_configured() {
        for agent in agents.list() {
            let mark = if agent.configured { "✅" } else { "⚠️ " };
            println!("{mark} Agent {}: {} ({})", agent.id, agent.name, agent.model);
        }
    } else {
        println!("❌ No generation agent configured");
        println!("   Set OPENAI_API_KEY or ANTHROPIC_API_KEY");
        issues += 1;
    }

    // Search providers
    let search = hottake_search::build_from_config(&config.search);
    for (name, kind, configured) in search.providers() {
        if configured {
            println!("✅ Search {kind}: {name}");
        } else {
            println!("⚠️  Search {kind}: {name} has no API key (searches return nothing)");
        }
    }
    let weights = &config.search.weights;
    println!(
        "   Score weights: relevance {:.2}, recency {:.2}, snippet {:.2}, domain {:.2}",
        weights.relevance, weights.recency, weights.snippet, weights.domain
    );

    // Cache
    match (&config.cache.backend, &config.cache.redis_url) {
        (CacheBackend::None, _) => println!("⚠️  Variant cache disabled"),
        (CacheBackend::Memory, _) => println!(
            "✅ Variant cache: in-memory, pool of {}",
            config.cache.variant_pool_size
        ),
        (CacheBackend::Redis, None) => {
            println!("⚠️  Variant cache: redis selected but REDIS_URL is not set (disabled)")
        }
        (CacheBackend::Redis, Some(url)) => {
            let timeout = Duration::from_millis(config.cache.op_timeout_ms.max(1_000));
            match probe_redis(url, timeout).await {
                Ok(()) => println!(
                    "✅ Variant cache: redis reachable, pool of {}",
                    config.cache.variant_pool_size
                ),
                Err(e) => {
                    println!("❌ Variant cache: redis unreachable ({e})");
                    issues += 1;
                }
            }
        }
    }

    // Gateway
    println!(
        "✅ Gateway: {}:{}, {} req/min per client",
        config.gateway.host, config.gateway.port, config.gateway.rate_limit_per_minute
    );

    println!();
    if issues == 0 {
        println!("All checks passed.");
    } else {
        println!("{issues} issue(s) found.");
    }

    Ok(())
}

async fn probe_redis(url: &str, timeout: Duration) -> Result<(), hottake_core::error::CacheError> {
    let store = RedisStore::open(url, timeout)?;
    store.members("hot_take:doctor:probe").await.map(|_| ())
}
