//! `hottake serve` - Start the HTTP API server.

use hottake_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🔥 hottake gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Cache:     {:?}", config.cache.backend);
    println!("   Rate limit: {}/min per client", config.gateway.rate_limit_per_minute);

    hottake_gateway::start(config).await?;

    Ok(())
}
