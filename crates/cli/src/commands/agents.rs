//! `hottake agents` - List generation agents.

use hottake_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = hottake_providers::build_from_config(&config);

    println!("🤖 Generation agents");
    println!("====================");
    println!();

    let agents = registry.list();
    if agents.is_empty() {
        println!("  No agents enabled. Check [agents.*] in your config.");
        return Ok(());
    }

    println!("  {:<10} {:<16} {:<26} Configured", "Id", "Name", "Model");
    for agent in agents {
        let configured = if agent.configured { "✅" } else { "❌ (no API key)" };
        println!(
            "  {:<10} {:<16} {:<26} {configured}",
            agent.id, agent.name, agent.model
        );
    }
    println!();
    println!("  Keys are read from OPENAI_API_KEY and ANTHROPIC_API_KEY,");
    println!("  or from api_key under [agents.openai] / [agents.anthropic].");

    Ok(())
}
