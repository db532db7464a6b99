//! `hottake generate` - One-shot generation from the terminal.

use hottake_agent::{HotTakeRequest, HotTakeResult, Orchestrator, StreamEvent};
use hottake_config::AppConfig;
use std::io::Write;
use std::sync::Arc;

pub async fn run(request: HotTakeRequest, stream: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let orchestrator = Arc::new(Orchestrator::from_config(&config));

    if stream {
        run_streaming(&orchestrator, &request).await
    } else {
        let result = orchestrator
            .handle(&request)
            .await
            .map_err(|e| e.public_message())?;
        println!();
        println!("  {}", result.hot_take);
        print_footer(&result);
        Ok(())
    }
}

/// Print events as they arrive. Ctrl-C cancels the session; nothing is
/// cached for a cancelled run.
async fn run_streaming(
    orchestrator: &Arc<Orchestrator>,
    request: &HotTakeRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = orchestrator
        .handle_stream(request)
        .map_err(|e| e.public_message())?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    let mut started = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                session.cancel();
                eprintln!("\n  ⏹  Cancelled.");
                return Ok(());
            }
            event = session.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                match event {
                    StreamEvent::Status { message } => eprintln!("  ⏳ {message}"),
                    StreamEvent::Sources { sources } => {
                        if !sources.is_empty() {
                            eprintln!("  🔎 {} sources", sources.len());
                        }
                    }
                    StreamEvent::Token { text } => {
                        if !started {
                            print!("\n  ");
                            started = true;
                        }
                        print!("{text}");
                        stdout.flush()?;
                    }
                    StreamEvent::Done { result } => {
                        println!();
                        print_footer(&result);
                        return Ok(());
                    }
                    StreamEvent::Error { detail } => {
                        println!();
                        return Err(detail.into());
                    }
                }
            }
        }
    }
}

fn print_footer(result: &HotTakeResult) {
    println!();
    println!("  ({}, {})", result.agent_used, result.style);
    for (i, source) in result.sources.iter().enumerate() {
        println!("  [{}] {} - {}", i + 1, source.title, source.url);
    }
}
