use coach_providers::{ProviderId, ProviderManager, Settings};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: provider_status [--test <provider> | --prompt <text>]";

#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Test(ProviderId),
    Generate(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = parse_command(std::env::args().skip(1).collect())?;
    let settings = Settings::from_env()?;

    let manager = ProviderManager::new();
    manager.configure_from_env(&settings).await;
    manager.initialize().await;

    let output = match command {
        Command::Status => serde_json::to_value(manager.status_report().await)?,
        Command::Test(provider) => match manager.test_provider(provider).await {
            Ok(response) => json!({
                "success": true,
                "provider": response.provider,
                "model": response.model,
                "response": response.content,
                "usage": response.usage,
            }),
            Err(error) => json!({
                "success": false,
                "provider": provider,
                "error": error.to_string(),
                "kind": error.kind,
            }),
        },
        Command::Generate(prompt) => {
            let req = manager.text_request(prompt).await;
            match manager.generate_text(&req, None).await {
                Ok(response) => serde_json::to_value(response)?,
                Err(error) => json!({"error": error.to_string(), "kind": error.kind}),
            }
        }
    };

    manager.cleanup().await;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_command(args: Vec<String>) -> Result<Command, Box<dyn std::error::Error>> {
    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        None => Command::Status,
        Some("--test") => {
            let name = args.next().ok_or(USAGE)?;
            let provider = name.parse::<ProviderId>()?;
            if let Some(extra) = args.next() {
                let message = format!("unexpected argument {extra:?} after --test\n{USAGE}");
                return Err(message.into());
            }
            Command::Test(provider)
        }
        Some("--prompt") => {
            let prompt = args.collect::<Vec<_>>().join(" ");
            if prompt.trim().is_empty() {
                return Err(USAGE.into());
            }
            Command::Generate(prompt)
        }
        Some(other) => return Err(format!("unknown argument {other:?}\n{USAGE}").into()),
    };
    Ok(command)
}
