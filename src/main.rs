mod agent;
mod config;
mod consistency;
mod conversations;
mod imagegen;
mod state;
mod terminal;

use anyhow::Result;
use tracing::info;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "visona=info".to_string()),
        )
        .init();

    // Candidate config paths, first hit wins.
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        exe_dir
            .join("conf.yaml")
            .to_str()
            .map(|s| s.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    let mut loaded_path = String::new();
    for path in &config_paths {
        match Config::load(path) {
            Ok(cfg) => {
                config = Some(cfg);
                loaded_path = path.clone();
                break;
            }
            Err(e) => {
                tracing::debug!("Failed to load config from {}: {}", path, e);
            }
        }
    }
    let config = config.ok_or_else(|| {
        anyhow::anyhow!("Could not find config file. Tried: {:?}", config_paths)
    })?;
    info!("Loaded configuration from: {}", loaded_path);

    std::fs::create_dir_all(&config.system_config.image_output_dir)?;

    let app_state = AppState::new(config)?;
    terminal::run_chat_loop(app_state).await
}
