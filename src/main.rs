#![cfg(not(tarpaulin_include))]

use formgrid::app;
use formgrid::config::ServerConfig;
use std::env;

/// Entry point for the grid web service.
///
/// Usage: `formgrid-server [config.json] [data_dir] [bind_addr]`
///
/// The config file is optional; positional overrides win over it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    let mut config = match args.get(1) {
        Some(path) if path.ends_with(".json") => ServerConfig::from_json_file(path)?,
        _ => ServerConfig::default(),
    };

    // Positional overrides follow the optional config path
    let rest: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|a| !a.ends_with(".json"))
        .collect();
    if let Some(dir) = rest.first() {
        config.data_dir = dir.to_string();
    }
    if let Some(addr) = rest.get(1) {
        config.bind_addr = addr.to_string();
    }

    app::run(config).await
}
