#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the exposure map dashboard server.

use std::path::PathBuf;

use clap::Parser;
use exposure_map_server::{
    DEFAULT_APP_DIR, DEFAULT_DATA_FILE, ServerConfig, env_bind_addr, env_port, interactive,
    run_server,
};

#[derive(Parser)]
#[command(
    name = "exposure_map_server",
    about = "Interactive map of indoor/outdoor pollutant measurements"
)]
struct Cli {
    /// Delimited monitoring export to load
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data: PathBuf,
    /// Single-byte field delimiter of the export
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
    /// Address to bind (falls back to `BIND_ADDR`)
    #[arg(long)]
    bind: Option<String>,
    /// Port to listen on (falls back to `PORT`)
    #[arg(long)]
    port: Option<u16>,
    /// Geocoding endpoint replacing the public Nominatim search URL
    #[arg(long)]
    geocoder_url: Option<String>,
    /// Directory holding the dashboard page
    #[arg(long, default_value = DEFAULT_APP_DIR)]
    app_dir: PathBuf,
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(long)]
    debug: bool,
    /// Prompt for the export path, address, and port
    #[arg(long)]
    interactive: bool,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            data: self.data,
            delimiter: self.delimiter,
            bind: self.bind.unwrap_or_else(env_bind_addr),
            port: self.port.unwrap_or_else(env_port),
            geocoder_url: self.geocoder_url,
            app_dir: self.app_dir,
        }
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!("delimiter must be a single ASCII character, got {s:?}")),
        },
    }
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = exposure_map_cli_utils::init_logger(if cli.debug { "debug" } else { "info" });

    let interactive_mode = cli.interactive;
    let config = cli.into_config();

    if interactive_mode {
        interactive::run(config, &multi).await?;
    } else {
        run_server(config, &multi).await?;
    }

    Ok(())
}
