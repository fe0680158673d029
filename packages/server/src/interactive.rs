//! Interactive mode for the server.
//!
//! Prompts for the export path, bind address, and port before starting the
//! server.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};
use exposure_map_cli_utils::MultiProgress;

use crate::{ServerConfig, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Prompt defaults come from `base`; an unreadable answer keeps the default.
///
/// # Errors
///
/// Returns [`ServerError`] if the underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(base: ServerConfig, multi: &MultiProgress) -> Result<(), ServerError> {
    println!("Exposure Map Server");
    println!();

    let default_data = base.data.display().to_string();
    let data: String = Input::new()
        .with_prompt("Monitoring export")
        .default(default_data.clone())
        .interact_text()
        .unwrap_or(default_data);

    let bind: String = Input::new()
        .with_prompt("Bind address")
        .default(base.bind.clone())
        .interact_text()
        .unwrap_or_else(|_| base.bind.clone());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(base.port)
        .interact_text()
        .unwrap_or(base.port);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    let config = ServerConfig {
        data: PathBuf::from(data),
        bind,
        port,
        ..base
    };

    super::run_server(config, multi).await
}
