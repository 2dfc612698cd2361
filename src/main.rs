#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::path;
use std::process;
use std::sync::Arc;

use anyhow::Error;

use crate::application::cli;
use crate::application::repl;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::ChatController;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::CredentialStore;

fn handle_error(err: Error) {
    eprintln!(
        "Oh no! Docsidian has failed with the following app version and error.\n\nVersion: {}\nError: {}",
        env!("CARGO_PKG_VERSION"),
        err
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    let debug_log_dir = env::var("DOCSIDIAN_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_default()
            .join("docsidian")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("docsidian")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let ready_res = cli::parse().await;
    match ready_res {
        Err(ready_err) => {
            handle_error(ready_err);
            return;
        }
        Ok(false) => {
            process::exit(0);
        }
        Ok(true) => {}
    }

    let credentials =
        CredentialStore::new(path::PathBuf::from(Config::get(ConfigKey::TokenFile)));
    let client = ApiClient::from_config(Arc::new(credentials));
    let controller = ChatController::new(Arc::new(client));

    if let Err(err) = repl::start(controller).await {
        handle_error(err);
    }

    process::exit(0);
}
