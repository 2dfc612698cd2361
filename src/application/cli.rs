use std::path;
use std::sync::Arc;

use anyhow::Result;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Session;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::CredentialStore;

fn format_session(session: &Session) -> String {
    return format!(
        "- (ID: {}) {}, created {}",
        session.id,
        session.display_title(),
        session.created_at
    );
}

async fn print_sessions_list() -> Result<()> {
    let credentials = CredentialStore::new(path::PathBuf::from(Config::get(ConfigKey::TokenFile)));
    let client = ApiClient::from_config(Arc::new(credentials));

    let sessions = client
        .list_sessions()
        .await?
        .iter()
        .map(|session| {
            return format_session(session);
        })
        .collect::<Vec<String>>();

    if sessions.is_empty() {
        println!("There are no sessions yet. Send a message to start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

pub fn build() -> Command {
    return Command::new("docsidian")
        .about("Terminal client for a document-grounded chat assistant backend")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config-file")
                .short('c')
                .long("config-file")
                .env("DOCSIDIAN_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                )),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .env("DOCSIDIAN_API_URL")
                .num_args(1)
                .help("Base URL of the chat backend [default: http://localhost:8000]"),
        )
        .arg(
            Arg::new("provider")
                .long("provider")
                .env("DOCSIDIAN_PROVIDER")
                .num_args(1)
                .help("Provider to select at startup, first reported by the backend when unset"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .short('m')
                .env("DOCSIDIAN_MODEL")
                .num_args(1)
                .help("Model to select at startup, first for the provider when unset"),
        )
        .arg(
            Arg::new("session-id")
                .long("session-id")
                .short('s')
                .num_args(1)
                .help("Session to make active at startup, most recent when unset"),
        )
        .arg(
            Arg::new("token-file")
                .long("token-file")
                .env("DOCSIDIAN_TOKEN_FILE")
                .num_args(1)
                .help(format!(
                    "Where the bearer token is persisted [default: {}]",
                    Config::default(ConfigKey::TokenFile)
                )),
        )
        .arg(
            Arg::new("sessions")
                .long("sessions")
                .action(ArgAction::SetTrue)
                .help("Lists sessions from the backend and exits"),
        )
        .arg(
            Arg::new("config-default")
                .long("config-default")
                .action(ArgAction::SetTrue)
                .help("Prints the default config file to stdout and exits"),
        );
}

/// Returns false when a flag handled everything and the chat loop should
/// not start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    if matches.get_flag("config-default") {
        print!("{}", Config::serialize_default(build()));
        return Ok(false);
    }

    Config::load(vec![&matches]).await?;

    if matches.get_flag("sessions") {
        print_sessions_list().await?;
        return Ok(false);
    }

    return Ok(true);
}
