use std::io::Write;
use std::path;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::domain::models::UiEvent;
use crate::domain::services::ChatController;
use crate::domain::services::Phase;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /login EMAIL PASSWORD - Signs in and stores the bearer token.
- /register EMAIL PASSWORD - Creates an account.
- /logout - Clears the stored bearer token.
- /whoami - Shows the signed-in user.
- /sessions - Lists conversation sessions; the active one is marked with *.
- /new [TITLE] - Starts a new session.
- /switch ID - Makes a session active and loads its history.
- /rename ID TITLE - Renames a session.
- /delete ID - Deletes a session.
- /providers - Lists providers and models; the active pair is marked with *.
- /provider NAME - Selects a provider (model resets to its first entry).
- /model NAME - Selects a model for the current provider.
- /docs - Lists uploaded documents.
- /upload PATH - Uploads a document for grounding.
- /doc-rename ID NAME - Renames a document.
- /doc-delete ID - Deletes a document.
- /help - Shows this menu.
- /quit - Exits.

Any other input is sent to the assistant; the reply streams in as it is
generated.
        "#;

    return text.trim().to_string();
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

fn print_sessions(controller: &ChatController) {
    if controller.sessions().sessions().is_empty() {
        println!("There are no sessions yet. Send a message to start your first one!");
        return;
    }

    for session in controller.sessions().sessions() {
        let marker = if controller.sessions().active_id() == Some(session.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} (ID: {}) {}, created {}",
            session.id,
            session.display_title(),
            session.created_at
        );
    }
}

fn print_providers(controller: &ChatController) {
    if controller.catalog().providers().is_empty() {
        println!("The backend reported no providers.");
        return;
    }

    for (provider, models) in controller.catalog().providers() {
        let provider_marker = if controller.catalog().provider() == Some(provider.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{provider_marker} {provider}");

        for model in models {
            let model_marker = if provider_marker == "*"
                && controller.catalog().model() == Some(model.as_str())
            {
                "*"
            } else {
                " "
            };
            println!("  {model_marker} {model}");
        }
    }
}

async fn handle_command(controller: &mut ChatController, line: &str) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args = parts.collect::<Vec<&str>>();

    match command {
        "/quit" | "/exit" | "/q" => return Ok(true),
        "/help" | "/h" => println!("{}", help_text()),
        "/login" => {
            let [email, password] = args.as_slice() else {
                println!("Usage: /login EMAIL PASSWORD");
                return Ok(false);
            };
            controller.client().clone().login(email, password).await?;
            println!("Signed in as {email}.");
            controller.bootstrap().await?;
        }
        "/register" => {
            let [email, password] = args.as_slice() else {
                println!("Usage: /register EMAIL PASSWORD");
                return Ok(false);
            };
            let user = controller.client().clone().register(email, password).await?;
            println!("Registered {}. Use /login to sign in.", user.email);
        }
        "/logout" => {
            controller.client().credentials().clear().await?;
            println!("Signed out.");
        }
        "/whoami" => {
            let user = controller.client().clone().me().await?;
            println!("{} (ID: {})", user.email, user.id);
        }
        "/sessions" => print_sessions(controller),
        "/new" => {
            let title = if args.is_empty() {
                None
            } else {
                Some(args.join(" "))
            };
            let id = controller.new_session(title.as_deref()).await?;
            println!("Started session {id}.");
        }
        "/switch" => {
            let [id] = args.as_slice() else {
                println!("Usage: /switch ID");
                return Ok(false);
            };
            controller.switch_session(id.parse::<i64>()?).await?;
            for message in controller.timeline().messages() {
                println!("[{}] {}", message.role.to_string(), message.content);
            }
        }
        "/rename" => {
            if args.len() < 2 {
                println!("Usage: /rename ID TITLE");
                return Ok(false);
            }
            let id = args[0].parse::<i64>()?;
            controller.rename_session(id, &args[1..].join(" ")).await?;
            println!("Renamed session {id}.");
        }
        "/delete" => {
            let [id] = args.as_slice() else {
                println!("Usage: /delete ID");
                return Ok(false);
            };
            let id = id.parse::<i64>()?;
            controller.delete_session(id).await?;
            println!("Deleted session {id}.");
        }
        "/providers" => print_providers(controller),
        "/provider" => {
            let [name] = args.as_slice() else {
                println!("Usage: /provider NAME");
                return Ok(false);
            };
            controller.select_provider(name)?;
            println!(
                "{name} selected, model {}.",
                controller.catalog().model().unwrap_or("none")
            );
        }
        "/model" => {
            let [name] = args.as_slice() else {
                println!("Usage: /model NAME");
                return Ok(false);
            };
            controller.select_model(name)?;
            println!("{name} has entered the chat.");
        }
        "/docs" => {
            let documents = controller.client().clone().list_documents().await?;
            if documents.is_empty() {
                println!("No documents uploaded yet. Use /upload PATH to add one.");
            }
            for document in documents {
                println!(
                    "- (ID: {}) {} [{}]",
                    document.id, document.filename, document.status
                );
            }
        }
        "/upload" => {
            let [path_arg] = args.as_slice() else {
                println!("Usage: /upload PATH");
                return Ok(false);
            };
            let file_path = path::PathBuf::from(path_arg);
            let file_name = file_path
                .file_name()
                .map(|name| return name.to_string_lossy().to_string())
                .unwrap_or_else(|| return "document".to_string());
            let payload = tokio::fs::read(&file_path).await?;
            let document = controller.client().clone().upload(&file_name, payload).await?;
            println!(
                "Uploaded {} (ID: {}), status {}.",
                document.filename, document.id, document.status
            );
        }
        "/doc-rename" => {
            if args.len() < 2 {
                println!("Usage: /doc-rename ID NAME");
                return Ok(false);
            }
            let id = args[0].parse::<i64>()?;
            controller
                .client()
                .clone()
                .rename_document(id, &args[1..].join(" "))
                .await?;
            println!("Renamed document {id}.");
        }
        "/doc-delete" => {
            let [id] = args.as_slice() else {
                println!("Usage: /doc-delete ID");
                return Ok(false);
            };
            let id = id.parse::<i64>()?;
            controller.client().clone().delete_document(id).await?;
            println!("Deleted document {id}.");
        }
        _ => println!("Unknown command {command}. Use /help for the list."),
    }

    return Ok(false);
}

/// Line-oriented presentation loop. Chat state lives in the controller;
/// this only renders events and forwards input.
pub async fn start(mut controller: ChatController) -> Result<()> {
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                UiEvent::AssistantDelta(fragment) => {
                    print!("{fragment}");
                    flush_stdout();
                }
                UiEvent::StreamFailed(notice) => {
                    println!("\n! Failed to send message: {notice}");
                }
                UiEvent::CredentialExpired => {
                    println!("\n! Session expired. Use /login EMAIL PASSWORD to sign in again.");
                }
                _ => {}
            }
        }
    });

    if let Err(err) = controller.bootstrap().await {
        println!("! {err}");
    }
    println!("Connected. Type a message, or /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        flush_stdout();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match handle_command(&mut controller, &line).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => println!("! {err}"),
            }
            continue;
        }

        match controller.submit(&line).await {
            // The reply streamed through the event task; close its line.
            Ok(()) => {
                if controller.phase() == Phase::Idle {
                    println!();
                }
            }
            Err(err) => println!("! {err}"),
        }
    }

    return Ok(());
}
