pub mod commands;

use std::io::{self, Write};
use std::time::Duration;

use uuid::Uuid;

use crate::cli::commands::{Commands, EnvAction};
use crate::config::AppConfig;
use crate::environment::{resolve_active, Environment, EnvironmentError};
use crate::orchestrator::{HttpOrchestrator, OrchestratorApi};
use crate::session::{ChatSession, FeedbackType, Role};

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    match command {
        Commands::Env { action } => match action {
            EnvAction::List => {
                if config.environments.is_empty() {
                    println!("No environments configured.");
                    return;
                }
                println!("{:<16} | {:<24} | {}", "ID", "Name", "Orchestrator Endpoint");
                println!("{:-<16}-+-{:-<24}-+-{:-<30}", "", "", "");
                for env in &config.environments {
                    println!(
                        "{:<16} | {:<24} | {}",
                        env.id, env.name, env.orchestrator_endpoint
                    );
                }
            }
            EnvAction::Show { id } => match config.environments.iter().find(|e| e.id == id) {
                Some(env) => {
                    println!("ID:       {}", env.id);
                    println!("Name:     {}", env.name);
                    println!("Endpoint: {}", env.orchestrator_endpoint);
                    if config.active_environment.as_deref() == Some(env.id.as_str()) {
                        println!("Active:   yes");
                    }
                }
                None => eprintln!("Environment {} not found.", id),
            },
        },
        Commands::Health { environment } => {
            let env = match select_environment(&config, environment.as_deref()) {
                Ok(env) => env,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return;
                }
            };
            let endpoint = match env.endpoint() {
                Ok(endpoint) => endpoint.to_string(),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return;
                }
            };
            let api = HttpOrchestrator::new(Duration::from_secs(config.request_timeout_secs))
                .expect("Failed to build HTTP client");
            if api.health(&endpoint).await {
                println!("{}: healthy", env.id);
            } else {
                println!("{}: unreachable", env.id);
            }
        }
        Commands::Chat { environment } => run_repl(environment, config).await,
    }
}

fn select_environment<'a>(
    config: &'a AppConfig,
    flag: Option<&str>,
) -> Result<&'a Environment, EnvironmentError> {
    let selection = flag.or(config.active_environment.as_deref());
    resolve_active(&config.environments, selection)
}

async fn run_repl(environment: Option<String>, config: AppConfig) {
    let env = match select_environment(&config, environment.as_deref()) {
        Ok(env) => env.clone(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let endpoint = match env.endpoint() {
        Ok(endpoint) => endpoint.to_string(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    let api = HttpOrchestrator::new(Duration::from_secs(config.request_timeout_secs))
        .expect("Failed to build HTTP client");

    let settings = api.fetch_settings(&endpoint).await;
    let mut session = ChatSession::new(settings.into());

    println!("--- Ragchat ---");
    println!("Connected to environment: {} ({})", env.name, env.id);
    println!("Type /exit to quit, /help for commands.");
    println!("---------------");

    loop {
        print!("\nYou> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).unwrap() == 0 {
            break;
        }
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        if let Some(line) = text.strip_prefix('/') {
            handle_command(line, &mut session, &env, &api, &config.environments).await;
            continue;
        }

        let before = session.messages().len();
        session.send_message(text, &env, &api).await;
        if session.messages().len() > before {
            print_answer(&session);
        }
    }
}

fn print_answer(session: &ChatSession) {
    let Some(answer) = session
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
    else {
        return;
    };

    println!("\nAssistant> {}", answer.content);
    if !answer.sources.is_empty() {
        println!("[{} sources, /sources to view]", answer.sources.len());
    }
    if session.policy().enabled && answer.feedback.is_none() {
        println!("[/up or /down to rate this answer]");
    }
}

async fn handle_command(
    line: &str,
    session: &mut ChatSession,
    env: &Environment,
    api: &dyn OrchestratorApi,
    environments: &[Environment],
) {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let index = parts.clone().next().and_then(|p| p.parse::<usize>().ok());

    match command {
        "new" => {
            session.new_chat();
            println!("Started a new chat.");
        }
        "sources" => {
            let Some(id) = nth_answer(session, index) else {
                println!("No answer to show sources for.");
                return;
            };
            if !session.select_sources(id) {
                println!("No sources attached to that answer.");
                return;
            }
            for (i, view) in session.open_source_views().iter().enumerate() {
                println!("[{}] {}", i + 1, view.title);
                if let Some(location) = &view.location {
                    println!("    {}", location);
                }
                if let Some(category) = &view.category {
                    println!("    category: {}", category);
                }
                println!("    {}", view.snippet);
            }
        }
        "up" => react(session, env, api, FeedbackType::ThumbsUp, index).await,
        "down" => react(session, env, api, FeedbackType::ThumbsDown, index).await,
        "rate" => {
            let Some(form) = session.pending_form() else {
                println!("No rating form is open.");
                return;
            };
            let Some(rating) = parts.next().and_then(|p| p.parse::<u8>().ok()) else {
                println!("Usage: /rate <1-5> [comment]");
                return;
            };
            let comment = parts.collect::<Vec<_>>().join(" ");
            let comment = (!comment.is_empty()).then_some(comment);
            session
                .submit_form(form.message_id, rating, comment, env, api)
                .await;
            if feedback_recorded(session, form.message_id) {
                println!("Feedback sent. Thank you!");
            } else {
                println!("Feedback was not sent; the form is still open. Try /rate again.");
            }
        }
        "cancel" => {
            match session.pending_form() {
                Some(form) => {
                    session.cancel_feedback(form.message_id);
                    println!("Rating discarded.");
                }
                None => println!("No rating form is open."),
            }
        }
        "envs" => {
            for e in environments {
                let marker = if e.id == env.id { "*" } else { " " };
                println!("{} {} ({})", marker, e.id, e.name);
            }
        }
        "help" => {
            println!("/new            start a new chat");
            println!("/sources [n]    show the sources behind answer n (default: last)");
            println!("/up [n]         thumbs-up answer n (default: last)");
            println!("/down [n]       thumbs-down answer n (default: last)");
            println!("/rate <1-5>     submit the open rating form, with optional comment");
            println!("/cancel         discard the open rating form");
            println!("/envs           list configured environments");
            println!("/exit           quit");
        }
        _ => println!("Unknown command: /{}. Try /help.", command),
    }
}

async fn react(
    session: &mut ChatSession,
    env: &Environment,
    api: &dyn OrchestratorApi,
    kind: FeedbackType,
    index: Option<usize>,
) {
    if !session.policy().enabled {
        println!("Feedback is disabled for this environment.");
        return;
    }
    let Some(id) = nth_answer(session, index) else {
        println!("No answer to rate.");
        return;
    };
    if feedback_recorded(session, id) {
        println!("Feedback was already recorded for that answer.");
        return;
    }

    session.react(id, kind, env, api).await;

    if session.pending_form().map(|f| f.message_id) == Some(id) {
        println!("Rate this answer with /rate <1-5> [comment], or /cancel.");
    } else if feedback_recorded(session, id) {
        println!("Feedback sent. Thank you!");
    } else {
        println!("Feedback was not sent.");
    }
}

/// The nth assistant answer, 1-based; the most recent one when no index is
/// given.
fn nth_answer(session: &ChatSession, index: Option<usize>) -> Option<Uuid> {
    let answers: Vec<Uuid> = session
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| m.id)
        .collect();

    match index {
        Some(n) => answers.get(n.checked_sub(1)?).copied(),
        None => answers.last().copied(),
    }
}

fn feedback_recorded(session: &ChatSession, id: Uuid) -> bool {
    session
        .message(id)
        .is_some_and(|m| m.feedback.is_some())
}
