// src/main.rs

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tandem::api::types::{BehaviorRules, OrderDirection, RequestLogQuery};
use tandem::api::{AdminApi, HttpClient};
use tandem::chat::{ChatClient, TranscriptCache};
use tandem::config::CONFIG;

#[derive(Parser)]
#[command(name = "tandem", about = "Tandem chat client and admin console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat against a bot
    Chat {
        /// Bot id to chat with
        #[arg(long)]
        bot: i64,
    },
    /// Admin console operations
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List users
    Users,
    /// List agent instances
    Agents,
    /// List agent archetypes
    Archetypes,
    /// Page through the AI provider request log
    Requests {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "page-size", default_value_t = 20)]
        page_size: u32,
        #[arg(long, default_value = "createdAt")]
        order_by: String,
        #[arg(long, default_value = "desc")]
        order: OrderDirection,
    },
    /// Show behavior rules for an agent type
    Rules { agent_type: i64 },
    /// Replace the system prompt for an agent type
    SetRules {
        agent_type: i64,
        #[arg(long)]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level: Level = CONFIG.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let http = Arc::new(HttpClient::from_config()?);

    match cli.command {
        Command::Chat { bot } => run_chat(http, bot).await,
        Command::Admin { command } => run_admin(http, command).await,
    }
}

async fn run_chat(http: Arc<HttpClient>, bot_id: i64) -> anyhow::Result<()> {
    let mut client = ChatClient::new(
        http.clone(),
        http.clone(),
        TranscriptCache::with_default_ttl(),
    );
    client.select_bot(bot_id).await?;

    println!(
        "Chatting with {} (bot {}). /help for commands, /quit to leave.",
        client.bot_name().unwrap_or("?"),
        bot_id
    );
    print_transcript(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] | ["/q"] => break,
            ["/help"] => {
                println!("/sessions  /select <id>  /new  /delete <id>  /rename <id> <name...>");
                println!("/translate <n>  /reload  /quit");
            }
            ["/sessions"] => {
                for session in client.sessions() {
                    let marker = if client.current_session_id() == Some(session.id) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} [{}] {}",
                        marker,
                        session.id,
                        session.name.as_deref().unwrap_or("(unnamed)")
                    );
                }
            }
            ["/select", id] => match id.parse() {
                Ok(id) => {
                    client.select_session(id).await?;
                    print_transcript(&client);
                }
                Err(_) => println!("usage: /select <session-id>"),
            },
            ["/new"] => {
                let session = client.new_session(None).await?;
                println!("session {} created", session.id);
            }
            ["/delete", id] => match id.parse() {
                Ok(id) => {
                    let confirmed = client
                        .delete_session_with_confirmation(id, confirm_on_stdin(id))
                        .await?;
                    if confirmed {
                        println!("session {} deleted", id);
                        print_transcript(&client);
                    }
                }
                Err(_) => println!("usage: /delete <session-id>"),
            },
            ["/rename", id, rest @ ..] if !rest.is_empty() => match id.parse() {
                Ok(id) => {
                    client.rename_session(id, &rest.join(" ")).await?;
                }
                Err(_) => println!("usage: /rename <session-id> <name>"),
            },
            ["/translate", n] => match n.parse::<usize>() {
                Ok(n) => toggle_translation(&mut client, n).await,
                Err(_) => println!("usage: /translate <message-number>"),
            },
            ["/reload"] => {
                client.reload().await?;
                print_transcript(&client);
            }
            _ if line.starts_with('/') => println!("unknown command, /help for help"),
            _ => match client.send(line).await {
                Ok(_) => {
                    if let Some(reply) = client.visible_messages().last() {
                        println!("{}: {}", client.bot_name().unwrap_or("bot"), reply.content);
                    }
                    // Give the word-translation poll a chance to finish so
                    // /translate on the reply is instant.
                    client.finish_word_poll().await;
                }
                Err(err) => println!("send failed: {err}"),
            },
        }
    }
    Ok(())
}

async fn confirm_on_stdin(session_id: i64) -> bool {
    print!("delete session {session_id}? [y/N] ");
    let _ = io::stdout().flush();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    match lines.next_line().await {
        Ok(Some(answer)) => matches!(answer.trim(), "y" | "Y" | "yes"),
        _ => false,
    }
}

fn print_transcript(client: &ChatClient) {
    for (n, message) in client.visible_messages().enumerate() {
        println!("[{}] {}: {}", n, message.role.as_str(), message.content);
    }
}

async fn toggle_translation(client: &mut ChatClient, n: usize) {
    let Some(local_id) = client.visible_messages().nth(n).map(|m| m.local_id) else {
        println!("no message {n}");
        return;
    };
    client.toggle_translation(local_id).await;
    if client.translation_visible(local_id) {
        if let Some(message) = client.messages().iter().find(|m| m.local_id == local_id) {
            if let Some(translation) = &message.translation {
                println!("  ⇢ {translation}");
            }
            if let Some(words) = &message.word_translations {
                for w in words {
                    println!("    {} — {}", w.word, w.translation);
                }
            }
        }
    } else {
        println!("  (translation hidden)");
    }
}

async fn run_admin(http: Arc<HttpClient>, command: AdminCommand) -> anyhow::Result<()> {
    match command {
        AdminCommand::Users => {
            for user in http.list_users().await? {
                println!(
                    "[{}] {} {}{}",
                    user.id,
                    user.email,
                    user.display_name.as_deref().unwrap_or("-"),
                    if user.is_admin { " (admin)" } else { "" }
                );
            }
        }
        AdminCommand::Agents => {
            for agent in http.list_agents().await? {
                println!(
                    "[{}] {} (archetype {}){}",
                    agent.id,
                    agent.name,
                    agent.archetype_id,
                    if agent.active { "" } else { " [inactive]" }
                );
            }
        }
        AdminCommand::Archetypes => {
            for archetype in http.list_archetypes().await? {
                println!(
                    "[{}] {} — {}",
                    archetype.id,
                    archetype.name,
                    archetype.description.as_deref().unwrap_or("")
                );
            }
        }
        AdminCommand::Requests {
            page,
            page_size,
            order_by,
            order,
        } => {
            let query = RequestLogQuery::newest_first()
                .order_by(order_by, order)
                .page(page)
                .page_size(page_size);
            let log = http.request_log(&query).await?;
            println!("page {}/{} ({} total)", log.page, (log.total as u64).div_ceil(log.page_size as u64), log.total);
            for entry in log.items {
                println!(
                    "[{}] {} {} {} {}",
                    entry.id,
                    entry.created_at.to_rfc3339(),
                    entry.provider.as_deref().unwrap_or("-"),
                    entry.model.as_deref().unwrap_or("-"),
                    entry.status.as_deref().unwrap_or("-")
                );
            }
        }
        AdminCommand::Rules { agent_type } => match http.behavior_rules(agent_type).await? {
            Some(rules) => {
                println!("system prompt:\n{}", rules.system_prompt);
                for rule in rules.rules {
                    println!("- {rule}");
                }
            }
            None => println!("no rules configured for agent type {agent_type}"),
        },
        AdminCommand::SetRules { agent_type, prompt } => {
            let existing = http.behavior_rules(agent_type).await?;
            let rules = BehaviorRules {
                system_prompt: prompt,
                rules: existing.map(|r| r.rules).unwrap_or_default(),
            };
            http.put_behavior_rules(agent_type, &rules).await?;
            println!("rules updated for agent type {agent_type}");
        }
    }
    Ok(())
}
