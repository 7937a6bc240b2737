use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vision_studio_client::app::{Action, App, Outcome};
use vision_studio_client::config::Config;
use vision_studio_client::models::{ChatModel, ImageModel};
use vision_studio_client::reply::ReplyFormat;

#[derive(Debug, Parser)]
#[command(name = "vision-studio")]
#[command(about = "Chat with and generate images through a generative backend")]
struct CliArgs {
    /// Backend base URL (overrides VISION_BACKEND_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// How replies are decoded: text, json or auto.
    #[arg(long, global = true, value_parser = parse_reply_format)]
    reply_format: Option<ReplyFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session.
    Chat {
        #[arg(long, value_parser = parse_chat_model)]
        model: Option<ChatModel>,
    },
    /// Generate an image from PROMPT, or start an interactive session when omitted.
    Image {
        #[arg(long, value_parser = parse_image_model)]
        model: Option<ImageModel>,

        prompt: Vec<String>,
    },
}

fn parse_reply_format(input: &str) -> std::result::Result<ReplyFormat, String> {
    input.parse().map_err(|e| format!("{}", e))
}

fn parse_chat_model(input: &str) -> std::result::Result<ChatModel, String> {
    input.parse().map_err(|e| format!("{}", e))
}

fn parse_image_model(input: &str) -> std::result::Result<ImageModel, String> {
    input.parse().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_studio_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(base_url) = args.base_url {
        config.backend_url = base_url;
    }
    if let Some(reply_format) = args.reply_format {
        config.reply_format = reply_format;
    }

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize client: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Chat { model } => {
            if let Some(model) = model {
                app.dispatch(Action::SelectChatModel(model)).await?;
            }
            run_chat(&app).await
        }
        Command::Image { model, prompt } => {
            if let Some(model) = model {
                app.dispatch(Action::SelectImageModel(model)).await?;
            }
            if prompt.is_empty() {
                run_images(&app).await
            } else {
                match app.dispatch(Action::GenerateImage(prompt.join(" "))).await {
                    Ok(outcome) => {
                        print_outcome(&outcome);
                        Ok(())
                    }
                    Err(e) => {
                        error!("Image generation failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
    }
}

async fn run_chat(app: &App) -> Result<()> {
    info!("Starting chat with {}", app.chat().snapshot().model());
    match app.dispatch(Action::Bootstrap).await {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => error!("Could not reach the chat backend: {}", e),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let action = match line.split_once(' ') {
            _ if line.is_empty() => continue,
            _ if line == "/quit" => break,
            Some(("/model", name)) => match name.trim().parse::<ChatModel>() {
                Ok(model) => Action::SelectChatModel(model),
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            },
            _ => Action::SendMessage(line.to_string()),
        };

        match app.dispatch(action).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => error!("{}", e),
        }
    }
    Ok(())
}

async fn run_images(app: &App) -> Result<()> {
    info!("Generating images with {}", app.images().snapshot().model());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let action = match line.split_once(' ') {
            _ if line.is_empty() => continue,
            _ if line == "/quit" => break,
            _ if line == "/clear" => Action::ClearHistory,
            _ if line == "/history" => {
                for (index, record) in app.images().snapshot().history().iter().enumerate() {
                    println!("[{}] {}", index, record);
                }
                continue;
            }
            Some(("/model", name)) => match name.trim().parse::<ImageModel>() {
                Ok(model) => Action::SelectImageModel(model),
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            },
            Some(("/show", index)) => match index.trim().parse::<usize>() {
                Ok(index) => Action::ShowImage(index),
                Err(_) => {
                    error!("Usage: /show <index>");
                    continue;
                }
            },
            _ => Action::GenerateImage(line.to_string()),
        };

        match app.dispatch(action).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => error!("{}", e),
        }
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Reply(message) => println!("{}: {}", message.role(), message.content()),
        Outcome::Image(record) => println!("{}", record),
        Outcome::ChatModelSelected(model) => println!("chat model: {}", model),
        Outcome::ImageModelSelected(model) => println!("image model: {}", model),
        Outcome::HistoryCleared => println!("history cleared"),
        Outcome::Shown(Some(record)) => println!("{}", record),
        Outcome::Shown(None) => println!("no image at that index"),
    }
}
