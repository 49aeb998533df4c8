use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use ai_powerhouse::{init_logger, load_dotenv, AiPowerhouse, LLMProvider};

/// AI Powerhouse - unified interface for multiple AI providers
#[derive(Parser)]
#[command(name = "ai-powerhouse", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question to one or more AI providers
    Ask(AskArgs),
    /// Show model and reachability of every configured provider
    Status,
    /// Ask Claude specifically
    Claude { prompt: String },
    /// Ask Gemini specifically
    Gemini { prompt: String },
    /// Ask OpenAI specifically
    Openai { prompt: String },
}

#[derive(Args)]
struct AskArgs {
    prompt: String,
    /// Use Claude
    #[arg(long)]
    claude: bool,
    /// Use Gemini
    #[arg(long)]
    gemini: bool,
    /// Use OpenAI
    #[arg(long)]
    openai: bool,
    /// Use all available providers (default when no provider flag is given)
    #[arg(long)]
    all: bool,
}

impl AskArgs {
    fn selected(&self) -> Option<Vec<&'static str>> {
        if self.all {
            return None;
        }
        let selected: Vec<&'static str> = [
            (self.claude, LLMProvider::Claude),
            (self.gemini, LLMProvider::Gemini),
            (self.openai, LLMProvider::OpenAI),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .map(|(_, p)| p.provider_name())
        .collect();
        if selected.is_empty() {
            None
        } else {
            Some(selected)
        }
    }
}

fn print_panel(title: &str, body: &str) {
    let rule = "─".repeat(title.chars().count().max(40));
    println!("{}", title);
    println!("{}", rule);
    println!("{}", body);
    println!();
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    load_dotenv()?;
    init_logger();

    let cli = Cli::parse();
    let ai = AiPowerhouse::from_env()?;

    match cli.command {
        Command::Ask(args) => {
            let selected = args.selected();
            let responses = ai.ask(&args.prompt, selected.as_deref()).await;
            for (provider, response) in &responses {
                print_panel(&title_case(provider), response);
            }
        }
        Command::Status => {
            let info = ai.get_provider_info().await;
            if info.is_empty() {
                println!("No providers configured. Set API keys in .env or the environment.");
                return Ok(());
            }
            println!("{:<10} {:<32} {}", "Provider", "Model", "Status");
            for (name, info) in &info {
                let status = if info.available { "Available" } else { "Not Available" };
                println!("{:<10} {:<32} {}", title_case(name), info.model, status);
            }
        }
        Command::Claude { prompt } => print_panel("Claude", &ai.ask_claude(&prompt).await),
        Command::Gemini { prompt } => print_panel("Gemini", &ai.ask_gemini(&prompt).await),
        Command::Openai { prompt } => print_panel("OpenAI", &ai.ask_openai(&prompt).await),
    }

    Ok(())
}
