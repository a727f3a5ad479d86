mod config;
mod generate_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use goalsmith_core::GoalRequest;
use goalsmith_core::auth::hash_password;
use goalsmith_core::goal::DEFAULT_MANAGERS_GOAL;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "goalsmith", about = "HTTP service that drafts SMART goals with a hosted LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a goalsmith config file with a fresh token secret
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides GOALSMITH_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate three goals once and print them as JSON
    Generate {
        #[arg(long)]
        job_title: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        goal_description: String,
        #[arg(long)]
        key_results: String,
        /// Free-form deadline, e.g. "2025-12-31" or "end of Q3"
        #[arg(long)]
        deadline: String,
        #[arg(long, default_value = DEFAULT_MANAGERS_GOAL)]
        managers_goal: String,
    },
    /// Print a salted hash of a password
    HashPassword {
        password: String,
    },
}

/// Execute the `goalsmith init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
            ..Default::default()
        },
        ..Default::default()
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  auth.token_secret = {}...{}", &token_secret[..8], &token_secret[56..]);
    println!();
    println!("Next: set GEMINI_API_KEY (or llm.api_key) and run `goalsmith serve`.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Serve { bind, port } => {
            let config = AppConfig::resolve(bind.as_deref(), port)?;
            serve_cmd::run_serve(config).await?;
        }
        Commands::Generate {
            job_title,
            department,
            goal_description,
            key_results,
            deadline,
            managers_goal,
        } => {
            let config = AppConfig::resolve(None, None)?;
            let request = GoalRequest {
                job_title,
                department,
                goal_description,
                key_results,
                deadline,
                managers_goal,
            };
            generate_cmd::run_generate(config, request).await?;
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}
