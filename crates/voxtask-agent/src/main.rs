use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;
use voxtask_agent::config::{Config, LogConfig};
use voxtask_agent::error::AgentError;
use voxtask_core::db;
use voxtask_core::error::CoreError;
use voxtask_core::repository::{CategoryRepository, SqliteRepository};

mod cli;
mod commands;
mod views;

#[tokio::main]
async fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };
    init_tracing(&config.log);

    if matches!(cli.command, cli::Commands::Functions) {
        if let Err(e) = commands::function::print_declarations() {
            handle_error(e);
            std::process::exit(1);
        }
        return;
    }

    let repository = match connect(&config).await {
        Ok(repository) => repository,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        cli::Commands::Functions => Ok(()),
        cli::Commands::Call(command) => {
            commands::function::call_function(repository, &config, command).await
        }
        cli::Commands::Serve => commands::function::serve(repository, &config).await,
        cli::Commands::User(cli::UserCommand::Add { email, name }) => {
            commands::user::add_user(&repository, email, name).await
        }
        cli::Commands::Category(cli::CategoryCommand::List { user }) => {
            commands::category::list_categories(&repository, user).await
        }
        cli::Commands::Category(cli::CategoryCommand::Select(args)) => {
            commands::category::select_category(&repository, args).await
        }
        cli::Commands::Category(cli::CategoryCommand::Deselect(args)) => {
            commands::category::deselect_category(&repository, args).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn connect(config: &Config) -> Result<SqliteRepository, CoreError> {
    let pool = db::establish_connection(&config.database_path).await?;
    let repository = SqliteRepository::new(pool);
    repository.ensure_default_categories().await?;
    Ok(repository)
}

/// Logs go to stderr; stdout carries function results.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    let core_error = err.downcast_ref::<CoreError>().or_else(|| match err.downcast_ref::<AgentError>() {
        Some(AgentError::Store(core)) => Some(core),
        _ => None,
    });

    match core_error {
        Some(CoreError::NotFound(s)) => eprintln!("{} {}", "Error:".style(error_style), s),
        Some(CoreError::Duplicate(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s.yellow())
        }
        Some(CoreError::Forbidden(s)) => {
            eprintln!("{} Not allowed: {}", "Error:".style(error_style), s)
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s)
        }
        _ => match err.downcast_ref::<AgentError>() {
            Some(agent_error) => eprintln!(
                "{} {} {}",
                "Error:".style(error_style),
                format!("[{}]", agent_error.code()).bright_black(),
                agent_error
            ),
            None => eprintln!("{} {:#}", "Error:".style(error_style), err),
        },
    }
}
