use clap::Parser;
use client_ledger::args::{AddSubcommand, Args, Command, DeleteSubcommand, EditSubcommand};
use client_ledger::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().ledger_home().path();

    // When LEDGER_IN_TEST_MODE is set and non-empty the mode is Mode::Test and no requests leave
    // the process, otherwise it is Mode::Http.
    let mode = Mode::from_env();

    if let Command::Init(init_args) = args.command() {
        commands::init(home, init_args.api_url()).await?.print();
        return Ok(());
    }

    let config = Config::load(home).await?;
    match args.command() {
        Command::Init(_) => {}

        Command::Dashboard(filter_args) => commands::dashboard(config, mode, filter_args.filter())
            .await?
            .print_data()?,

        Command::Analytics(analytics_args) => {
            commands::analytics(config, mode, analytics_args.year())
                .await?
                .print_data()?
        }

        Command::Clients => commands::clients(config, mode).await?.print_data()?,

        Command::Client(client_args) => commands::client(config, mode, client_args.client_id())
            .await?
            .print_data()?,

        Command::Add(add_args) => match add_args.entity() {
            AddSubcommand::Income(args) => commands::add_entry(config, mode, args.entry())
                .await?
                .print(),
            AddSubcommand::Expense(args) => commands::add_entry(config, mode, args.entry())
                .await?
                .print(),
            AddSubcommand::Visit(args) => {
                commands::add_visit(config, mode, args.client_id(), args.visit())
                    .await?
                    .print()
            }
        },

        Command::Edit(edit_args) => match edit_args.entity() {
            EditSubcommand::Client(args) => {
                commands::edit_client(config, mode, args.client_id(), args.name())
                    .await?
                    .print()
            }
            EditSubcommand::Visit(args) => commands::edit_visit(
                config,
                mode,
                args.client_id(),
                args.visit_id(),
                args.service().map(str::to_string),
                args.amount(),
            )
            .await?
            .print(),
        },

        Command::Delete(delete_args) => match delete_args.entity() {
            DeleteSubcommand::Client(args) => {
                commands::delete_client(config, mode, args.client_id())
                    .await?
                    .print()
            }
        },

        Command::Reset(reset_args) => commands::reset(config, mode, reset_args.yes())
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the library and binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
