mod cli {
    pub mod admin {
        pub mod args;
        pub mod run;
    }
    pub mod engine {
        pub mod args;
        pub mod run;
    }
    pub mod ingest {
        pub mod args;
        pub mod run;
    }
    pub mod ledger {
        pub mod args;
        pub mod run;
    }
    pub mod query {
        pub mod args;
        pub mod read;
        pub mod run;
    }
    pub mod cmd;
    pub mod read;
    pub mod response;
}

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::cmd::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli);

    match &cli.command {
        Command::Engine(args) => {
            tracing::info!("Engine Command: {:?}", args);
            cli::engine::run::start(args).await
        }
        Command::Reconcile(args) => {
            tracing::info!("Reconcile Command: {:?}", args);
            cli::engine::run::reconcile(args).await
        }
        Command::Record(args) => cli::ingest::run::record(args).await,
        Command::Annotate(args) => cli::ingest::run::annotate(args).await,
        Command::SyncStatus(args) => cli::ingest::run::sync_status(args).await,
        Command::Admin(args) => cli::admin::run::run(args).await,
        Command::Select(query) => {
            tracing::info!("Engine Query: {:?}", query);
            cli::query::run::select(query).await
        }
        Command::Ledger(query) => cli::ledger::run::read(query).await,
    }
}

fn init_tracing(cli: &Cli) {
    match &cli.command {
        Command::Engine(_) => {
            // install global subscriber configured based on RUST_LOG envvar.
            tracing_subscriber::fmt::init();
        }
        // stdout carries the JSON output
        _ => {
            tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
