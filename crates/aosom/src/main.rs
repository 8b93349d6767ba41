mod cli;
mod commands;
mod error;
mod output;

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use aosom_api::{Session, SessionConfig};
use aosom_config::{Config, EnvOverrides};

use crate::cli::{Cli, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    init_tracing(cli.global.verbose);

    let cfg = aosom_config::load_config_or_default();
    if cli.global.output.is_none() {
        cli.global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }

    if let Err(err) = run(cli, &cfg).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, cfg: &Config) -> Result<(), CliError> {
    match cli.command {
        // These need no server
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Resources => commands::resources::handle(&cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "aosom", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let config = build_session_config(&cli.global, cfg)?;
            let mut session = Session::new(config);
            session.login().await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &mut session, &cli.global).await
        }
    }
}

/// Build a `SessionConfig` from the config file, profile, `AOS_*`
/// environment and CLI flags, in increasing priority.
fn build_session_config(global: &GlobalOpts, cfg: &Config) -> Result<SessionConfig, CliError> {
    let (profile_name, profile) = aosom_config::select_profile(global.profile.as_deref(), cfg)?;
    let env = EnvOverrides::from_env()?;
    let mut config = aosom_config::session_config(cfg, profile, &profile_name, &env)?;

    if let Some(ref server) = global.server {
        config.server = Some(server.clone());
    }
    if let Some(port) = global.port {
        config.port = port;
    }
    if let Some(ref user) = global.user {
        config.user.clone_from(user);
    }
    if let Some(secs) = global.timeout {
        config.transport = config.transport.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}
