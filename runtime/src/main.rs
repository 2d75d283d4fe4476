// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bullion_live::{cli, config};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "bullion-live",
    about = "bullion-live: live bullion rates scraped with headless Chromium",
    version,
    after_help = "Run 'bullion-live <command> --help' for details on each command.\nRun 'bullion-live' with no command to start the server."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Server options used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ServeArgs {
    /// Port to listen on (all interfaces)
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fetch scheduler and serve the HTTP API
    Serve(ServeArgs),
    /// Render the page once and print the extracted snapshot
    Fetch {
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // No subcommand serves with the top-level options
    let command = cli.command.unwrap_or(Commands::Serve(cli.serve));

    let result = match command {
        Commands::Serve(args) => {
            cli::init_tracing(cli.verbose, cli.log_json);
            cli::serve::run(args.port).await
        }
        Commands::Fetch { compact } => {
            cli::init_tracing(cli.verbose, cli.log_json);
            cli::fetch::run(compact).await
        }
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bullion-live", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_port(args: &[&str]) -> u16 {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command.unwrap_or(Commands::Serve(cli.serve)) {
            Commands::Serve(args) => args.port,
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_port_flag_without_subcommand() {
        assert_eq!(serve_port(&["bullion-live", "--port", "8080"]), 8080);
    }

    #[test]
    fn test_port_flag_on_serve() {
        assert_eq!(serve_port(&["bullion-live", "serve", "--port", "9000"]), 9000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["bullion-live", "--port", "http"]).is_err());
        assert!(Cli::try_parse_from(["bullion-live", "serve", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_fetch_parses() {
        let cli = Cli::try_parse_from(["bullion-live", "fetch", "--compact"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Fetch { compact: true })));
    }
}
