use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

/// Install the fmt subscriber. `RUST_LOG` wins over the configured level.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Level to install before dispatch. `serve` installs its own subscriber
/// from the loaded config, so the global one must not be set twice.
fn startup_log_level(cli: &cli::Cli) -> Option<&'static str> {
    match cli.command {
        cli::Command::Serve(_) => None,
        _ if cli.verbose => Some("debug"),
        _ => Some("warn"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    if let Some(level) = startup_log_level(&cli) {
        init_tracing(level);
    }
    commands::run_command(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defers_subscriber_install() {
        let cli = cli::Cli::try_parse_from(["tokmap", "-v", "serve"]).unwrap();
        assert_eq!(startup_log_level(&cli), None);
    }

    #[test]
    fn other_commands_install_at_startup() {
        let cli = cli::Cli::try_parse_from(["tokmap", "config"]).unwrap();
        assert_eq!(startup_log_level(&cli), Some("warn"));

        let cli = cli::Cli::try_parse_from(["tokmap", "-v", "list", "--journal", "b.jsonl"]).unwrap();
        assert_eq!(startup_log_level(&cli), Some("debug"));
    }
}
