use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tokmap_server::{ServerConfig, TokmapServer};
use tokmap_store::{IdentifierResolver, JournalBindingStore};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Issue(args) => cmd_issue(args, &cli.format),
        Command::Resolve(args) => cmd_resolve(args, &cli.format),
        Command::List(args) => cmd_list(args, &cli.format),
        Command::Config(args) => cmd_config(args),
    }
}

/// Load the config file if given, otherwise start from defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

/// Config for `serve`: file, then flag overrides, then validation.
pub fn serve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid --bind address: {bind}"))?;
    }
    if let Some(journal) = &args.journal {
        config.journal_path = Some(journal.clone());
    }
    config.validate()?;
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(&args)?;
    crate::init_tracing(&config.log_level);
    let server = TokmapServer::new(config)?;
    println!(
        "{} tokmap listening on {}",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold()
    );
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn open_journal(path: &Path) -> anyhow::Result<IdentifierResolver> {
    let store = JournalBindingStore::open(path)
        .with_context(|| format!("opening journal {}", path.display()))?;
    Ok(IdentifierResolver::new(Arc::new(store)))
}

fn cmd_issue(args: IssueArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let resolver = open_journal(&args.journal)?;
    let issued = resolver.issue(&args.kind, &args.slug)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&issued.binding)?),
        OutputFormat::Text => {
            let note = if issued.created { "new".green() } else { "existing".dimmed() };
            println!("{} ({note})", issued.binding.token.to_string().yellow().bold());
        }
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let resolver = open_journal(&args.journal)?;
    match resolver.resolve(&args.token)? {
        Some(key) => {
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "slug": key.slug.as_str(), "type": key.kind })
                ),
                OutputFormat::Text => println!("{} {}", key.kind.to_string().cyan(), key.slug),
            }
            Ok(())
        }
        None => {
            eprintln!("{} token not found: {}", "✗".red().bold(), args.token);
            std::process::exit(1);
        }
    }
}

fn cmd_list(args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let resolver = open_journal(&args.journal)?;
    let bindings = resolver.bindings()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bindings)?),
        OutputFormat::Text => {
            if bindings.is_empty() {
                println!("No bindings.");
            }
            for b in &bindings {
                println!(
                    "{}  {:<8} {}  {}",
                    b.token.to_string().yellow(),
                    b.key.kind.to_string().cyan(),
                    b.key.slug,
                    b.issued_at.to_rfc3339().dimmed()
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
