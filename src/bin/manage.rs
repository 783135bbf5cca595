//! Issue tracker management CLI
//!
//! `manage runserver` serves the API; `manage check` verifies settings and the
//! document store; `manage showurls` lists the mounted URL patterns.

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use console::style;
use issue_tracker::apps::issues::{IssueRepository, url_patterns};
use issue_tracker::config::Settings;
use issue_tracker::nosql;
use issue_tracker::server::{HttpServer, ShutdownCoordinator, shutdown_signal};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "manage")]
#[command(about = "Issue tracker management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the API server
	Runserver {
		/// Server address (default: host and port from settings)
		#[arg(value_name = "ADDRESS")]
		address: Option<String>,
	},

	/// Check settings and document store connectivity
	Check,

	/// Display all registered URL patterns
	Showurls,
}

fn load_settings(verbosity: u8) -> anyhow::Result<Settings> {
	let mut settings = Settings::load().context("failed to load settings")?;
	match verbosity {
		0 => {}
		1 => settings.logging.level = "debug".to_string(),
		_ => settings.logging.level = "trace".to_string(),
	}
	issue_tracker::logging::init(&settings.logging);
	Ok(settings)
}

async fn run_runserver(address: Option<String>, verbosity: u8) -> anyhow::Result<()> {
	let settings = load_settings(verbosity)?;

	let addr: SocketAddr = match address {
		Some(address) => address
			.parse()
			.with_context(|| format!("invalid address '{}'", address))?,
		None => settings.socket_addr()?,
	};

	let backend = nosql::connect(&settings.database)
		.await
		.context("failed to configure document store")?;
	let repository = IssueRepository::new(backend).with_collection(&settings.database.collection);
	let router = url_patterns(repository).map_err(|e| anyhow!(e))?;

	let coordinator =
		ShutdownCoordinator::new(Duration::from_secs(settings.server.shutdown_timeout_secs));
	let signal = coordinator.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		signal.shutdown();
	});

	println!(
		"{} http://{}/api/issues/{{project}}",
		style("Serving issue tracker at").green().bold(),
		addr
	);

	HttpServer::new(Arc::new(router))
		.with_max_body_bytes(settings.server.max_body_bytes)
		.listen_with_shutdown(addr, coordinator)
		.await
		.map_err(|e| anyhow!(e))
		.context("server error")
}

async fn run_check(verbosity: u8) -> anyhow::Result<()> {
	let settings = load_settings(verbosity)?;
	settings.socket_addr()?;

	let backend = nosql::connect(&settings.database)
		.await
		.context("failed to configure document store")?;
	backend
		.health_check()
		.await
		.with_context(|| format!("{} store is unreachable", backend.backend_type()))?;

	println!(
		"{} {} store at {} (database {})",
		style("OK").green().bold(),
		backend.backend_type(),
		settings.database.url,
		settings.database.name
	);
	Ok(())
}

fn run_showurls() -> anyhow::Result<()> {
	let backend = Arc::new(nosql::backends::memory::InMemoryBackend::new());
	let router = url_patterns(IssueRepository::new(backend)).map_err(|e| anyhow!(e))?;
	for pattern in router.patterns() {
		println!("{}", pattern);
	}
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let result = match cli.command {
		Commands::Runserver { address } => run_runserver(address, cli.verbosity).await,
		Commands::Check => run_check(cli.verbosity).await,
		Commands::Showurls => run_showurls(),
	};

	if let Err(e) = result {
		eprintln!("{} {:#}", style("Error:").red().bold(), e);
		process::exit(1);
	}

	Ok(())
}
