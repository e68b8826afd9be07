use anyhow::{anyhow, bail, Context};
use clap::Parser;
use downloads_janitor::{startup, JanitorConfig, NotifySignal, Organizer, WatchLoop, WatchLoopConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "janitor")]
#[command(about = "Moves files dropped into a watched folder into destination folders by extension")]
struct Cli {
	/// Path to rules.json (defaults to config/rules.json next to the executable)
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Watch this folder instead of the configured one
	#[arg(short, long)]
	watch: Option<PathBuf>,

	/// Enable verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Organize the folder once and exit
	#[arg(long)]
	once: bool,

	/// Delay after each pass in milliseconds
	#[arg(long, default_value_t = 250)]
	debounce_ms: u64,

	/// Register the janitor to start at logon
	#[arg(long)]
	register_startup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt().with_max_level(level).init();

	let config_path = cli.config.unwrap_or_else(JanitorConfig::default_path);
	let mut config = JanitorConfig::load(&config_path).context("Failed to load configuration")?;
	match cli.watch {
		Some(watch) => config.set_watch_folder(watch)?,
		None => config.validate_watch_folder()?,
	}

	if cli.register_startup {
		match std::env::current_exe() {
			Ok(executable) => {
				if let Err(e) = startup::register(&executable) {
					warn!("{}", e);
				}
			}
			Err(e) => warn!("Executable path unavailable; cannot configure startup: {}", e),
		}
	}

	let watch_folder = config.watch_folder.clone();
	let organizer = Organizer::new(watch_folder.clone(), config.rules);

	if cli.once {
		info!("Organizing {} once", watch_folder.display());
		if !organizer.organize_once() {
			bail!("One or more files could not be organized");
		}
		return Ok(());
	}

	// Subscribe before the startup pass so nothing dropped during it is missed
	let signal = NotifySignal::subscribe(&watch_folder)?;
	let loop_config = WatchLoopConfig {
		debounce: Duration::from_millis(cli.debounce_ms),
	};
	let mut watch_loop = WatchLoop::new(signal, organizer, loop_config);

	// A detached thread, so Ctrl-C does not have to wait for a blocked wait() to return
	let (done_tx, done_rx) = tokio::sync::oneshot::channel();
	std::thread::Builder::new()
		.name("watch-loop".to_string())
		.spawn(move || {
			let _ = done_tx.send(watch_loop.run());
		})
		.context("Failed to start watch loop thread")?;

	tokio::select! {
		finished = done_rx => {
			let result = finished.map_err(|_| anyhow!("Watch loop thread exited without a result"))?;
			if let Err(e) = result {
				error!("File monitoring stopped unexpectedly: {}", e);
				return Err(e).context("File monitoring stopped unexpectedly");
			}
			Ok(())
		}
		_ = tokio::signal::ctrl_c() => {
			info!("Shutting down janitor...");
			Ok(())
		}
	}
}
