use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod app;
mod config;
mod controller;
mod error;
mod handler;
mod logging;
mod stream;
mod transcript;
mod transport;
mod tui;
mod ui;

use app::App;
use config::Config;
use transport::HttpTransport;

#[derive(Parser)]
#[command(name = "askchat")]
#[command(about = "Chat with an /ask endpoint, streaming answers as they arrive")]
#[command(version)]
struct Cli {
    /// Base URL of the server hosting the ask endpoint
    #[arg(short, long, env = "ASKCHAT_SERVER")]
    server: Option<String>,

    /// Where to write the log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Persist the effective server URL to the config file
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    logging::init(&log_path)?;

    let config = Config::load().with_server(cli.server);
    if cli.save {
        let path = config.save()?;
        tracing::info!(path = %path.display(), "saved config");
    }

    let transport = HttpTransport::new(&config.server_url, &config.ask_path);
    tracing::info!(endpoint = %transport.url(), "starting askchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, transport).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "askchat exited with an error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, transport: HttpTransport) -> Result<()> {
    let mut events = tui::EventHandler::new();
    let endpoint = transport.url().to_string();
    let mut app = App::new(transport, events.view_sender(), endpoint);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    Ok(())
}
