use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod config;
mod db;
mod error;
mod extract;
mod host;
mod models;
mod services;
mod tui;

use app::App;
use config::Config;
use db::Repository;
use error::{AppError, Result};
use extract::{format_context, ArticleFetcher};
use models::Hit;
use services::FrontPageClient;
use tui::{draw, handle_key_event, TuiHost};

enum Mode {
    Interactive,
    List,
    Extract { hn_id: String, url: String },
}

fn parse_args(args: &[String]) -> Result<Mode> {
    match args.get(1).map(String::as_str) {
        None => Ok(Mode::Interactive),
        Some("--list") => Ok(Mode::List),
        Some("--extract") => match (args.get(2), args.get(3)) {
            (Some(hn_id), Some(url)) => Ok(Mode::Extract {
                hn_id: hn_id.clone(),
                url: url.clone(),
            }),
            _ => Err(AppError::Config(
                "usage: hn-reader --extract <hn_id> <url>".to_string(),
            )),
        },
        Some(other) => Err(AppError::Config(format!("unknown argument: {other}"))),
    }
}

fn init_logging(interactive: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    if interactive {
        // Keep the alternate screen clean
        let path = Config::log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mode = parse_args(&args)?;

    init_logging(matches!(mode, Mode::Interactive))?;

    // Load configuration
    let config = Config::load()?;

    match mode {
        Mode::List => {
            let mut repository = Repository::new(config.store_path());
            return list_front_page(&config, &mut repository, &mut io::stdout().lock()).await;
        }
        Mode::Extract { hn_id, url } => return extract_once(&config, &hn_id, &url).await,
        Mode::Interactive => {}
    }

    // Initialize app
    let host = TuiHost::new(&config)?;
    let mut app = App::new(&config, host)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;
    app.close();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App<TuiHost>) -> Result<()> {
    terminal.draw(|frame| draw(frame, app))?;
    app.refresh().await;

    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Pick up a finished article extraction
        app.poll_extraction_result();

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.show_help) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// Prints the front page. A broken store only costs the read markers.
async fn list_front_page(
    config: &Config,
    repository: &mut Repository,
    out: &mut impl Write,
) -> Result<()> {
    let hits = FrontPageClient::new(config)?.fetch().await?;

    let items: Vec<_> = hits.iter().map(Hit::seen_item).collect();
    let ids: Vec<&str> = hits.iter().map(|h| h.hn_id.as_str()).collect();
    let read = match repository
        .upsert_seen(&items)
        .and_then(|()| repository.lookup_read(&ids))
    {
        Ok(read) => read,
        Err(e) => {
            tracing::warn!("Read state unavailable: {}", e);
            eprintln!("Warning: read state unavailable: {e}");
            HashSet::new()
        }
    };

    for hit in &hits {
        let marker = if read.contains(&hit.hn_id) { " " } else { "*" };
        writeln!(
            out,
            "{marker} {:>5} {:>4}c  {}  {}",
            hit.points,
            hit.num_comments,
            hit.title,
            hit.link()
        )?;
    }

    Ok(())
}

async fn extract_once(config: &Config, hn_id: &str, url: &str) -> Result<()> {
    let article = ArticleFetcher::new(config)?.fetch(url).await?;
    let context = format_context(hn_id, &article, Utc::now());
    println!("{}", context.text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    const LISTING: &str = r#"{"hits":[{"objectID":"42","title":"Stub story","url":"https://example.com/a","points":10,"num_comments":3}]}"#;

    fn spawn_listing() -> (String, thread::JoinHandle<()>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let url = format!("http://{}/front", server.server_addr());
        let handle = thread::spawn(move || {
            if let Some(request) = server.incoming_requests().next() {
                let response = tiny_http::Response::from_string(LISTING).with_header(
                    "Content-Type: application/json"
                        .parse::<tiny_http::Header>()
                        .unwrap(),
                );
                let _ = request.respond(response);
            }
        });
        (url, handle)
    }

    #[tokio::test]
    async fn listing_survives_corrupt_store() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("read-state.json");
        std::fs::write(&store, "{ not json").unwrap();

        let (url, handle) = spawn_listing();
        let config = Config {
            front_page_url: url,
            ..Config::default()
        };
        let mut repository = Repository::new(&store);
        let mut out = Vec::new();

        list_front_page(&config, &mut repository, &mut out)
            .await
            .unwrap();
        handle.join().unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with('*'));
        assert!(printed.contains("Stub story"));
        assert_eq!(std::fs::read_to_string(&store).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn listing_marks_read_stories() {
        let dir = TempDir::new().unwrap();
        let mut repository = Repository::new(dir.path().join("read-state.json"));
        repository
            .upsert_read(&[models::SeenItem::new("42")])
            .unwrap();

        let (url, handle) = spawn_listing();
        let config = Config {
            front_page_url: url,
            ..Config::default()
        };
        let mut out = Vec::new();

        list_front_page(&config, &mut repository, &mut out)
            .await
            .unwrap();
        handle.join().unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with(' '));
        assert_eq!(repository.all_articles().unwrap()[0].title.as_deref(), Some("Stub story"));
    }

    #[test]
    fn extract_needs_id_and_url() {
        let args: Vec<String> = ["hn-reader", "--extract", "1"].map(String::from).to_vec();
        assert!(matches!(parse_args(&args), Err(AppError::Config(_))));
    }
}
