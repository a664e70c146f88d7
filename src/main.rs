mod app;
mod catalog;
mod config;
mod keys;
mod logging;
mod message;
mod overlay;
mod projection;
mod query;
mod reducer;
mod runtime;
mod session;
mod store;
mod ui;

use app::{ViewSettings, ViewState};
use catalog::{CatalogClient, TmdbClient};
use clap::{Parser, Subcommand};
use config::Config;
use crossterm::event::{self, Event, KeyEventKind};
use message::Msg;
use overlay::RatingOverlay;
use projection::DisplayRecord;
use runtime::Runtime;
use session::GuestSessionManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{FileSessionStore, SessionStore};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Search a movie catalog and rate titles with a guest session
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key, overriding the config file and TMDB_API_KEY
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Catalog API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log filter, e.g. `debug` or `movie_rater=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the TUI (default)
    Run,
    /// Search the catalog once and print the results
    Search {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Print the guest session's rated movies
    Rated {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Forget the stored guest session
    ResetSession,
}

/// How long to wait for a key between redraws.
const EVENT_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };
    config.apply_api_key(cli.api_key);
    if let Some(url) = cli.base_url {
        config.api_base_url = url;
    }

    let dirs = config::project_dirs()?;
    let log_path = logging::init(&dirs.cache_dir().join("logs"), cli.log_level.as_deref())?;
    tracing::debug!(path = %log_path.display(), "logging initialised");
    let session_path = dirs.data_dir().join("session.json");

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::ResetSession = command {
        let mut store = FileSessionStore::new(session_path);
        store.clear()?;
        eprintln!("Cleared guest session at {}", store.path().display());
        return Ok(());
    }

    let api_key = match config.api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    };
    let client = TmdbClient::new(&config, &api_key)?;
    tracing::info!(base_url = %config.api_base_url, "catalog client ready");

    match command {
        Commands::Search { query, page } => {
            print_search(&client, &config, &query, page).await?;
        }
        Commands::Rated { page } => {
            let store = FileSessionStore::new(session_path);
            print_rated(&client, &config, Box::new(store), page).await?;
        }
        Commands::Run | Commands::ResetSession => {
            let store = FileSessionStore::new(session_path);
            let catalog: Arc<dyn CatalogClient> = Arc::new(client);
            run_tui(catalog, &config, Box::new(store)).await?;
        }
    }

    Ok(())
}

async fn run_tui(
    catalog: Arc<dyn CatalogClient>,
    config: &Config,
    store: Box<dyn SessionStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(catalog, tx.clone());
    let mut state = ViewState::new(store, ViewSettings::from(config));

    let _probe = match runtime::probe_target(&config.api_base_url) {
        Some((host, port)) => Some(runtime::spawn_connectivity_probe(
            host,
            port,
            config.connectivity_interval(),
            tx,
        )),
        None => {
            tracing::warn!(url = %config.api_base_url, "no probe target, connectivity checks disabled");
            None
        }
    };

    runtime.apply(&mut state, Msg::Started);

    // Init terminal
    let mut terminal = ratatui::init();

    // Main loop
    let result = run_app(&mut terminal, &runtime, &mut state, &mut rx, config.poll_interval()).await;

    // Restore terminal
    ratatui::restore();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    runtime: &Runtime,
    state: &mut ViewState,
    rx: &mut UnboundedReceiver<Msg>,
    poll_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_tick = Instant::now();
    loop {
        // Results from background tasks
        while let Ok(msg) = rx.try_recv() {
            runtime.apply(state, msg);
        }

        if last_tick.elapsed() >= poll_interval {
            last_tick = Instant::now();
            runtime.apply(state, Msg::Tick);
        }

        terminal.draw(|frame| ui::render(state, frame))?;

        if state.should_quit {
            return Ok(());
        }

        if event::poll(EVENT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                for msg in keys::handle_key(state, key) {
                    runtime.apply(state, msg);
                }
            }
        }
    }
}

async fn print_search(
    client: &TmdbClient,
    config: &Config,
    query: &str,
    page: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let genres = client.genres().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "genre lookup failed");
        Vec::new()
    });
    let result = client.search_movies(query, page).await?;
    let records = projection::project_list(
        &result.results,
        &genres,
        &RatingOverlay::default(),
        &config.poster_base_url,
    );

    let pages = result.total_results.div_ceil(u64::from(config.page_size.max(1)));
    println!("{} results, page {} of {}", result.total_results, page, pages.max(1));
    for record in &records {
        print_record(record);
    }
    Ok(())
}

async fn print_rated(
    client: &TmdbClient,
    config: &Config,
    store: Box<dyn SessionStore>,
    page: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = GuestSessionManager::new(store);
    let rated = runtime::fetch_rated(client, &mut session, page).await?;

    let genres = client.genres().await.unwrap_or_default();
    let mut overlay = RatingOverlay::default();
    overlay.apply(rated);
    let movies = overlay
        .rated()
        .map(|r| r.results.iter().map(|item| &item.movie).collect::<Vec<_>>())
        .unwrap_or_default();
    let records = projection::project_list(movies, &genres, &overlay, &config.poster_base_url);

    println!(
        "{} rated movies, {} on page {}",
        overlay.total_count(),
        overlay.entries().len(),
        page
    );
    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &DisplayRecord) {
    let badge = record
        .rating_badge
        .as_ref()
        .map(|b| format!("[{}] ", b.text))
        .unwrap_or_default();
    let date = record.formatted_date.as_deref().unwrap_or("unknown date");
    println!("{}{} ({})", badge, record.title, date);
    if !record.genre_names.is_empty() {
        println!("    {}", record.genre_names.join(", "));
    }
    if record.user_rating > 0.0 {
        println!("    your rating: {:.1}", record.user_rating);
    }
    if let Some(url) = &record.poster_url {
        println!("    {}", url);
    }
}
