use anyhow::{Context, bail};
use book_flow::{
    Action, AppState, Catalog, FlowConfig, FlowError, Level, RequestState, ResultMode, reduce,
};
use clap::Parser;
use recommendation_service::build_controller;
use std::path::PathBuf;
use tracing::Level as LogLevel;

#[derive(Parser, Debug)]
#[command(name = "recommend_cli", about = "Ask Gemini for book recommendations")]
struct Args {
    /// Genre from the catalog
    #[arg(long, default_value = "")]
    genre: String,

    /// Mood offered for the chosen genre
    #[arg(long, default_value = "")]
    mood: String,

    /// Beginner, Intermediate or Advanced
    #[arg(long, default_value = "")]
    level: String,

    /// Overrides RESULT_MODE
    #[arg(long)]
    mode: Option<ResultMode>,

    /// Number of requests to issue in sequence
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Overrides CATALOG_PATH
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the catalog and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn print_catalog(catalog: &Catalog) {
    println!("Genres and moods:");
    for genre in catalog.genres() {
        let moods = catalog.moods_for(genre);
        if moods.is_empty() {
            println!("  {genre}: (no moods)");
        } else {
            println!("  {genre}: {}", moods.join(", "));
        }
    }
    let levels: Vec<&str> = Level::ALL.iter().map(Level::as_str).collect();
    println!("Levels: {}", levels.join(", "));
}

/// Build the initial state the way the selectors would, rejecting choices the
/// catalog does not offer.
fn select(catalog: &Catalog, args: &Args, mode: ResultMode) -> book_flow::Result<AppState> {
    let genre = args.genre.trim();
    let mood = args.mood.trim();

    if !genre.is_empty() && !catalog.contains_genre(genre) {
        return Err(FlowError::UnknownGenre(genre.to_string()));
    }
    if !mood.is_empty() && !catalog.offers_mood(genre, mood) {
        return Err(FlowError::UnavailableMood {
            genre: genre.to_string(),
            mood: mood.to_string(),
        });
    }
    let level = Level::parse_optional(&args.level)?;

    Ok([
        Action::SetGenre(genre.to_string()),
        Action::SetMood(mood.to_string()),
        Action::SetLevel(level),
    ]
    .into_iter()
    .fold(AppState::new(mode), reduce))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            LogLevel::DEBUG
        } else {
            LogLevel::WARN
        })
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = FlowConfig::from_env().context("invalid configuration")?;
    if let Some(mode) = args.mode {
        config.result_mode = mode;
    }
    if let Some(path) = &args.catalog {
        config.catalog_path = Some(path.clone());
    }

    let catalog = config.load_catalog()?;
    if args.list {
        print_catalog(&catalog);
        return Ok(());
    }

    let mut state = select(&catalog, &args, config.result_mode)?;
    let controller = build_controller(&config)?;

    for attempt in 1..=args.repeat.max(1) {
        state = match controller.trigger(&state).await {
            Ok(next) => next,
            Err(FlowError::IncompleteSelection) => {
                print_catalog(&catalog);
                bail!(FlowError::IncompleteSelection);
            }
            Err(e) => return Err(e.into()),
        };
        if let RequestState::Error(message) = &state.request {
            eprintln!("Attempt {attempt}: {message}");
        }
    }

    for (index, entry) in state.recommendations.entries().iter().enumerate() {
        println!("--- Recommendation {} ---", index + 1);
        println!("{}", entry.trim());
    }

    if state.request.error_message().is_some() {
        std::process::exit(1);
    }
    Ok(())
}
