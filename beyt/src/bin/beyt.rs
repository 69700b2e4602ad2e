//! Command-line client for the poetry search API
//!
//! Run with: cargo run --bin beyt -- search عشق --poet حافظ
//! Logs go to stderr, filtered by RUST_LOG.

use anyhow::{Context, Result};
use beyt::{
    dictionary_url, extract_lookup_word, format_persian_date, format_persian_date_with_month,
    ClientConfig, DisplayLine, Library, LoadOutcome, SearchExcerpt, SearchSession,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API base URL
    #[arg(long, env = "BEYT_API_BASE_URL")]
    base_url: Option<String>,

    /// Path of the local library database
    #[arg(long, default_value = "beyt.sqlite")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search verses
    Search {
        query: String,
        /// Restrict to a poet (repeatable)
        #[arg(long = "poet")]
        poets: Vec<String>,
        /// Only verses the user liked
        #[arg(long)]
        liked_only: bool,
        /// Backend pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// List poets
    Poets,
    /// Show a poet's details
    Poet { id: u64 },
    /// Show a whole poem
    Poem { id: i64 },
    /// Like a verse in the local library
    Like { verse_id: i64 },
    /// Remove a like from the local library
    Unlike { verse_id: i64 },
    /// List liked verse ids
    Liked,
    /// Format a date in the Persian calendar
    Date { input: String },
    /// Dictionary link for the first word of a text
    Lookup { text: String },
}

fn print_lines(lines: &[DisplayLine]) {
    for line in lines {
        match line {
            DisplayLine::Couplet { first, second, .. } => {
                println!("    {}  ***  {}", first.text, second.text)
            }
            DisplayLine::FullWidth { text, .. } => println!("    {}", text),
        }
    }
}

fn print_excerpt(index: usize, excerpt: &SearchExcerpt) {
    println!(
        "{}. {} - {} [{}]",
        index + 1,
        excerpt.poet_name,
        excerpt.poem_title,
        excerpt.category
    );
    print_lines(&excerpt.display_lines);
    if excerpt.has_more {
        println!("    ...");
    }
}

async fn search(
    session: &SearchSession,
    library: &Library,
    query: String,
    poets: Vec<String>,
    liked_only: bool,
    pages: u32,
) -> Result<()> {
    session
        .start_search(query, poets, liked_only)
        .await
        .context("Search failed")?;

    for _ in 1..pages {
        match session.load_more().await.context("Loading more results failed")? {
            LoadOutcome::Appended { .. } => {}
            LoadOutcome::AlreadyLoading | LoadOutcome::Exhausted => break,
        }
    }

    let excerpts = session.excerpts();
    for (index, excerpt) in excerpts.iter().enumerate() {
        print_excerpt(index, excerpt);
        library.sync_from_lines(excerpt.display_lines.clone())?;
    }
    println!(
        "\n{} of {} results",
        excerpts.len(),
        session.snapshot().total_count
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    match args.command {
        Command::Search { query, poets, liked_only, pages } => {
            let session = SearchSession::from_config(&config)?;
            let library = Library::new(args.db).context("Failed to open library")?;
            search(&session, &library, query, poets, liked_only, pages).await?;
        }
        Command::Poets => {
            let session = SearchSession::from_config(&config)?;
            for poet in session.load_poets().await.context("Failed to load poets")? {
                println!("{:>4}  {}", poet.id, poet.name);
            }
        }
        Command::Poet { id } => {
            let session = SearchSession::from_config(&config)?;
            let poet = session.fetch_poet(id).await.context("Failed to load poet")?;
            println!("{} (#{})", poet.name, poet.poet_id);
            if !poet.description.is_empty() {
                println!("{}", poet.description);
            }
        }
        Command::Poem { id } => {
            let session = SearchSession::from_config(&config)?;
            let poem = session.fetch_poem(id).await.context("Failed to load poem")?;
            println!("{} - {} [{}]", poem.poet_name, poem.title, poem.category);
            print_lines(&poem.lines);
        }
        Command::Like { verse_id } => {
            let library = Library::new(args.db).context("Failed to open library")?;
            if !library.like(verse_id)? {
                println!("Verse {verse_id} was already liked");
            }
        }
        Command::Unlike { verse_id } => {
            let library = Library::new(args.db).context("Failed to open library")?;
            if !library.unlike(verse_id)? {
                println!("Verse {verse_id} was not liked");
            }
        }
        Command::Liked => {
            let library = Library::new(args.db).context("Failed to open library")?;
            for id in library.liked_ids()? {
                println!("{id}");
            }
        }
        Command::Date { input } => {
            println!("{}", format_persian_date(input.clone()));
            println!("{}", format_persian_date_with_month(input));
        }
        Command::Lookup { text } => match extract_lookup_word(text).and_then(dictionary_url) {
            Some(url) => println!("{url}"),
            None => anyhow::bail!("No word to look up"),
        },
    }

    Ok(())
}
