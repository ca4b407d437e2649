//! notes-bible CLI application
//!
//! Command-line driver for the notes-bible library.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use notes_bible::notes::decode_strokes;
use notes_bible::{AppContainer, Config, DownloadStatus, HandwrittenNote, LiveQuery, NoteKey};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notes-bible")]
#[command(about = "Offline Bible reader with handwritten notes")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available versions and their download state
    Versions,

    /// Download a version into the local store
    Download {
        /// Version id, e.g. en_kjv
        id: String,
    },

    /// List the books of a downloaded version
    Books {
        id: String,
    },

    /// Print one chapter
    Read {
        id: String,
        book: String,
        chapter: u32,
    },

    /// Show or import handwritten notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Print a summary of the strokes stored at a location
    Show {
        id: String,
        book: String,
        chapter: u32,

        /// Verse number; omit for the whole-chapter note
        #[arg(long, default_value = "0")]
        verse: u32,
    },

    /// Save strokes from a JSON file at a location
    Import {
        id: String,
        book: String,
        chapter: u32,

        /// Stroke file (JSON format: [{"color": ..., "strokeWidth": ..., "points": [{"x": ..., "y": ...}]}])
        file: PathBuf,

        /// Verse number; omit for the whole-chapter note
        #[arg(long, default_value = "0")]
        verse: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    let app = AppContainer::new(config).context("Failed to open the local store")?;

    match cli.command {
        Commands::Versions => versions_command(&app).await?,
        Commands::Download { id } => download_command(&app, &id).await?,
        Commands::Books { id } => books_command(&app, &id).await?,
        Commands::Read { id, book, chapter } => read_command(&app, &id, &book, chapter).await?,
        Commands::Note { command } => match command {
            NoteCommands::Show {
                id,
                book,
                chapter,
                verse,
            } => note_show_command(&app, &id, &book, chapter, verse).await?,
            NoteCommands::Import {
                id,
                book,
                chapter,
                file,
                verse,
            } => note_import_command(&app, &id, &book, chapter, verse, file).await?,
        },
    }

    Ok(())
}

/// Current value of a live query
async fn current<T>(mut query: LiveQuery<T>) -> anyhow::Result<T> {
    match query.next().await {
        Some(result) => Ok(result?),
        None => bail!("Live query ended before emitting"),
    }
}

async fn versions_command(app: &AppContainer) -> anyhow::Result<()> {
    let versions = current(app.repository().observe_available_versions()).await?;

    println!("📚 {} versions available:", versions.len());
    for version in versions {
        let state = if version.is_downloaded {
            format!("✅ {} verses", version.total_verses)
        } else {
            "not downloaded".to_string()
        };
        println!(
            "   {:<8} {:<6} {} ({}) - {}",
            version.id, version.abbreviation, version.name, version.language, state
        );
    }

    Ok(())
}

async fn download_command(app: &AppContainer, id: &str) -> anyhow::Result<()> {
    let mut statuses = app.repository().download_version(id)?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {percent}%")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    bar.set_message(format!("Downloading {}", id));

    while let Some(status) = statuses.next().await {
        match status {
            DownloadStatus::InProgress(progress) => {
                bar.set_position((progress * 100.0).round() as u64);
            }
            DownloadStatus::Success(verses) => {
                bar.finish_with_message(format!("✅ Downloaded {}", id));
                println!("   📊 Verses: {}", verses);
            }
            DownloadStatus::Error(e) => {
                bar.abandon_with_message(format!("❌ Download of {} failed", id));
                bail!("{}", e);
            }
            DownloadStatus::Idle => {}
        }
    }

    Ok(())
}

async fn books_command(app: &AppContainer, id: &str) -> anyhow::Result<()> {
    let books = current(app.repository().observe_books(id)).await?;

    if books.is_empty() {
        eprintln!("❌ No books stored for {}; download it first", id);
        return Ok(());
    }

    for book in books {
        println!("{:>3}. {} ({} chapters)", book.book_index + 1, book.name, book.chapter_count);
    }

    Ok(())
}

async fn read_command(app: &AppContainer, id: &str, book: &str, chapter: u32) -> anyhow::Result<()> {
    let verses = current(app.repository().observe_chapter(id, book, chapter)).await?;

    if verses.is_empty() {
        eprintln!("❌ {} {} not found in {}", book, chapter, id);
        return Ok(());
    }

    println!("📖 {} {}", book, chapter);
    println!();
    for verse in verses {
        println!("{:>3} {}", verse.verse_number, verse.text);
    }

    Ok(())
}

async fn note_show_command(
    app: &AppContainer,
    id: &str,
    book: &str,
    chapter: u32,
    verse: u32,
) -> anyhow::Result<()> {
    let note = current(app.repository().observe_note(id, book, chapter, verse)).await?;

    let Some(note) = note.filter(|note| !note.is_empty()) else {
        println!("No note stored");
        return Ok(());
    };

    let points: usize = note.strokes.iter().map(|s| s.points.len()).sum();
    println!("✏️  {} ({})", note.reference(), id);
    println!("   Strokes: {}", note.strokes.len());
    println!("   Points: {}", points);
    if let Some(updated) = chrono::DateTime::from_timestamp_millis(note.updated_at) {
        println!("   Updated: {}", updated.to_rfc3339());
    }

    Ok(())
}

async fn note_import_command(
    app: &AppContainer,
    id: &str,
    book: &str,
    chapter: u32,
    verse: u32,
    file: PathBuf,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let strokes = decode_strokes(&content)
        .with_context(|| format!("{} is not a valid stroke file", file.display()))?;

    let note = HandwrittenNote::new(NoteKey::new(id, book, chapter, verse), strokes);
    app.repository().save_note(&note).await?;

    println!("✅ Saved {} strokes to {}", note.strokes.len(), note.reference());
    Ok(())
}
