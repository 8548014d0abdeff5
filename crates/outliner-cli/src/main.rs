//! Command-line access to an outliner notes directory.
//!
//! Usage:
//!   outliner-cli --notes ~/notes pages
//!   outliner-cli show Groceries
//!   outliner-cli split Groceries 0.1 4
//!   outliner-cli parse "TODO [#A] Buy milk [[Groceries]]"

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;

use outliner_config::{Config, ConfigError};
use outliner_engine::editing::Patch;
use outliner_engine::session::{CollapseState, JsonFlagStore};
use outliner_engine::{
    Block, BlockPath, FilePageStore, PageId, PageStore, Session, io, parse_block,
};

#[derive(Parser, Debug)]
#[command(name = "outliner-cli")]
#[command(about = "Inspect and edit outliner pages from the command line")]
struct Args {
    /// Notes directory; defaults to `notes_path` from the config file
    #[arg(short, long)]
    notes: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every page in the notes directory
    Pages,
    /// Print a page's outline with block paths
    Show {
        /// Page to show; defaults to the configured start page
        page: Option<String>,
    },
    /// Parse block content and print its segments and markers as JSON
    Parse { text: String },
    /// Replace a block's content
    Set {
        page: String,
        path: BlockPath,
        text: String,
    },
    /// Insert a new block at a path
    Insert {
        page: String,
        path: BlockPath,
        text: String,
    },
    /// Split a block at a character offset
    Split {
        page: String,
        path: BlockPath,
        offset: usize,
    },
    /// Merge a block into the block before it
    Merge { page: String, path: BlockPath },
    /// Make a block the last child of its previous sibling
    Indent { page: String, path: BlockPath },
    /// Make a block the next sibling of its parent
    Outdent { page: String, path: BlockPath },
    /// Delete a block and its children
    Remove { page: String, path: BlockPath },
    /// Toggle whether a block is shown collapsed
    Collapse { page: String, path: BlockPath },
}

/// Config with the notes directory checked, exiting with a message if it is
/// unusable.
fn load_config(notes: Option<PathBuf>) -> Result<Config> {
    let config = match Config::resolve(notes) {
        Ok(config) => config,
        Err(e @ ConfigError::NoNotesPath(_)) => {
            eprintln!("Error: {e}");
            eprintln!("Pass --notes <dir> or create the config file");
            process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load config file"),
    };

    if let Err(e) = io::validate_notes_dir(&config.notes_path) {
        eprintln!(
            "Error: Notes path '{}' is invalid: {e}",
            config.notes_path.display()
        );
        process::exit(1);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let notes = args.notes;

    match args.command {
        Command::Parse { text } => print_json(&parse_block(&text)),
        Command::Pages => {
            let config = load_config(notes)?;
            let store = FilePageStore::open(config.notes_path)?;
            for page in store.list_pages().await? {
                println!("{page}");
            }
            Ok(())
        }
        Command::Show { page } => {
            let session = open_page(notes, page).await?;
            print_outline(&session);
            Ok(())
        }
        Command::Set { page, path, text } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_json(&session.save_block(&path, &text).await?)
        }
        Command::Insert { page, path, text } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_json(&session.insert_block(&path, &text).await?)
        }
        Command::Split { page, path, offset } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_patch(session.split(&path, offset).await?)
        }
        Command::Merge { page, path } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_patch(session.merge(&path).await?)
        }
        Command::Indent { page, path } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_patch(session.indent(&path).await?)
        }
        Command::Outdent { page, path } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_patch(session.outdent(&path).await?)
        }
        Command::Remove { page, path } => {
            let mut session = open_page(notes, Some(page)).await?;
            print_patch(session.remove(&path).await?)
        }
        Command::Collapse { page, path } => {
            let mut session = open_page(notes, Some(page)).await?;
            let collapsed = session.toggle_collapsed(&path)?;
            info!("Block {path} is now {}", if collapsed { "collapsed" } else { "expanded" });
            Ok(())
        }
    }
}

/// Open a session on `page`, or on the configured start page.
async fn open_page(notes: Option<PathBuf>, page: Option<String>) -> Result<Session<FilePageStore>> {
    let config = load_config(notes)?;
    debug!("Using notes directory {}", config.notes_path.display());
    let flags = JsonFlagStore::open(config.collapse_state_file())?;
    let store = FilePageStore::open(config.notes_path)?;
    let mut session =
        Session::new(store).with_collapse_state(CollapseState::new(Box::new(flags)));

    let page = page.unwrap_or(config.start_page);
    session.navigate_to(&PageId::from(page)).await?;
    Ok(session)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_patch(patch: Option<Patch>) -> Result<()> {
    match patch {
        Some(patch) => print_json(&patch),
        None => {
            info!("Nothing to do");
            Ok(())
        }
    }
}

fn print_outline<S: PageStore>(session: &Session<S>) {
    let Some(page) = session.page() else {
        return;
    };
    println!("# {}", page.title);
    for (key, value) in &page.properties {
        println!("{key}:: {value}");
    }
    println!();
    for (index, block) in page.tree.blocks().iter().enumerate() {
        print_block(session, block, BlockPath::new(vec![index]));
    }

    if !page.backlinks.is_empty() {
        println!();
        println!("Linked references:");
        for backlink in &page.backlinks {
            println!("  {}: {}", backlink.source_page, backlink.content);
        }
    }
}

fn print_block<S: PageStore>(session: &Session<S>, block: &Block, path: BlockPath) {
    let indent = "  ".repeat(block.depth());
    let collapsed = session.is_collapsed(block.id());
    let bullet = if collapsed && block.has_children() { "+" } else { "-" };
    println!("{indent}{bullet} [{path}] {}", block.content());
    if collapsed {
        return;
    }
    for (index, child) in block.children().iter().enumerate() {
        print_block(session, child, path.child(index));
    }
}
