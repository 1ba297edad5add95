// BookFlow - Personal Reading Tracker
// Copyright (C) 2025 BookFlow contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


use anyhow::{anyhow, Context};
use bookflow::api::{search_all, SearchClient, DEFAULT_SEARCH_LIMIT};
use bookflow::challenge::{daily_goals, YearlyProgress};
use bookflow::shelf::{sort_books, SortKey};
use bookflow::storage::models::{NewBook, NewReadingChallenge, NewShelf, ReadingStatus};
use bookflow::storage::{profiles, queries, Database};
use bookflow::sync::{buddies, SyncClient, SyncConfig, SyncManager};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookflow-cli")]
#[command(about = "BookFlow - personal reading tracker", long_about = None)]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Username to act as (defaults to the primary profile)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Sync backend base URL (enables best-effort mirroring)
    #[arg(long, global = true)]
    sync_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a local profile
    Profile {
        username: String,
        /// Display name shown to buddies
        #[arg(short, long)]
        display_name: Option<String>,
    },
    /// Add a book to the catalogue
    Add {
        title: String,
        /// Author (repeatable)
        #[arg(short, long)]
        author: Vec<String>,
        /// want-to-read, reading, read or no-status
        #[arg(short, long, default_value = "want-to-read")]
        status: String,
        #[arg(short, long)]
        pages: Option<i32>,
    },
    /// Search the metadata providers
    Search {
        query: String,
    },
    /// List books on a shelf
    List {
        /// Shelf name (defaults to the whole catalogue)
        shelf: Option<String>,
        /// title, author, series, date-added, rating, pages or manual
        #[arg(long, default_value = "title")]
        sort: String,
    },
    /// Change a book's reading status
    Status {
        book_uid: String,
        status: String,
    },
    /// Create a custom shelf
    ShelfCreate { name: String },
    /// Put a book on a custom shelf
    ShelfAdd { book_uid: String, shelf: String },
    /// Set the yearly reading challenge
    Challenge {
        target_books: i32,
        #[arg(long)]
        year: Option<i32>,
        /// Optional flat weekly page target
        #[arg(long)]
        weekly_pages: Option<i32>,
    },
    /// Record a cumulative pages-read entry for today (or --date)
    Log {
        cumulative_pages: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show daily page goals over a date range
    Goals {
        from: NaiveDate,
        to: NaiveDate,
        total_pages: i64,
        #[arg(long, default_value_t = 0)]
        start_page: i64,
    },
    /// Show yearly challenge progress
    Progress {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Send a friend request
    BuddyRequest { to: String },
    /// Accept a pending friend request by id
    BuddyAccept { request_id: i64 },
    /// Share a book with an accepted buddy
    Share { book_uid: String, buddy: String },
    /// Show the shared-books inbox
    Inbox,
    /// Push local collections to the sync backend
    Push,
    /// Pull remote collections (last write wins)
    Pull,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookflow=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli.db.clone().unwrap_or_else(Database::get_default_path);
    let db = Database::new(&db_path)
        .await
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    let sync = match &cli.sync_url {
        Some(url) => Some(SyncManager::new(SyncClient::new(SyncConfig::new(url))?)),
        None => None,
    };

    let result = run(&cli, &db, sync.as_ref()).await;
    db.close().await.ok();
    result
}

async fn resolve_user(cli: &Cli, db: &Database) -> anyhow::Result<String> {
    if let Some(user) = &cli.user {
        return Ok(user.clone());
    }
    let primary = profiles::get_primary_profile(db.pool()).await?;
    let profile = primary.ok_or_else(|| anyhow!("no profile yet; run `bookflow-cli profile <username>`"))?;
    let value: serde_json::Value = serde_json::from_str(&profile)?;
    Ok(value["username"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

async fn run(cli: &Cli, db: &Database, sync: Option<&SyncManager>) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Profile { username, display_name } => {
            let profile = serde_json::json!({
                "username": username,
                "display_name": display_name.clone().unwrap_or_else(|| username.clone()),
                "settings": {},
            });
            profiles::save_profile(db.pool(), username, &profile.to_string()).await?;
            println!("Profile '{}' ready", username);
        }
        Commands::Add { title, author, status, pages } => {
            let username = resolve_user(cli, db).await?;
            let mut book = NewBook::new(username.clone(), title.clone());
            book.authors = author.clone();
            book.status = ReadingStatus::from_str(status);
            book.page_count = *pages;
            let book_id = queries::insert_book(db.pool(), &book).await?;
            let stored = queries::find_book_by_id(db.pool(), book_id)
                .await?
                .ok_or_else(|| anyhow!("book {} missing after insert", book_id))?;
            println!("Added '{}' [{}]", stored.title, stored.book_uid);
        }
        Commands::Search { query } => {
            let client = SearchClient::new()?;
            let results = search_all(&client, query, DEFAULT_SEARCH_LIMIT).await?;
            for meta in results.all() {
                let year = meta
                    .published_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "----".to_string());
                println!(
                    "[{}] {} ({}) - {}",
                    meta.provider.as_str(),
                    meta.title,
                    year,
                    meta.authors.join(", ")
                );
            }
            if results.is_empty() {
                println!("No results for '{}'", query);
            }
        }
        Commands::List { shelf, sort } => {
            let username = resolve_user(cli, db).await?;
            let key = SortKey::from_str(sort).ok_or_else(|| anyhow!("unknown sort key '{}'", sort))?;

            let mut books = match shelf {
                Some(name) => {
                    let shelf = queries::find_shelf_by_name(db.pool(), &username, name)
                        .await?
                        .ok_or_else(|| anyhow!("no shelf named '{}'", name))?;
                    queries::list_books_for_shelf(db.pool(), &shelf).await?
                }
                None => queries::list_books(db.pool(), &username).await?,
            };

            sort_books(&mut books, key, key.default_direction());
            for book in &books {
                println!(
                    "{:<12} {:<10} {}",
                    book.book_uid.get(0..8).unwrap_or(&book.book_uid),
                    book.status,
                    book.title_with_series()
                );
            }
            println!("{} book(s)", books.len());
        }
        Commands::Status { book_uid, status } => {
            let username = resolve_user(cli, db).await?;
            let book = queries::find_book_by_uid(db.pool(), &username, book_uid)
                .await?
                .ok_or_else(|| anyhow!("no book with uid '{}'", book_uid))?;
            queries::set_book_status(db.pool(), book.book_id, ReadingStatus::from_str(status)).await?;
            println!("'{}' is now {}", book.title, status);
        }
        Commands::ShelfCreate { name } => {
            let username = resolve_user(cli, db).await?;
            queries::create_shelf(db.pool(), &NewShelf::new(username, name.clone())).await?;
            println!("Shelf '{}' created", name);
        }
        Commands::ShelfAdd { book_uid, shelf } => {
            let username = resolve_user(cli, db).await?;
            let book = queries::find_book_by_uid(db.pool(), &username, book_uid)
                .await?
                .ok_or_else(|| anyhow!("no book with uid '{}'", book_uid))?;
            let shelf = queries::find_shelf_by_name(db.pool(), &username, shelf)
                .await?
                .ok_or_else(|| anyhow!("no shelf named '{}'", shelf))?;
            queries::add_book_to_shelf(db.pool(), book.book_id, shelf.shelf_id).await?;
            println!("'{}' added to '{}'", book.title, shelf.name);
        }
        Commands::Challenge { target_books, year, weekly_pages } => {
            let username = resolve_user(cli, db).await?;
            let year = year.unwrap_or_else(|| Utc::now().year());
            let mut challenge = NewReadingChallenge::new(username, year, *target_books);
            challenge.weekly_page_target = *weekly_pages;
            queries::upsert_challenge(db.pool(), &challenge).await?;
            println!("{} challenge: {} books", year, target_books);
        }
        Commands::Log { cumulative_pages, date } => {
            let username = resolve_user(cli, db).await?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            queries::record_reading_log(db.pool(), &username, date, *cumulative_pages, None).await?;
            println!("{}: at page {}", date, cumulative_pages);
        }
        Commands::Goals { from, to, total_pages, start_page } => {
            let username = resolve_user(cli, db).await?;
            let logs = queries::list_reading_logs(db.pool(), &username, *from, *to, None).await?;
            let entries = queries::reading_log_map(&logs);
            for goal in daily_goals(*from, *to, *total_pages, *start_page, &entries) {
                println!(
                    "{}  target {:>4}  read {:>4}  at page {}",
                    goal.date, goal.target_pages, goal.actual_pages, goal.cumulative_pages
                );
            }
        }
        Commands::Progress { year } => {
            let username = resolve_user(cli, db).await?;
            let year = year.unwrap_or_else(|| Utc::now().year());
            let challenge = queries::find_challenge(db.pool(), &username, year)
                .await?
                .ok_or_else(|| anyhow!("no {} challenge set", year))?;
            let finished = queries::count_books_finished_in_year(db.pool(), &username, year).await?;
            let progress = YearlyProgress::new(year, challenge.target_books, finished as i32);
            println!(
                "{}: {}/{} books ({}%)",
                year,
                progress.finished_books,
                progress.target_books,
                progress.percent_complete()
            );
        }
        Commands::BuddyRequest { to } => {
            let username = resolve_user(cli, db).await?;
            let client = sync.map(|m| m.client());
            let request_id = buddies::send_friend_request(db.pool(), client, &username, to).await?;
            println!("Request #{} sent to {}", request_id, to);
        }
        Commands::BuddyAccept { request_id } => {
            let client = sync.map(|m| m.client());
            let request = buddies::accept_friend_request(db.pool(), client, *request_id).await?;
            println!("{} and {} are now buddies", request.from_username, request.to_username);
        }
        Commands::Share { book_uid, buddy } => {
            let username = resolve_user(cli, db).await?;
            let book = queries::find_book_by_uid(db.pool(), &username, book_uid)
                .await?
                .ok_or_else(|| anyhow!("no book with uid '{}'", book_uid))?;
            let client = sync.map(|m| m.client());
            buddies::share_book(db.pool(), client, &username, buddy, book.book_id).await?;
            println!("Shared '{}' with {}", book.title, buddy);
        }
        Commands::Inbox => {
            let username = resolve_user(cli, db).await?;
            let items = queries::list_inbox(db.pool(), &username, true).await?;
            for item in &items {
                let snapshot = item.get_snapshot()?;
                println!(
                    "#{:<4} from {:<12} {} - {}",
                    item.shared_item_id,
                    item.sender,
                    snapshot.title,
                    snapshot.authors.join(", ")
                );
            }
            println!("{} pending item(s)", items.len());
        }
        Commands::Push => {
            let username = resolve_user(cli, db).await?;
            let manager = sync.ok_or_else(|| anyhow!("set --sync-url to sync"))?;
            manager.try_push_all(db.pool(), &username).await;
            println!("Push attempted for '{}'", username);
        }
        Commands::Pull => {
            let username = resolve_user(cli, db).await?;
            let manager = sync.ok_or_else(|| anyhow!("set --sync-url to sync"))?;
            manager.try_pull_all(db.pool(), &username).await;
            println!("Pull attempted for '{}'", username);
        }
    }

    Ok(())
}
