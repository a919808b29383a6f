use anyhow::Result;
use chrono::{Duration, Local};
use colored::Colorize;
use std::env;
use std::process;

use job_feed_notifier::environment::Settings;
use job_feed_notifier::poller::{evaluate_entry, EntryOutcome};
use job_feed_notifier::rss::{self, FeedSource, HttpFeedSource};
use job_feed_notifier::seen::SeenJobs;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        return Ok(());
    }

    let url = &args[1];
    let ignore_window = args.iter().any(|arg| arg == "--all");

    if !rss::is_valid_url(url) {
        eprintln!("Invalid URL format: {}", url);
        process::exit(2);
    }

    let settings = Settings::from_env();
    // Read only; this tool never records anything as seen
    let seen = SeenJobs::load(&settings.processed_jobs_path)?;
    let window = if ignore_window {
        Duration::days(36500)
    } else {
        settings.recency_window
    };

    println!("Testing job feed: {}", url);
    let source = HttpFeedSource::new(settings.request_timeout)?;
    let body = match source.fetch(url).await {
        Ok(body) => body,
        Err(err) => {
            eprintln!("Failed to fetch feed: {:#}", err);
            process::exit(2);
        }
    };

    let mut entries = match rss::parse_feed(&body, url) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("Failed to parse feed: {:#}", err);
            process::exit(1);
        }
    };
    entries.reverse();
    entries.sort_by_key(|entry| entry.published);

    println!("\n{}", "═".repeat(100).bright_blue());
    println!("{}  {}", "FEED DIAGNOSTICS".bright_blue(), url.bright_yellow());
    println!("{}", "═".repeat(100).bright_blue());
    println!("{}: {}", "Entries Found".bright_blue(), entries.len());
    println!(
        "{}: {} ({} known)",
        "Processed Jobs".bright_blue(),
        settings.processed_jobs_path.display(),
        seen.len()
    );

    let now = Local::now();
    let mut would_notify = 0;
    for (i, entry) in entries.into_iter().enumerate() {
        let title = entry.title.clone().unwrap_or_else(|| "[No Title]".to_string());
        println!("\n{}. {}", i + 1, title.bright_white());
        println!("{}", "─".repeat(80).dimmed());

        match evaluate_entry(entry, &seen, &now, window) {
            EntryOutcome::Notify(alert) => {
                would_notify += 1;
                println!("{}", "WOULD NOTIFY".bright_green());
                println!("{}", alert.posting.link.bright_cyan());
                println!("{}", alert.message());
            }
            EntryOutcome::AlreadySeen(id) => {
                println!("{} {}", "ALREADY SEEN".dimmed(), id.dimmed());
            }
            EntryOutcome::Stale(id) => {
                println!("{} {}", "OUTSIDE WINDOW".bright_yellow(), id);
            }
            EntryOutcome::Skipped(reason) => {
                println!("{} {}", "SKIPPED".bright_red(), reason.to_string().bright_red());
            }
        }
    }

    println!("\n{}", "═".repeat(100).bright_blue());
    println!("Feed test completed: {} postings would be notified", would_notify);
    Ok(())
}

fn print_usage(program_name: &str) {
    println!("Usage: {} <feed_url> [--all]", program_name);
    println!("\nOptions:");
    println!("  --all    Ignore the recency window and show every posting");
    println!("\nNothing is notified and the processed jobs file is never written.");
    println!("\nExamples:");
    println!(
        "  {} 'https://www.upwork.com/ab/feed/jobs/rss?q=rust'",
        program_name
    );
}
