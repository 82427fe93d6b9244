//! chirp - micro-blogging data manager CLI
//!
//! Main entry point. Thin dispatch over the engine: every command
//! resolves its inputs, calls one engine operation, and renders the
//! returned page or outcome.

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use chirp::cli::{self, Cli, Commands, OutputFormat};
use chirp::config::Config;
use chirp::logging::{LogConfig, init_logging};
use chirp::{
    FeedItem, Outcome, PAGE_SIZE, Page, SignupOutcome, Storage, Tweet, parse_keywords,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config);

    let config = Config::load();
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());

    match &cli.command {
        Commands::Signup(args) => cmd_signup(&cli, &db_path, args),
        Commands::Login(args) => cmd_login(&cli, &db_path, args),
        Commands::Post(args) => cmd_post(&cli, &db_path, args),
        Commands::Reply(args) => cmd_reply(&cli, &db_path, args),
        Commands::Retweet(args) => cmd_retweet(&cli, &db_path, args),
        Commands::Stats(args) => cmd_stats(&cli, &db_path, args),
        Commands::Feed(args) => cmd_feed(&cli, &db_path, args),
        Commands::Search(args) => cmd_search(&cli, &db_path, args),
        Commands::Follow(args) => cmd_follow(&cli, &db_path, args),
        Commands::Followers => cmd_followers(&cli, &db_path),
        Commands::Users(args) => cmd_users(&cli, &db_path, args),
        Commands::Profile(args) => cmd_profile(&cli, &db_path, args),
        Commands::Tweets(args) => cmd_tweets(&cli, &db_path, args),
        Commands::Lists => cmd_lists(&cli, &db_path),
        Commands::NewList(args) => cmd_new_list(&cli, &db_path, args),
        Commands::Favorite(args) => cmd_favorite(&cli, &db_path, args),
    }
}

fn open_storage(db_path: &PathBuf) -> Result<Storage> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Storage::open(db_path).with_context(|| format!("Failed to open database at {}", db_path.display()))
}

/// The acting identity must be explicit; there is no ambient session.
fn require_user(cli: &Cli) -> Result<i64> {
    cli.user
        .ok_or_else(|| anyhow::anyhow!("This command needs an acting user: pass --user <id>"))
}

fn print_outcome(outcome: Outcome, created_msg: &str, duplicate_msg: &str) {
    match outcome {
        Outcome::Created => println!("{}", created_msg.green()),
        Outcome::Duplicate => println!("{}", duplicate_msg.yellow()),
    }
}

fn print_tweet(tweet: &Tweet, position: Option<usize>) {
    let header = format!(
        "Tweet ID: {} | Writer ID: {} | {} at {}",
        tweet.tid, tweet.writer_id, tweet.tdate, tweet.ttime
    );
    match position {
        Some(pos) => println!("[{pos}] {header}"),
        None => println!("{header}"),
    }
    println!("    {}", tweet.text);
}

fn cmd_signup(cli: &Cli, db_path: &PathBuf, args: &cli::SignupArgs) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let outcome = storage.create_user(&args.name, &args.email, &args.phone, &args.password)?;

    match outcome {
        SignupOutcome::Created(usr) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "usr": usr }));
            } else {
                println!("{} Your user id is {}.", "Account created.".green(), usr);
            }
        }
        SignupOutcome::DuplicateEmail => {
            println!("{}", "An account with this email already exists.".yellow());
        }
        SignupOutcome::DuplicatePhone => {
            println!("{}", "An account with this phone already exists.".yellow());
        }
    }
    Ok(())
}

fn cmd_login(cli: &Cli, db_path: &PathBuf, args: &cli::LoginArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let storage = open_storage(db_path)?;

    match storage.authenticate(usr, &args.password)? {
        Some(user) => println!("{} {}!", "Welcome".green(), user.name),
        None => println!("{}", "Invalid credentials or user not found.".red()),
    }
    Ok(())
}

fn cmd_post(cli: &Cli, db_path: &PathBuf, args: &cli::PostArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;
    let tweet = storage.compose_tweet(usr, &args.text)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&tweet)?);
    } else {
        println!("{} Tweet id {}.", "Tweet posted.".green(), tweet.tid);
    }
    Ok(())
}

fn cmd_reply(cli: &Cli, db_path: &PathBuf, args: &cli::ReplyArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;
    let reply = storage.compose_reply(usr, &args.text, args.tid)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!(
            "{} Reply id {} to tweet {}.",
            "Reply posted.".green(),
            reply.tid,
            args.tid
        );
    }
    Ok(())
}

fn cmd_retweet(cli: &Cli, db_path: &PathBuf, args: &cli::RetweetArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;
    let outcome = storage.retweet(args.tid, usr)?;
    print_outcome(
        outcome,
        "Retweet posted.",
        "You have already retweeted this tweet.",
    );
    Ok(())
}

fn cmd_stats(cli: &Cli, db_path: &PathBuf, args: &cli::StatsArgs) -> Result<()> {
    let storage = open_storage(db_path)?;
    let stats = storage.tweet_stats(args.tid)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("=== Tweet Statistics ===");
        println!("Tweet ID: {}", stats.tid);
        println!("Retweets: {}", stats.retweet_count);
        println!("Replies: {}", stats.reply_count);
    }
    Ok(())
}

fn print_feed_item(item: &FeedItem, position: usize) {
    let kind = match item.kind {
        chirp::FeedItemKind::Tweet => "TWEET",
        chirp::FeedItemKind::Retweet => "RETWEET",
    };
    let time = item
        .time
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    println!(
        "[{position}] {kind} | ID: {} | Date: {} | Time: {time}",
        item.tid, item.date
    );
    println!("    {}", item.text);
}

fn cmd_feed(cli: &Cli, db_path: &PathBuf, args: &cli::FeedArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let storage = open_storage(db_path)?;
    let offset = args.page.saturating_mul(PAGE_SIZE);
    let page = storage.feed_page(usr, offset)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!("=== Your Feed ===");
    if page.is_empty() {
        if args.page == 0 {
            println!("No tweets to display.");
        } else {
            println!("No more tweets available.");
        }
        return Ok(());
    }

    for (i, item) in page.items.iter().enumerate() {
        print_feed_item(item, offset + i + 1);
    }
    if page.has_more {
        println!("\nMore tweets available: run with --page {}", args.page + 1);
    }
    Ok(())
}

fn cmd_search(cli: &Cli, db_path: &PathBuf, args: &cli::SearchArgs) -> Result<()> {
    // Keyword validation happens before storage is touched.
    let keywords = parse_keywords(&args.keywords)?;
    let storage = open_storage(db_path)?;
    let results = storage.search_tweets(&keywords)?;

    let page = results.page(args.page);
    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!("=== Search Results ===");
    if results.is_empty() {
        println!("No tweets found matching the keywords.");
        return Ok(());
    }
    if page.is_empty() {
        println!("No more results.");
        return Ok(());
    }

    let start = args.page * PAGE_SIZE;
    for (i, tweet) in page.items.iter().enumerate() {
        print_tweet(tweet, Some(start + i + 1));
    }
    if page.has_more {
        println!("\nMore results available: run with --page {}", args.page + 1);
    }
    Ok(())
}

fn cmd_follow(cli: &Cli, db_path: &PathBuf, args: &cli::FollowArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;

    if storage.get_user(args.target)?.is_none() {
        bail!("User with ID {} not found", args.target);
    }

    let outcome = storage.follow(usr, args.target)?;
    print_outcome(
        outcome,
        "You are now following this user!",
        "You are already following this user.",
    );
    Ok(())
}

fn cmd_followers(cli: &Cli, db_path: &PathBuf) -> Result<()> {
    let usr = require_user(cli)?;
    let storage = open_storage(db_path)?;
    let followers = storage.followers(usr)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&followers)?);
        return Ok(());
    }

    if followers.is_empty() {
        println!("You have no followers.");
        return Ok(());
    }

    println!("=== Your Followers ===");
    for (i, f) in followers.iter().enumerate() {
        println!("[{}] User ID: {} | Name: {}", i + 1, f.usr, f.name);
    }
    Ok(())
}

fn cmd_users(cli: &Cli, db_path: &PathBuf, args: &cli::UsersArgs) -> Result<()> {
    let storage = open_storage(db_path)?;
    let users = storage.search_users(&args.keyword)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found matching the keyword.");
        return Ok(());
    }

    println!("=== Search Results ===");
    for (i, user) in users.iter().enumerate() {
        println!("[{}] User ID: {} | Name: {}", i + 1, user.usr, user.name);
    }
    Ok(())
}

fn cmd_profile(cli: &Cli, db_path: &PathBuf, args: &cli::ProfileArgs) -> Result<()> {
    let storage = open_storage(db_path)?;
    let profile = storage.user_profile(args.target)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("=== User Details ===");
    println!("User ID: {}", profile.usr);
    println!("Name: {}", profile.name);
    println!("Total Tweets: {}", profile.tweet_count);
    println!("Followers: {}", profile.follower_count);
    println!("Following: {}", profile.following_count);

    println!("\n=== Recent Tweets ===");
    if profile.recent_tweets.is_empty() {
        println!("No recent tweets available.");
    } else {
        for tweet in &profile.recent_tweets {
            print_tweet(tweet, None);
        }
    }
    Ok(())
}

fn cmd_tweets(cli: &Cli, db_path: &PathBuf, args: &cli::TweetsArgs) -> Result<()> {
    let storage = open_storage(db_path)?;
    let page: Page<Tweet> = storage.user_tweets_page(args.target, args.page)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.is_empty() {
        println!("No tweets available.");
        return Ok(());
    }

    println!("=== Tweets by user {} ===", args.target);
    let start = args.page * PAGE_SIZE;
    for (i, tweet) in page.items.iter().enumerate() {
        print_tweet(tweet, Some(start + i + 1));
    }
    if page.has_more {
        println!("\nMore tweets available: run with --page {}", args.page + 1);
    }
    Ok(())
}

fn cmd_lists(cli: &Cli, db_path: &PathBuf) -> Result<()> {
    let usr = require_user(cli)?;
    let storage = open_storage(db_path)?;
    let lists = storage.favorite_lists(usr)?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }

    if lists.is_empty() {
        println!("You have no favorite lists.");
        return Ok(());
    }

    println!("=== Your Favorite Lists ===");
    for list in &lists {
        if list.tids.is_empty() {
            println!("{}: No tweets in this list.", list.lname);
        } else {
            let tids = list
                .tids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!("{}: {}", list.lname, tids);
        }
    }
    Ok(())
}

fn cmd_new_list(cli: &Cli, db_path: &PathBuf, args: &cli::NewListArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;
    let outcome = storage.create_list(usr, &args.name)?;
    print_outcome(
        outcome,
        &format!("Favorite list '{}' created.", args.name),
        "A list with this name already exists.",
    );
    Ok(())
}

fn cmd_favorite(cli: &Cli, db_path: &PathBuf, args: &cli::FavoriteArgs) -> Result<()> {
    let usr = require_user(cli)?;
    let mut storage = open_storage(db_path)?;

    // Surface the "no lists exist" affordance before naming one.
    if storage.list_names(usr)?.is_empty() {
        println!(
            "{}",
            "You have no favorite lists. Create one first with 'chirp new-list <name>'.".yellow()
        );
        return Ok(());
    }

    let outcome = storage.add_to_list(usr, &args.list, args.tid)?;
    print_outcome(
        outcome,
        &format!("Tweet added to '{}'.", args.list),
        "This tweet is already in the selected list.",
    );
    Ok(())
}
