//! CLI definitions for chirp.
//!
//! Uses clap for argument parsing with derive macros. The CLI is a thin
//! dispatch layer: it collects already-validated scalar inputs and hands
//! them to the engine, then renders the returned pages and outcomes.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// chirp - micro-blogging data manager on SQLite
#[derive(Parser, Debug)]
#[command(name = "chirp")]
#[command(version)]
#[command(about = "Manage and query a micro-blogging database: feeds, search, follows, favorites")]
#[command(long_about = r"
chirp - a relational micro-blogging data manager.

All state lives in a single SQLite database. Every command acts within
the authority of one identity, passed explicitly with --user.

Quick start:
  1. chirp signup --name Alice --email alice@example.com --phone 5551234 --password s3cret
  2. chirp -u 1 post 'hello #world'
  3. chirp -u 2 follow 1
  4. chirp -u 2 feed
")]
pub struct Cli {
    /// Path to the database file
    #[arg(long, env = "CHIRP_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Acting user id (the authenticated identity for this invocation)
    #[arg(long, short = 'u', global = true)]
    pub user: Option<i64>,

    /// Output format
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new account
    Signup(SignupArgs),

    /// Verify credentials for the acting user
    Login(LoginArgs),

    /// Compose an original tweet
    Post(PostArgs),

    /// Reply to an existing tweet
    Reply(ReplyArgs),

    /// Retweet an existing tweet
    Retweet(RetweetArgs),

    /// Show retweet and reply counts for a tweet
    Stats(StatsArgs),

    /// Show a page of your feed
    Feed(FeedArgs),

    /// Search tweets by keywords (text substring or exact hashtag)
    Search(SearchArgs),

    /// Follow another user
    Follow(FollowArgs),

    /// List your followers
    Followers,

    /// Search users by name
    Users(UsersArgs),

    /// Show a user's profile with aggregate counts
    Profile(ProfileArgs),

    /// List a user's tweets, newest first
    Tweets(TweetsArgs),

    /// Show your favorite lists and their members
    Lists,

    /// Create a new favorite list
    NewList(NewListArgs),

    /// Add a tweet to a favorite list
    Favorite(FavoriteArgs),
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Email address (unique)
    #[arg(long)]
    pub email: String,

    /// Phone number, digits only (unique)
    #[arg(long)]
    pub phone: String,

    /// Password (stored verbatim, compared case-sensitively)
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Password to check against the acting user's account
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Tweet text; hashtags are extracted from `#word` tokens
    pub text: String,
}

#[derive(Args, Debug)]
pub struct ReplyArgs {
    /// Target tweet id
    pub tid: i64,

    /// Reply text
    pub text: String,
}

#[derive(Args, Debug)]
pub struct RetweetArgs {
    /// Target tweet id
    pub tid: i64,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Tweet id
    pub tid: i64,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Zero-based page number
    #[arg(long, short = 'p', default_value = "0")]
    pub page: usize,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Comma-separated keywords
    pub keywords: String,

    /// Zero-based page number
    #[arg(long, short = 'p', default_value = "0")]
    pub page: usize,
}

#[derive(Args, Debug)]
pub struct FollowArgs {
    /// User id to follow
    pub target: i64,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Name fragment to search for
    pub keyword: String,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// User id to inspect
    pub target: i64,
}

#[derive(Args, Debug)]
pub struct TweetsArgs {
    /// User id whose tweets to list
    pub target: i64,

    /// Zero-based page number
    #[arg(long, short = 'p', default_value = "0")]
    pub page: usize,
}

#[derive(Args, Debug)]
pub struct NewListArgs {
    /// List name (unique per owner)
    pub name: String,
}

#[derive(Args, Debug)]
pub struct FavoriteArgs {
    /// Tweet id to add
    pub tid: i64,

    /// Favorite list to add it to
    #[arg(long, short = 'l')]
    pub list: String,
}

/// Output format for command results.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Machine-readable JSON
    Json,
}
