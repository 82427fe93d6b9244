//! `SQLite` storage for the chirp engine.
//!
//! Owns the relational schema and every mutating path: account
//! registration, tweet/reply composition with hashtag indexing, retweet
//! admission, the follow graph, and favorite lists. Multi-step mutations
//! (a tweet and its hashtag mentions, an id assignment and its insert)
//! run inside a single transaction so no partial state is ever visible.
//!
//! Natural-key uniqueness (duplicate retweet, duplicate follow edge,
//! duplicate list name, duplicate list membership) is enforced by primary
//! keys; inserts use `INSERT OR IGNORE` and classify a zero-row result as
//! the duplicate no-op outcome instead of relying on a preceding read.

use crate::error::{ChirpError, Outcome, Result, SignupOutcome};
use crate::model::{FavoriteList, Retweet, Tweet, TweetStats, User, UserSummary};
use chrono::{Local, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

const SCHEMA_VERSION: i32 = 1;

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const TIME_FMT: &str = "%H:%M:%S";

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"));

pub(crate) fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, DATE_FMT).unwrap_or_default()
}

pub(crate) fn parse_time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, TIME_FMT).unwrap_or_default()
}

fn tweet_from_row(row: &Row<'_>) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        tid: row.get(0)?,
        writer_id: row.get(1)?,
        text: row.get(2)?,
        tdate: parse_date(&row.get::<_, String>(3)?),
        ttime: parse_time(&row.get::<_, String>(4)?),
        replyto_tid: row.get(5)?,
    })
}

pub(crate) const TWEET_COLUMNS: &str = "tid, writer_id, text, tdate, ttime, replyto_tid";

/// Extract hashtag terms from tweet text: `#` followed by word characters,
/// case-folded, leading marker stripped.
///
/// Rejects the whole composition if any term repeats within the text;
/// duplicate hashtags are a user error, not something to silently dedup.
fn extract_hashtags(text: &str) -> Result<Vec<String>> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for mat in HASHTAG_RE.find_iter(&lowered) {
        let term = mat.as_str().trim_start_matches('#').to_string();
        if !seen.insert(term.clone()) {
            return Err(ChirpError::duplicate_hashtag(term));
        }
        terms.push(term);
    }

    Ok(terms)
}

/// `SQLite` storage manager.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;

        // Set pragmas for performance and integrity
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Get a reference to the underlying database connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<()> {
        let current_version = self.get_schema_version();

        if current_version > SCHEMA_VERSION {
            return Err(ChirpError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: current_version,
            });
        }

        if current_version < SCHEMA_VERSION {
            info!(
                "Migrating database from version {} to {}",
                current_version, SCHEMA_VERSION
            );
            self.create_schema()?;
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> i32 {
        let result: std::result::Result<i32, _> = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| {
                let value: String = row.get(0)?;
                Ok(value.parse().unwrap_or(0))
            },
        );

        // Treat missing schema table as version 0.
        result.unwrap_or_default()
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?)",
            params![version.to_string()],
        )?;
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            -- Metadata table
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Accounts
            CREATE TABLE IF NOT EXISTS users (
                usr INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL UNIQUE,
                pwd TEXT NOT NULL
            );

            -- Tweets; replies are tweets with replyto_tid set.
            -- Dates and times are stored as TEXT ('YYYY-MM-DD' / 'HH:MM:SS')
            -- so lexicographic ORDER BY matches chronological order.
            CREATE TABLE IF NOT EXISTS tweets (
                tid INTEGER PRIMARY KEY,
                writer_id INTEGER NOT NULL REFERENCES users(usr),
                text TEXT NOT NULL,
                tdate TEXT NOT NULL,
                ttime TEXT NOT NULL,
                replyto_tid INTEGER REFERENCES tweets(tid)
            );
            CREATE INDEX IF NOT EXISTS idx_tweets_writer ON tweets(writer_id);
            CREATE INDEX IF NOT EXISTS idx_tweets_replyto ON tweets(replyto_tid);
            CREATE INDEX IF NOT EXISTS idx_tweets_date ON tweets(tdate, ttime);

            -- Retweet events; writer_id is denormalized from tweets at
            -- insert time. rdate only, no time component.
            CREATE TABLE IF NOT EXISTS retweets (
                tid INTEGER NOT NULL REFERENCES tweets(tid),
                retweeter_id INTEGER NOT NULL REFERENCES users(usr),
                writer_id INTEGER NOT NULL REFERENCES users(usr),
                spam INTEGER NOT NULL DEFAULT 0,
                rdate TEXT NOT NULL,
                PRIMARY KEY (tid, retweeter_id)
            );
            CREATE INDEX IF NOT EXISTS idx_retweets_retweeter ON retweets(retweeter_id);

            -- Follow graph
            CREATE TABLE IF NOT EXISTS follows (
                flwer INTEGER NOT NULL REFERENCES users(usr),
                flwee INTEGER NOT NULL REFERENCES users(usr),
                start_date TEXT NOT NULL,
                PRIMARY KEY (flwer, flwee)
            );
            CREATE INDEX IF NOT EXISTS idx_follows_flwee ON follows(flwee);

            -- Hashtag index: term is lowercased, '#' stripped
            CREATE TABLE IF NOT EXISTS hashtag_mentions (
                tid INTEGER NOT NULL REFERENCES tweets(tid),
                term TEXT NOT NULL,
                PRIMARY KEY (tid, term)
            );
            CREATE INDEX IF NOT EXISTS idx_mentions_term ON hashtag_mentions(term);

            -- Favorite lists and their memberships
            CREATE TABLE IF NOT EXISTS lists (
                owner_id INTEGER NOT NULL REFERENCES users(usr),
                lname TEXT NOT NULL,
                PRIMARY KEY (owner_id, lname)
            );

            CREATE TABLE IF NOT EXISTS include (
                owner_id INTEGER NOT NULL,
                lname TEXT NOT NULL,
                tid INTEGER NOT NULL REFERENCES tweets(tid),
                PRIMARY KEY (owner_id, lname, tid),
                FOREIGN KEY (owner_id, lname) REFERENCES lists(owner_id, lname)
            );
            ",
        )?;

        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new account.
    ///
    /// The user id is assigned by the max+1 scheme inside the same
    /// transaction as the insert, so ids are dense and two signups never
    /// receive the same one. Duplicate email or phone is a conflict
    /// no-op, reported through [`SignupOutcome`].
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email or phone, or a
    /// database error if the insert fails.
    pub fn create_user(
        &mut self,
        name: &str,
        email: &str,
        phone: &str,
        pwd: &str,
    ) -> Result<SignupOutcome> {
        let email = email.trim().to_lowercase();
        let domain = email.rsplit('@').next().unwrap_or_default();
        if !email.contains('@') || !domain.contains('.') {
            return Err(ChirpError::InvalidEmail { email });
        }
        if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(ChirpError::InvalidPhone {
                phone: phone.to_string(),
            });
        }

        let tx = self.conn.transaction()?;

        let email_taken: Option<i64> = tx
            .query_row("SELECT usr FROM users WHERE email = ?", params![email], |r| {
                r.get(0)
            })
            .optional()?;
        if email_taken.is_some() {
            return Ok(SignupOutcome::DuplicateEmail);
        }

        let phone_taken: Option<i64> = tx
            .query_row("SELECT usr FROM users WHERE phone = ?", params![phone], |r| {
                r.get(0)
            })
            .optional()?;
        if phone_taken.is_some() {
            return Ok(SignupOutcome::DuplicatePhone);
        }

        let usr: i64 = tx.query_row("SELECT COALESCE(MAX(usr), 0) + 1 FROM users", [], |r| {
            r.get(0)
        })?;
        tx.execute(
            "INSERT INTO users (usr, name, email, phone, pwd) VALUES (?, ?, ?, ?, ?)",
            params![usr, name, email, phone, pwd],
        )?;
        tx.commit()?;

        info!("Created user {} ({})", usr, name);
        Ok(SignupOutcome::Created(usr))
    }

    /// Look up an account by id and password (case-sensitive compare).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn authenticate(&self, usr: i64, pwd: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT usr, name, email, phone, pwd FROM users WHERE usr = ? AND pwd = ?",
                params![usr, pwd],
                |row| {
                    Ok(User {
                        usr: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                        pwd: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user(&self, usr: i64) -> Result<Option<UserSummary>> {
        let user = self
            .conn
            .query_row(
                "SELECT usr, name FROM users WHERE usr = ?",
                params![usr],
                |row| {
                    Ok(UserSummary {
                        usr: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // =========================================================================
    // Content Store
    // =========================================================================

    /// Compose an original tweet, indexing its hashtags.
    ///
    /// The tweet id is assigned max+1, and the tweet row plus its mention
    /// rows commit in one transaction: either all land or none do.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::EmptyText`] for empty text,
    /// [`ChirpError::DuplicateHashtag`] if a term repeats within the text,
    /// or a database error if any insert fails.
    pub fn compose_tweet(&mut self, writer_id: i64, text: &str) -> Result<Tweet> {
        let now = Local::now();
        self.compose_tweet_at(writer_id, text, now.date_naive(), now.time(), None)
    }

    /// Compose a reply to an existing tweet.
    ///
    /// The target must exist; a dangling `replyto_tid` would break the
    /// reply-count and thread queries downstream.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::EmptyText`] for empty text,
    /// [`ChirpError::TweetNotFound`] if the target id does not exist, or a
    /// database error if the insert fails.
    pub fn compose_reply(&mut self, writer_id: i64, text: &str, replyto_tid: i64) -> Result<Tweet> {
        if self.get_tweet(replyto_tid)?.is_none() {
            return Err(ChirpError::tweet_not_found(replyto_tid));
        }
        let now = Local::now();
        self.compose_tweet_at(writer_id, text, now.date_naive(), now.time(), Some(replyto_tid))
    }

    pub(crate) fn compose_tweet_at(
        &mut self,
        writer_id: i64,
        text: &str,
        tdate: NaiveDate,
        ttime: NaiveTime,
        replyto_tid: Option<i64>,
    ) -> Result<Tweet> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChirpError::EmptyText);
        }

        // Replies are stored as ordinary tweets; only original tweets get
        // their hashtags indexed.
        let terms = if replyto_tid.is_none() {
            extract_hashtags(text)?
        } else {
            Vec::new()
        };

        let tx = self.conn.transaction()?;

        let tid: i64 = tx.query_row("SELECT COALESCE(MAX(tid), 0) + 1 FROM tweets", [], |r| {
            r.get(0)
        })?;
        tx.execute(
            "INSERT INTO tweets (tid, writer_id, text, tdate, ttime, replyto_tid)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                tid,
                writer_id,
                text,
                tdate.format(DATE_FMT).to_string(),
                ttime.format(TIME_FMT).to_string(),
                replyto_tid,
            ],
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO hashtag_mentions (tid, term) VALUES (?, ?)")?;
            for term in &terms {
                stmt.execute(params![tid, term])?;
            }
        }

        tx.commit()?;
        info!("Stored tweet {} by user {}", tid, writer_id);

        Ok(Tweet {
            tid,
            writer_id,
            text: text.to_string(),
            tdate,
            ttime,
            replyto_tid,
        })
    }

    /// Retweet an existing tweet.
    ///
    /// Admission rules: the target must exist; a second retweet of the
    /// same tweet by the same user is a duplicate no-op. The original
    /// writer id is denormalized into the retweet row at insert time.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::TweetNotFound`] if the target id does not
    /// exist, or a database error if the insert fails.
    pub fn retweet(&mut self, tid: i64, retweeter_id: i64) -> Result<Outcome> {
        self.retweet_at(tid, retweeter_id, Local::now().date_naive())
    }

    pub(crate) fn retweet_at(
        &mut self,
        tid: i64,
        retweeter_id: i64,
        rdate: NaiveDate,
    ) -> Result<Outcome> {
        let tx = self.conn.transaction()?;

        let writer_id: Option<i64> = tx
            .query_row("SELECT writer_id FROM tweets WHERE tid = ?", params![tid], |r| {
                r.get(0)
            })
            .optional()?;
        let Some(writer_id) = writer_id else {
            return Err(ChirpError::tweet_not_found(tid));
        };

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO retweets (tid, retweeter_id, writer_id, spam, rdate)
             VALUES (?, ?, ?, 0, ?)",
            params![tid, retweeter_id, writer_id, rdate.format(DATE_FMT).to_string()],
        )?;
        tx.commit()?;

        if inserted == 0 {
            Ok(Outcome::Duplicate)
        } else {
            info!("User {} retweeted tweet {}", retweeter_id, tid);
            Ok(Outcome::Created)
        }
    }

    /// Mark a retweet as spam, removing it from every feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn flag_retweet_spam(&self, tid: i64, retweeter_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE retweets SET spam = 1 WHERE tid = ? AND retweeter_id = ?",
            params![tid, retweeter_id],
        )?;
        Ok(())
    }

    /// Get a tweet by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_tweet(&self, tid: i64) -> Result<Option<Tweet>> {
        let sql = format!("SELECT {TWEET_COLUMNS} FROM tweets WHERE tid = ?");
        let tweet = self
            .conn
            .query_row(&sql, params![tid], tweet_from_row)
            .optional()?;
        Ok(tweet)
    }

    /// Get retweet events for a tweet (newest date first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_retweets(&self, tid: i64) -> Result<Vec<Retweet>> {
        let mut stmt = self.conn.prepare(
            "SELECT tid, retweeter_id, writer_id, spam, rdate
             FROM retweets WHERE tid = ? ORDER BY rdate DESC",
        )?;
        let retweets = stmt
            .query_map(params![tid], |row| {
                Ok(Retweet {
                    tid: row.get(0)?,
                    retweeter_id: row.get(1)?,
                    writer_id: row.get(2)?,
                    spam: row.get::<_, i32>(3)? != 0,
                    rdate: parse_date(&row.get::<_, String>(4)?),
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(retweets)
    }

    /// Count retweets and direct replies for a tweet.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::TweetNotFound`] if the tweet does not exist,
    /// or a database error if a query fails.
    pub fn tweet_stats(&self, tid: i64) -> Result<TweetStats> {
        if self.get_tweet(tid)?.is_none() {
            return Err(ChirpError::tweet_not_found(tid));
        }

        let retweet_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM retweets WHERE tid = ?",
            params![tid],
            |r| r.get(0),
        )?;
        let reply_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tweets WHERE replyto_tid = ?",
            params![tid],
            |r| r.get(0),
        )?;

        Ok(TweetStats {
            tid,
            retweet_count,
            reply_count,
        })
    }

    /// Get the hashtag terms indexed for a tweet, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn tweet_hashtags(&self, tid: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT term FROM hashtag_mentions WHERE tid = ? ORDER BY term")?;
        let terms = stmt
            .query_map(params![tid], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(terms)
    }

    // =========================================================================
    // Relationship Index (follow graph)
    // =========================================================================

    /// Follow another user.
    ///
    /// Self-follows are rejected outright; an existing edge is a
    /// duplicate no-op. The edge records today's date.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::SelfFollow`] when `flwer == flwee`, or a
    /// database error if the insert fails (including a foreign-key
    /// failure for an unknown user id).
    pub fn follow(&mut self, flwer: i64, flwee: i64) -> Result<Outcome> {
        self.follow_at(flwer, flwee, Local::now().date_naive())
    }

    pub(crate) fn follow_at(&mut self, flwer: i64, flwee: i64, date: NaiveDate) -> Result<Outcome> {
        if flwer == flwee {
            return Err(ChirpError::SelfFollow);
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO follows (flwer, flwee, start_date) VALUES (?, ?, ?)",
            params![flwer, flwee, date.format(DATE_FMT).to_string()],
        )?;

        if inserted == 0 {
            Ok(Outcome::Duplicate)
        } else {
            info!("User {} now follows user {}", flwer, flwee);
            Ok(Outcome::Created)
        }
    }

    /// Every user following `usr`, ordered by follower id ascending.
    ///
    /// The whole set is materialized so callers can select a follower by
    /// its 1-based position across all pages, not per page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn followers(&self, usr: i64) -> Result<Vec<UserSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT users.usr, users.name
             FROM follows
             JOIN users ON follows.flwer = users.usr
             WHERE flwee = ?
             ORDER BY users.usr",
        )?;
        let followers = stmt
            .query_map(params![usr], |row| {
                Ok(UserSummary {
                    usr: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(followers)
    }

    // =========================================================================
    // Favorites Index
    // =========================================================================

    /// Create a named favorite list for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::EmptyListName`] for an empty name, or a
    /// database error if the insert fails.
    pub fn create_list(&mut self, owner_id: i64, lname: &str) -> Result<Outcome> {
        let lname = lname.trim();
        if lname.is_empty() {
            return Err(ChirpError::EmptyListName);
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO lists (owner_id, lname) VALUES (?, ?)",
            params![owner_id, lname],
        )?;

        if inserted == 0 {
            Ok(Outcome::Duplicate)
        } else {
            info!("User {} created list '{}'", owner_id, lname);
            Ok(Outcome::Created)
        }
    }

    /// The names of `owner_id`'s favorite lists, sorted.
    ///
    /// An empty result is the "no lists exist" affordance: the caller
    /// should offer list creation before retrying a membership add.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_names(&self, owner_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT lname FROM lists WHERE owner_id = ? ORDER BY lname")?;
        let names = stmt
            .query_map(params![owner_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(names)
    }

    /// Add a tweet to one of the owner's favorite lists.
    ///
    /// An already-present (owner, list, tid) triple is a duplicate no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::ListNotFound`] if the owner has no such
    /// list, [`ChirpError::TweetNotFound`] if the tweet id does not
    /// exist, or a database error if the insert fails.
    pub fn add_to_list(&mut self, owner_id: i64, lname: &str, tid: i64) -> Result<Outcome> {
        let tx = self.conn.transaction()?;

        let list_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM lists WHERE owner_id = ? AND lname = ?",
                params![owner_id, lname],
                |r| r.get(0),
            )
            .optional()?;
        if list_exists.is_none() {
            return Err(ChirpError::list_not_found(lname));
        }

        let tweet_exists: Option<i64> = tx
            .query_row("SELECT 1 FROM tweets WHERE tid = ?", params![tid], |r| {
                r.get(0)
            })
            .optional()?;
        if tweet_exists.is_none() {
            return Err(ChirpError::tweet_not_found(tid));
        }

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO include (owner_id, lname, tid) VALUES (?, ?, ?)",
            params![owner_id, lname, tid],
        )?;
        tx.commit()?;

        if inserted == 0 {
            Ok(Outcome::Duplicate)
        } else {
            info!("Tweet {} added to list '{}'", tid, lname);
            Ok(Outcome::Created)
        }
    }

    /// Every list the owner created with its member tweet ids, sorted by
    /// list name. Lists with no members appear with an empty member set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn favorite_lists(&self, owner_id: i64) -> Result<Vec<FavoriteList>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.lname, i.tid
             FROM lists l
             LEFT JOIN include i ON l.owner_id = i.owner_id AND l.lname = i.lname
             WHERE l.owner_id = ?
             ORDER BY l.lname, i.tid",
        )?;

        let rows: Vec<(String, Option<i64>)> = stmt
            .query_map(params![owner_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;

        let mut lists: Vec<FavoriteList> = Vec::new();
        for (lname, tid) in rows {
            if lists.last().is_none_or(|l: &FavoriteList| l.lname != lname) {
                lists.push(FavoriteList {
                    lname,
                    tids: Vec::new(),
                });
            }
            if let (Some(tid), Some(list)) = (tid, lists.last_mut()) {
                list.tids.push(tid);
            }
        }
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> Storage {
        Storage::open_memory().unwrap()
    }

    fn signup(storage: &mut Storage, name: &str, email: &str, phone: &str) -> i64 {
        match storage.create_user(name, email, phone, "hunter2").unwrap() {
            SignupOutcome::Created(usr) => usr,
            other => panic!("signup failed: {other:?}"),
        }
    }

    #[test]
    fn user_ids_are_dense_from_one() {
        let mut storage = test_storage();
        let a = signup(&mut storage, "alice", "alice@example.com", "111");
        let b = signup(&mut storage, "bob", "bob@example.com", "222");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn signup_rejects_duplicate_email_and_phone() {
        let mut storage = test_storage();
        signup(&mut storage, "alice", "alice@example.com", "111");

        let dup_email = storage
            .create_user("eve", "alice@example.com", "999", "pw")
            .unwrap();
        assert_eq!(dup_email, SignupOutcome::DuplicateEmail);

        let dup_phone = storage
            .create_user("eve", "eve@example.com", "111", "pw")
            .unwrap();
        assert_eq!(dup_phone, SignupOutcome::DuplicatePhone);
    }

    #[test]
    fn signup_validates_email_and_phone_format() {
        let mut storage = test_storage();
        assert!(matches!(
            storage.create_user("x", "not-an-email", "123", "pw"),
            Err(ChirpError::InvalidEmail { .. })
        ));
        assert!(matches!(
            storage.create_user("x", "x@nodot", "123", "pw"),
            Err(ChirpError::InvalidEmail { .. })
        ));
        assert!(matches!(
            storage.create_user("x", "x@example.com", "12a3", "pw"),
            Err(ChirpError::InvalidPhone { .. })
        ));
    }

    #[test]
    fn authenticate_is_case_sensitive() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");

        assert!(storage.authenticate(usr, "hunter2").unwrap().is_some());
        assert!(storage.authenticate(usr, "Hunter2").unwrap().is_none());
        assert!(storage.authenticate(999, "hunter2").unwrap().is_none());
    }

    #[test]
    fn tweet_ids_are_dense_from_one() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");

        let t1 = storage.compose_tweet(usr, "first").unwrap();
        let t2 = storage.compose_tweet(usr, "second").unwrap();
        assert_eq!(t1.tid, 1);
        assert_eq!(t2.tid, 2);
    }

    #[test]
    fn compose_rejects_empty_text() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        assert!(matches!(
            storage.compose_tweet(usr, "   "),
            Err(ChirpError::EmptyText)
        ));
    }

    #[test]
    fn hashtags_are_lowercased_and_stored_once_each() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");

        let tweet = storage.compose_tweet(usr, "learning #Go and #Rust").unwrap();
        assert_eq!(storage.tweet_hashtags(tweet.tid).unwrap(), vec!["go", "rust"]);
    }

    #[test]
    fn duplicate_hashtag_rejects_whole_composition() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");

        let err = storage.compose_tweet(usr, "#Go is great #go").unwrap_err();
        assert!(matches!(err, ChirpError::DuplicateHashtag { ref term } if term == "go"));

        // No partial insert: no tweet row, no mention rows.
        let count: i64 = storage
            .conn
            .query_row("SELECT COUNT(*) FROM tweets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
        let mentions: i64 = storage
            .conn
            .query_row("SELECT COUNT(*) FROM hashtag_mentions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mentions, 0);
    }

    #[test]
    fn reply_requires_existing_target() {
        let mut storage = test_storage();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");

        assert!(matches!(
            storage.compose_reply(usr, "hello?", 42),
            Err(ChirpError::TweetNotFound { tid: 42 })
        ));

        let tweet = storage.compose_tweet(usr, "original").unwrap();
        let reply = storage.compose_reply(usr, "a reply", tweet.tid).unwrap();
        assert_eq!(reply.replyto_tid, Some(tweet.tid));
    }

    #[test]
    fn retweet_is_idempotent_per_user() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let bob = signup(&mut storage, "bob", "bob@example.com", "222");
        let tweet = storage.compose_tweet(alice, "hello").unwrap();

        assert_eq!(storage.retweet(tweet.tid, bob).unwrap(), Outcome::Created);
        assert_eq!(storage.retweet(tweet.tid, bob).unwrap(), Outcome::Duplicate);

        let stats = storage.tweet_stats(tweet.tid).unwrap();
        assert_eq!(stats.retweet_count, 1);
    }

    #[test]
    fn retweet_denormalizes_writer_and_rejects_missing_target() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let bob = signup(&mut storage, "bob", "bob@example.com", "222");

        assert!(matches!(
            storage.retweet(7, bob),
            Err(ChirpError::TweetNotFound { tid: 7 })
        ));

        let tweet = storage.compose_tweet(alice, "hello").unwrap();
        storage.retweet(tweet.tid, bob).unwrap();
        let retweets = storage.get_retweets(tweet.tid).unwrap();
        assert_eq!(retweets.len(), 1);
        assert_eq!(retweets[0].writer_id, alice);
        assert_eq!(retweets[0].retweeter_id, bob);
        assert!(!retweets[0].spam);
    }

    #[test]
    fn tweet_stats_counts_replies_and_rejects_unknown_tweet() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let tweet = storage.compose_tweet(alice, "root").unwrap();
        storage.compose_reply(alice, "r1", tweet.tid).unwrap();
        storage.compose_reply(alice, "r2", tweet.tid).unwrap();

        let stats = storage.tweet_stats(tweet.tid).unwrap();
        assert_eq!(stats.reply_count, 2);
        assert_eq!(stats.retweet_count, 0);

        assert!(matches!(
            storage.tweet_stats(99),
            Err(ChirpError::TweetNotFound { tid: 99 })
        ));
    }

    #[test]
    fn self_follow_is_rejected() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        assert!(matches!(
            storage.follow(alice, alice),
            Err(ChirpError::SelfFollow)
        ));
    }

    #[test]
    fn follow_is_idempotent() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let bob = signup(&mut storage, "bob", "bob@example.com", "222");

        assert_eq!(storage.follow(alice, bob).unwrap(), Outcome::Created);
        assert_eq!(storage.follow(alice, bob).unwrap(), Outcome::Duplicate);

        let followers = storage.followers(bob).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].usr, alice);
    }

    #[test]
    fn followers_ordered_by_id_ascending() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let bob = signup(&mut storage, "bob", "bob@example.com", "222");
        let carol = signup(&mut storage, "carol", "carol@example.com", "333");

        storage.follow(carol, alice).unwrap();
        storage.follow(bob, alice).unwrap();

        let followers = storage.followers(alice).unwrap();
        let ids: Vec<i64> = followers.iter().map(|f| f.usr).collect();
        assert_eq!(ids, vec![bob, carol]);
    }

    #[test]
    fn create_list_rejects_empty_name_and_duplicates() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");

        assert!(matches!(
            storage.create_list(alice, "  "),
            Err(ChirpError::EmptyListName)
        ));
        assert_eq!(storage.create_list(alice, "faves").unwrap(), Outcome::Created);
        assert_eq!(
            storage.create_list(alice, "faves").unwrap(),
            Outcome::Duplicate
        );
    }

    #[test]
    fn list_membership_is_idempotent() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let tweet = storage.compose_tweet(alice, "keep this").unwrap();
        storage.create_list(alice, "faves").unwrap();

        assert_eq!(
            storage.add_to_list(alice, "faves", tweet.tid).unwrap(),
            Outcome::Created
        );
        assert_eq!(
            storage.add_to_list(alice, "faves", tweet.tid).unwrap(),
            Outcome::Duplicate
        );

        let lists = storage.favorite_lists(alice).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].tids, vec![tweet.tid]);
    }

    #[test]
    fn add_to_list_validates_list_and_tweet() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let tweet = storage.compose_tweet(alice, "hello").unwrap();

        assert!(matches!(
            storage.add_to_list(alice, "nope", tweet.tid),
            Err(ChirpError::ListNotFound { .. })
        ));

        storage.create_list(alice, "faves").unwrap();
        assert!(matches!(
            storage.add_to_list(alice, "faves", 99),
            Err(ChirpError::TweetNotFound { tid: 99 })
        ));
    }

    #[test]
    fn empty_lists_still_appear() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        storage.create_list(alice, "empty one").unwrap();
        storage.create_list(alice, "full one").unwrap();
        let tweet = storage.compose_tweet(alice, "hello").unwrap();
        storage.add_to_list(alice, "full one", tweet.tid).unwrap();

        let lists = storage.favorite_lists(alice).unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].lname, "empty one");
        assert!(lists[0].tids.is_empty());
        assert_eq!(lists[1].tids, vec![tweet.tid]);
    }

    #[test]
    fn no_lists_affordance() {
        let mut storage = test_storage();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        assert!(storage.list_names(alice).unwrap().is_empty());
        storage.create_list(alice, "a").unwrap();
        assert_eq!(storage.list_names(alice).unwrap(), vec!["a"]);
    }

    #[test]
    fn extract_hashtags_basic() {
        assert_eq!(extract_hashtags("no tags here").unwrap(), Vec::<String>::new());
        assert_eq!(
            extract_hashtags("try #Rust and #sqlite3 today").unwrap(),
            vec!["rust", "sqlite3"]
        );
        assert!(extract_hashtags("#go #GO").is_err());
    }
}
