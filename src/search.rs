//! Keyword search over tweets.
//!
//! A query is a set of lowercased keywords. A tweet matches if any
//! keyword is a case-insensitive substring of its text, or exactly equals
//! one of its hashtag terms. The two match paths are combined with a SQL
//! `UNION`, so a tweet matching both appears once.
//!
//! Results are materialized up front, sorted by `(date, time)`
//! descending, then sliced into pages of [`PAGE_SIZE`] in memory. Each
//! result has a stable 1-based position across all pages; selecting a
//! result maps that position back to the tweet id, never to a page-local
//! index.

use crate::error::{ChirpError, Result};
use crate::model::{Page, Tweet, paginate};
use crate::storage::{Storage, TWEET_COLUMNS, parse_date, parse_time};
use itertools::Itertools;
use rusqlite::params_from_iter;

/// Parse comma-separated keyword input: trim, lowercase, drop empty
/// tokens and duplicates (order preserved).
///
/// # Errors
///
/// Returns [`ChirpError::NoKeywords`] if nothing usable remains, so no
/// storage query is attempted for a blank input.
pub fn parse_keywords(input: &str) -> Result<Vec<String>> {
    let keywords: Vec<String> = input
        .split(',')
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .unique()
        .collect();

    if keywords.is_empty() {
        return Err(ChirpError::NoKeywords);
    }
    Ok(keywords)
}

/// A materialized, deduplicated search result set.
#[derive(Debug, Clone)]
pub struct SearchResults {
    tweets: Vec<Tweet>,
}

impl SearchResults {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    /// All matched tweets, newest first.
    #[must_use]
    pub fn tweets(&self) -> &[Tweet] {
        &self.tweets
    }

    /// Slice out the zero-based `page`-th page of [`PAGE_SIZE`] results.
    #[must_use]
    pub fn page(&self, page: usize) -> Page<Tweet> {
        paginate(&self.tweets, page)
    }

    /// Map a 1-based position (stable across all pages) to its tweet id.
    #[must_use]
    pub fn select(&self, position: usize) -> Option<i64> {
        if position == 0 {
            return None;
        }
        self.tweets.get(position - 1).map(|t| t.tid)
    }
}

impl Storage {
    /// Search tweets by keyword set, returning the materialized union of
    /// text-substring matches and exact hashtag matches.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::NoKeywords`] for an empty keyword set, or a
    /// database error if the query fails.
    pub fn search_tweets(&self, keywords: &[String]) -> Result<SearchResults> {
        if keywords.is_empty() {
            return Err(ChirpError::NoKeywords);
        }

        let text_clauses = keywords.iter().map(|_| "LOWER(text) LIKE ?").join(" OR ");
        let tag_placeholders = keywords.iter().map(|_| "?").join(", ");

        // UNION (not UNION ALL) dedups tweets matched by both paths.
        let query = format!(
            "SELECT {TWEET_COLUMNS}
             FROM tweets
             WHERE {text_clauses}
             UNION
             SELECT t.tid, t.writer_id, t.text, t.tdate, t.ttime, t.replyto_tid
             FROM tweets t
             JOIN hashtag_mentions m ON t.tid = m.tid
             WHERE m.term IN ({tag_placeholders})
             ORDER BY tdate DESC, ttime DESC"
        );

        let sql_params: Vec<String> = keywords
            .iter()
            .map(|kw| format!("%{kw}%"))
            .chain(keywords.iter().cloned())
            .collect();

        let mut stmt = self.connection().prepare(&query)?;
        let tweets: Vec<Tweet> = stmt
            .query_map(params_from_iter(sql_params.iter()), |row| {
                Ok(Tweet {
                    tid: row.get(0)?,
                    writer_id: row.get(1)?,
                    text: row.get(2)?,
                    tdate: parse_date(&row.get::<_, String>(3)?),
                    ttime: parse_time(&row.get::<_, String>(4)?),
                    replyto_tid: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;

        Ok(SearchResults { tweets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignupOutcome;
    use crate::model::PAGE_SIZE;
    use chrono::{NaiveDate, NaiveTime};

    fn signup(storage: &mut Storage, name: &str, email: &str, phone: &str) -> i64 {
        match storage.create_user(name, email, phone, "pw").unwrap() {
            SignupOutcome::Created(usr) => usr,
            other => panic!("signup failed: {other:?}"),
        }
    }

    fn post_at(storage: &mut Storage, writer: i64, text: &str, d: &str, t: &str) -> i64 {
        storage
            .compose_tweet_at(
                writer,
                text,
                NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                NaiveTime::parse_from_str(t, "%H:%M:%S").unwrap(),
                None,
            )
            .unwrap()
            .tid
    }

    #[test]
    fn parse_keywords_trims_lowercases_and_drops_empties() {
        let kws = parse_keywords(" Rust ,, sqlite , RUST ,").unwrap();
        assert_eq!(kws, vec!["rust", "sqlite"]);
    }

    #[test]
    fn parse_keywords_rejects_blank_input() {
        assert!(matches!(parse_keywords("  , ,"), Err(ChirpError::NoKeywords)));
        assert!(matches!(parse_keywords(""), Err(ChirpError::NoKeywords)));
    }

    #[test]
    fn text_match_is_case_insensitive_substring() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        let tid = post_at(&mut storage, usr, "Learning RUST today", "2024-03-01", "09:00:00");
        post_at(&mut storage, usr, "nothing relevant", "2024-03-01", "10:00:00");

        let results = storage.search_tweets(&["rust".to_string()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.tweets()[0].tid, tid);
    }

    #[test]
    fn hashtag_match_is_exact_not_substring() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        post_at(&mut storage, usr, "post about #rustlang", "2024-03-01", "09:00:00");

        // "rust" is a substring of the text, so the text path matches,
        // but the hashtag term "rustlang" is not an exact match.
        let results = storage.search_tweets(&["rust".to_string()]).unwrap();
        assert_eq!(results.len(), 1);

        // A keyword matching neither text substring nor exact tag finds
        // nothing.
        let none = storage.search_tweets(&["golang".to_string()]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn union_dedups_tweets_matching_both_paths() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        // Text contains "world" and the tag term is exactly "world".
        let tid = post_at(&mut storage, usr, "hello #world", "2024-03-01", "09:00:00");

        let results = storage.search_tweets(&["world".to_string()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.tweets()[0].tid, tid);
    }

    #[test]
    fn results_sorted_newest_first() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        let old = post_at(&mut storage, usr, "rust one", "2024-02-01", "09:00:00");
        let newest = post_at(&mut storage, usr, "rust three", "2024-03-02", "08:00:00");
        let mid = post_at(&mut storage, usr, "rust two", "2024-03-01", "23:00:00");

        let results = storage.search_tweets(&["rust".to_string()]).unwrap();
        let tids: Vec<i64> = results.tweets().iter().map(|t| t.tid).collect();
        assert_eq!(tids, vec![newest, mid, old]);
    }

    #[test]
    fn multiple_keywords_are_or_combined() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        post_at(&mut storage, usr, "about rust", "2024-03-01", "09:00:00");
        post_at(&mut storage, usr, "tagged #go", "2024-03-01", "10:00:00");
        post_at(&mut storage, usr, "unrelated", "2024-03-01", "11:00:00");

        let kws = vec!["rust".to_string(), "go".to_string()];
        let results = storage.search_tweets(&kws).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn paging_and_selection_by_stable_position() {
        let mut storage = Storage::open_memory().unwrap();
        let usr = signup(&mut storage, "alice", "alice@example.com", "111");
        let mut tids = Vec::new();
        for i in 0..7 {
            tids.push(post_at(
                &mut storage,
                usr,
                &format!("rust item {i}"),
                "2024-03-01",
                &format!("09:00:{i:02}"),
            ));
        }
        tids.reverse(); // result order is newest first

        let results = storage.search_tweets(&["rust".to_string()]).unwrap();
        let p0 = results.page(0);
        assert_eq!(p0.len(), PAGE_SIZE);
        assert!(p0.has_more);
        let p1 = results.page(1);
        assert_eq!(p1.len(), 2);
        assert!(!p1.has_more);

        // Position 6 is the first item of page 1, mapped by stable
        // position across the whole set.
        assert_eq!(results.select(6), Some(tids[5]));
        assert_eq!(results.select(1), Some(tids[0]));
        assert_eq!(results.select(0), None);
        assert_eq!(results.select(8), None);
    }

    #[test]
    fn empty_keyword_slice_is_rejected_before_querying() {
        let storage = Storage::open_memory().unwrap();
        assert!(matches!(
            storage.search_tweets(&[]),
            Err(ChirpError::NoKeywords)
        ));
    }
}
