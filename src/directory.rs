//! User directory: name search and profile detail views.
//!
//! Name search is a case-insensitive substring match ordered by name
//! length ascending (shortest first); equal-length names keep storage
//! order. The detail view aggregates three independent scalar counts and
//! the subject's three most recent tweets, with a paginated full listing
//! behind it.

use crate::error::{ChirpError, Result};
use crate::model::{PAGE_SIZE, Page, Tweet, UserProfile, UserSummary};
use crate::storage::{Storage, TWEET_COLUMNS, parse_date, parse_time};
use rusqlite::{Row, params};

const RECENT_TWEET_LIMIT: usize = 3;

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

impl Storage {
    /// Search users by name, case-insensitive substring match.
    ///
    /// The whole result set is materialized so callers can page through
    /// it and select an entry by its stable 1-based position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn search_users(&self, keyword: &str) -> Result<Vec<UserSummary>> {
        let mut stmt = self.connection().prepare(
            // usr is the insertion-order tiebreak for equal-length names.
            "SELECT usr, name
             FROM users
             WHERE name COLLATE NOCASE LIKE ?
             ORDER BY LENGTH(name) ASC, usr ASC",
        )?;
        let pattern = format!("%{}%", keyword.trim().to_lowercase());
        let users = stmt
            .query_map(params![pattern], |row| {
                Ok(UserSummary {
                    usr: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(users)
    }

    /// Aggregate profile for one user: tweet/follower/following counts
    /// plus their three most recent tweets, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpError::UserNotFound`] for an unknown id, or a
    /// database error if a query fails.
    pub fn user_profile(&self, usr: i64) -> Result<UserProfile> {
        let Some(user) = self.get_user(usr)? else {
            return Err(ChirpError::user_not_found(usr));
        };

        let (tweet_count, follower_count, following_count) = self.connection().query_row(
            "SELECT
                (SELECT COUNT(*) FROM tweets WHERE writer_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE flwee = ?1),
                (SELECT COUNT(*) FROM follows WHERE flwer = ?1)",
            params![usr],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let sql = format!(
            "SELECT {TWEET_COLUMNS} FROM tweets WHERE writer_id = ?
             ORDER BY tdate DESC, ttime DESC LIMIT {RECENT_TWEET_LIMIT}"
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let recent_tweets = stmt
            .query_map(params![usr], tweet_from_row)?
            .collect::<std::result::Result<_, _>>()?;

        Ok(UserProfile {
            usr: user.usr,
            name: user.name,
            tweet_count,
            follower_count,
            following_count,
            recent_tweets,
        })
    }

    /// One page of a user's full tweet history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn user_tweets_page(&self, usr: i64, page: usize) -> Result<Page<Tweet>> {
        let offset = page.saturating_mul(PAGE_SIZE);
        let sql = format!(
            "SELECT {TWEET_COLUMNS} FROM tweets WHERE writer_id = ?
             ORDER BY tdate DESC, ttime DESC LIMIT ? OFFSET ?"
        );
        let mut stmt = self.connection().prepare(&sql)?;
        // Fetch one extra row to learn whether another page exists.
        let mut tweets: Vec<Tweet> = stmt
            .query_map(
                params![
                    usr,
                    i64::try_from(PAGE_SIZE + 1).unwrap_or(i64::MAX),
                    i64::try_from(offset).unwrap_or(i64::MAX)
                ],
                tweet_from_row,
            )?
            .collect::<std::result::Result<_, _>>()?;

        let has_more = tweets.len() > PAGE_SIZE;
        tweets.truncate(PAGE_SIZE);
        Ok(Page {
            items: tweets,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignupOutcome;
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
    fn name_search_orders_by_length_then_storage_order() {
        let mut storage = Storage::open_memory().unwrap();
        let annette = signup(&mut storage, "Annette", "a1@example.com", "111");
        let dan = signup(&mut storage, "Dan", "a2@example.com", "222");
        let ann = signup(&mut storage, "Ann", "a3@example.com", "333");
        let anna = signup(&mut storage, "Anna", "a4@example.com", "444");

        let results = storage.search_users("an").unwrap();
        let ids: Vec<i64> = results.iter().map(|u| u.usr).collect();
        // "Dan" and "Ann" tie on length; Dan was stored first.
        assert_eq!(ids, vec![dan, ann, anna, annette]);
    }

    #[test]
    fn name_search_is_case_insensitive() {
        let mut storage = Storage::open_memory().unwrap();
        let alice = signup(&mut storage, "Alice", "a@example.com", "111");

        let results = storage.search_users("ALI").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].usr, alice);
    }

    #[test]
    fn profile_aggregates_counts_and_recent_tweets() {
        let mut storage = Storage::open_memory().unwrap();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        let bob = signup(&mut storage, "bob", "bob@example.com", "222");
        let carol = signup(&mut storage, "carol", "carol@example.com", "333");

        storage.follow(bob, alice).unwrap();
        storage.follow(carol, alice).unwrap();
        storage.follow(alice, bob).unwrap();

        for i in 0..4 {
            post_at(
                &mut storage,
                alice,
                &format!("tweet {i}"),
                "2024-03-01",
                &format!("10:00:{i:02}"),
            );
        }

        let profile = storage.user_profile(alice).unwrap();
        assert_eq!(profile.name, "alice");
        assert_eq!(profile.tweet_count, 4);
        assert_eq!(profile.follower_count, 2);
        assert_eq!(profile.following_count, 1);
        assert_eq!(profile.recent_tweets.len(), 3);
        assert_eq!(profile.recent_tweets[0].text, "tweet 3");
    }

    #[test]
    fn profile_for_unknown_user_is_not_found() {
        let storage = Storage::open_memory().unwrap();
        assert!(matches!(
            storage.user_profile(9),
            Err(ChirpError::UserNotFound { usr: 9 })
        ));
    }

    #[test]
    fn user_tweets_paginate_newest_first() {
        let mut storage = Storage::open_memory().unwrap();
        let alice = signup(&mut storage, "alice", "alice@example.com", "111");
        for i in 0..7 {
            post_at(
                &mut storage,
                alice,
                &format!("tweet {i}"),
                "2024-03-01",
                &format!("10:00:{i:02}"),
            );
        }

        let p0 = storage.user_tweets_page(alice, 0).unwrap();
        assert_eq!(p0.len(), PAGE_SIZE);
        assert!(p0.has_more);
        assert_eq!(p0.items[0].text, "tweet 6");

        let p1 = storage.user_tweets_page(alice, 1).unwrap();
        assert_eq!(p1.len(), 2);
        assert!(!p1.has_more);

        let p2 = storage.user_tweets_page(alice, 2).unwrap();
        assert!(p2.is_empty());
    }
}
