//! Data models for the chirp engine.
//!
//! These structures are the normalized form of rows in the relational
//! store: accounts, tweets, retweet events, follow edges, favorite lists,
//! and the derived records the retrieval paths return (feed items, pages,
//! profiles).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Fixed page size for every paginated retrieval path.
pub const PAGE_SIZE: usize = 5;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub usr: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Stored verbatim; login compares case-sensitively.
    pub pwd: String,
}

/// An authored text record. Replies are tweets with `replyto_tid` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub tid: i64,
    pub writer_id: i64,
    pub text: String,
    pub tdate: NaiveDate,
    pub ttime: NaiveTime,
    pub replyto_tid: Option<i64>,
}

/// A share event referencing an existing tweet.
///
/// Identity is the (tid, retweeter) pair; `writer_id` is denormalized from
/// the original tweet at insert time. Retweets carry a date but no time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retweet {
    pub tid: i64,
    pub retweeter_id: i64,
    pub writer_id: i64,
    pub spam: bool,
    pub rdate: NaiveDate,
}

/// A directed follow relationship: `flwer` sees `flwee`'s content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub flwer: i64,
    pub flwee: i64,
    pub start_date: NaiveDate,
}

/// A named favorite list with its member tweet ids.
///
/// An owned list with zero members is still reported, with an empty
/// member set, rather than being omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteList {
    pub lname: String,
    pub tids: Vec<i64>,
}

/// What kind of record a feed item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemKind {
    Tweet,
    Retweet,
}

/// One entry in the merged feed stream.
///
/// For retweets, `text` is the original tweet's text but `date` is the
/// retweet's own date, and `time` is absent (retweets carry no time
/// component; on date ties they sort after timed entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub kind: FeedItemKind,
    pub tid: i64,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub text: String,
}

/// A page of results with a load-more indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty terminal page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Slice a materialized result set into its `page`-th page of [`PAGE_SIZE`].
///
/// `has_more` reflects whether any items remain past the returned slice.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let start = page.saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return Page::empty();
    }
    let end = usize::min(start + PAGE_SIZE, items.len());
    Page {
        items: items[start..end].to_vec(),
        has_more: end < items.len(),
    }
}

/// Retweet and reply counts for one tweet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TweetStats {
    pub tid: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
}

/// Minimal user record for directory listings and follower lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub usr: i64,
    pub name: String,
}

/// Aggregate profile view for the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub usr: i64,
    pub name: String,
    pub tweet_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    /// The 3 most recent tweets, newest first.
    pub recent_tweets: Vec<Tweet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_fixed_pages() {
        let items: Vec<i32> = (0..12).collect();

        let p0 = paginate(&items, 0);
        assert_eq!(p0.items, vec![0, 1, 2, 3, 4]);
        assert!(p0.has_more);

        let p1 = paginate(&items, 1);
        assert_eq!(p1.items, vec![5, 6, 7, 8, 9]);
        assert!(p1.has_more);

        let p2 = paginate(&items, 2);
        assert_eq!(p2.items, vec![10, 11]);
        assert!(!p2.has_more);
    }

    #[test]
    fn paginate_past_end_is_empty() {
        let items = vec![1, 2, 3];
        let page = paginate(&items, 1);
        assert!(page.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn paginate_exact_boundary() {
        let items: Vec<i32> = (0..5).collect();
        let p0 = paginate(&items, 0);
        assert_eq!(p0.len(), 5);
        assert!(!p0.has_more);
        assert!(paginate(&items, 1).is_empty());
    }

    #[test]
    fn feed_item_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FeedItemKind::Retweet).unwrap(),
            "\"retweet\""
        );
    }
}
