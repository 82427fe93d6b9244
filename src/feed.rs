//! Feed aggregation: the merged, chronologically descending stream of
//! content from followed users.
//!
//! One `UNION ALL` query merges two sources:
//!
//! - original tweets authored by anyone the viewer follows;
//! - non-spam retweets performed by anyone the viewer follows, projected
//!   to the original tweet's text but the retweet's own date, with an
//!   empty time-of-day (retweets carry no time component).
//!
//! Ordering is `(date DESC, time DESC)`; the empty time string collates
//! below every real `HH:MM:SS` value, so on a date tie retweets sort
//! after timed entries. The missing time acts as a minimum sentinel.
//!
//! Pagination is offset-based with a fixed page size of [`PAGE_SIZE`].
//! Three end states are distinguishable from the returned [`Page`]: an
//! empty page at offset 0 means no eligible content exists at all, an
//! empty page at a later offset means the stream is exhausted, and
//! `has_more` (a lookahead probe one page ahead) tells whether another
//! page is worth requesting.

use crate::error::Result;
use crate::model::{FeedItem, FeedItemKind, PAGE_SIZE, Page};
use crate::storage::{Storage, parse_date, parse_time};
use rusqlite::{OptionalExtension, params};

const FEED_QUERY: &str = "
    SELECT 'tweet' AS kind, tid, tdate, ttime, text
    FROM tweets
    WHERE writer_id IN (SELECT flwee FROM follows WHERE flwer = ?1)

    UNION ALL

    SELECT 'retweet' AS kind, r.tid, r.rdate AS tdate, '' AS ttime, t.text
    FROM retweets r
    JOIN tweets t ON r.tid = t.tid
    WHERE r.retweeter_id IN (SELECT flwee FROM follows WHERE flwer = ?1)
      AND r.spam = 0

    ORDER BY tdate DESC, ttime DESC
    LIMIT ?2 OFFSET ?3
";

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Storage {
    /// Fetch one page of the viewer's feed starting at `offset` items in.
    ///
    /// Read-only; `has_more` is computed by probing for a single row one
    /// page past the returned slice.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub fn feed_page(&self, viewer: i64, offset: usize) -> Result<Page<FeedItem>> {
        let mut stmt = self.connection().prepare(FEED_QUERY)?;
        let items: Vec<FeedItem> = stmt
            .query_map(
                params![viewer, to_i64(PAGE_SIZE), to_i64(offset)],
                |row| {
                    let kind: String = row.get(0)?;
                    let time_raw: String = row.get(3)?;
                    Ok(FeedItem {
                        kind: if kind == "retweet" {
                            FeedItemKind::Retweet
                        } else {
                            FeedItemKind::Tweet
                        },
                        tid: row.get(1)?,
                        date: parse_date(&row.get::<_, String>(2)?),
                        time: if time_raw.is_empty() {
                            None
                        } else {
                            Some(parse_time(&time_raw))
                        },
                        text: row.get(4)?,
                    })
                },
            )?
            .collect::<std::result::Result<_, _>>()?;

        // A short page is definitively the last one; a full page needs a
        // one-row lookahead at the next offset.
        let has_more = if items.len() < PAGE_SIZE {
            false
        } else {
            let probe: Option<i64> = self
                .connection()
                .query_row(
                    FEED_QUERY,
                    params![viewer, 1_i64, to_i64(offset + PAGE_SIZE)],
                    |r| r.get(1),
                )
                .optional()?;
            probe.is_some()
        };

        Ok(Page { items, has_more })
    }
}
