//! Read-only views over the local store.
//!
//! Every projection is computed from scratch on each call and returns an
//! owned `Vec`, so no view can drift out of sync with the store.

use std::fmt;
use std::str::FromStr;

use linkshare_types::Record;
use serde::{Deserialize, Serialize};

use crate::store::LocalStore;

/// Row limits for the bounded views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionLimits {
    pub recent: usize,
    pub trending: usize,
}

impl Default for ProjectionLimits {
    fn default() -> Self {
        Self {
            recent: 10,
            trending: 10,
        }
    }
}

/// Which feed a reader is looking at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedTab {
    #[default]
    Home,
    Recent,
    Trending,
    Search,
}

impl FeedTab {
    pub const ALL: [FeedTab; 4] = [Self::Home, Self::Recent, Self::Trending, Self::Search];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Recent => "recent",
            Self::Trending => "trending",
            Self::Search => "search",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Home => "All Posts",
            Self::Recent => "Recent Posts",
            Self::Trending => "Trending Posts",
            Self::Search => "Search Results",
        }
    }

    pub fn subtitle(&self, query: &str, limits: &ProjectionLimits) -> String {
        match self {
            Self::Home => "Latest updates from everyone".into(),
            Self::Recent => format!("Most recent {} posts", limits.recent),
            Self::Trending => "Most liked posts".into(),
            Self::Search if query.trim().is_empty() => "Enter a username to search".into(),
            Self::Search => format!("Results for \"{}\"", query.trim()),
        }
    }

    /// Message shown when the view has no rows.
    pub fn empty_message(&self, query: &str) -> &'static str {
        match self {
            Self::Search if query.trim().is_empty() => "Enter a username to search",
            Self::Search => "No posts found for that user",
            _ => "No posts yet. Be the first to share!",
        }
    }
}

impl fmt::Display for FeedTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "recent" => Ok(Self::Recent),
            "trending" => Ok(Self::Trending),
            "search" => Ok(Self::Search),
            other => Err(format!("unknown feed tab '{other}'")),
        }
    }
}

/// Stateless projections over a slice of records in store order.
#[derive(Clone, Copy, Debug)]
pub struct ProjectionEngine<'a> {
    records: &'a [Record],
    limits: ProjectionLimits,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(records: &'a [Record], limits: ProjectionLimits) -> Self {
        Self { records, limits }
    }

    pub fn over(store: &'a LocalStore, limits: ProjectionLimits) -> Self {
        Self::new(store.all(), limits)
    }

    /// Everything, in store order.
    pub fn home(&self) -> Vec<Record> {
        self.records.to_vec()
    }

    /// Newest first, at most `limits.recent` rows.
    pub fn recent(&self) -> Vec<Record> {
        let mut rows = self.records.to_vec();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(self.limits.recent);
        rows
    }

    /// Most liked first, at most `limits.trending` rows. Ties keep store order.
    pub fn trending(&self) -> Vec<Record> {
        let mut rows = self.records.to_vec();
        rows.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        rows.truncate(self.limits.trending);
        rows
    }

    /// Records whose author contains `query`, ignoring case and surrounding
    /// whitespace. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<Record> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.author.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn view(&self, tab: FeedTab, query: &str) -> Vec<Record> {
        match tab {
            FeedTab::Home => self.home(),
            FeedTab::Recent => self.recent(),
            FeedTab::Trending => self.trending(),
            FeedTab::Search => self.search(query),
        }
    }
}
