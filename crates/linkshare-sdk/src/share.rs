//! Share links and view-mode resolution.
//!
//! A share link is `{origin}{path}?post={id}`. Opening one puts the session
//! in single-post mode; anything else opens the live feed.

use std::fmt;

use linkshare_types::PostId;
use serde::{Deserialize, Serialize};

/// Query parameter that carries the shared post id.
pub const POST_PARAM: &str = "post";

/// Where the application is served from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareBase {
    pub origin: String,
    pub path: String,
}

impl Default for ShareBase {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".into(),
            path: "/".into(),
        }
    }
}

/// How a session presents records. Decided once, when the session opens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewMode {
    LiveFeed,
    SingleShared(PostId),
}

impl ViewMode {
    /// Resolve from a request query string such as `?post=abc`.
    pub fn from_query(query: &str) -> Self {
        match parse_requested_id(query) {
            Some(id) => Self::SingleShared(id),
            None => Self::LiveFeed,
        }
    }

    /// Resolve from a full link.
    pub fn from_link(url: &str) -> Self {
        match parse_link(url) {
            Some(id) => Self::SingleShared(id),
            None => Self::LiveFeed,
        }
    }

    pub fn shared_id(&self) -> Option<&PostId> {
        match self {
            Self::LiveFeed => None,
            Self::SingleShared(id) => Some(id),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::LiveFeed)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LiveFeed => f.write_str("live feed"),
            Self::SingleShared(id) => write!(f, "shared post {id}"),
        }
    }
}

/// `{origin}{path}?post={id}`.
pub fn build_link(base: &ShareBase, id: &PostId) -> String {
    format!(
        "{}?{}={}",
        base_link(base),
        POST_PARAM,
        percent_encode(id.as_str())
    )
}

/// `{origin}{path}`, the link back to the full feed.
pub fn base_link(base: &ShareBase) -> String {
    format!("{}{}", base.origin, base.path)
}

/// The shared post id in a query string, if any.
///
/// The leading `?` is optional. The first `post` parameter wins; a blank
/// value counts as absent.
pub fn parse_requested_id(query: &str) -> Option<PostId> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let raw = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| percent_decode(key) == POST_PARAM)
        .map(|(_, value)| percent_decode(value))?;

    if raw.trim().is_empty() {
        return None;
    }
    PostId::parse(raw).ok()
}

/// The shared post id in a full link. The fragment is ignored.
pub fn parse_link(url: &str) -> Option<PostId> {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    let (_, query) = url.split_once('?')?;
    parse_requested_id(query)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if is_unreserved(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Form-style decoding: `+` is a space, `%XX` a byte. Malformed escapes
/// are kept literally.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}
