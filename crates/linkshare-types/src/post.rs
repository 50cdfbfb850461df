use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Millis;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of random base36 characters appended after the time prefix.
const RANDOM_SUFFIX_LEN: usize = 11;

/// Opaque identifier of a post.
///
/// Ids are assigned by the creating client and never change. Generated ids
/// are a base36 millisecond timestamp followed by a random base36 suffix, so
/// they sort roughly by creation time and collide only with negligible
/// probability. Ids received from the remote are accepted as-is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Generate a fresh id for a post created at `now`.
    pub fn generate(now: Millis) -> Self {
        Self::generate_with(now, &mut rand::thread_rng())
    }

    /// Generate an id using the supplied random source.
    pub fn generate_with<R: Rng + ?Sized>(now: Millis, rng: &mut R) -> Self {
        let mut id = to_base36(now.as_u64());
        id.reserve(RANDOM_SUFFIX_LEN);
        for _ in 0..RANDOM_SUFFIX_LEN {
            id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
        }
        Self(id)
    }

    /// Validate and wrap an externally supplied id.
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        if s.is_empty() {
            return Err(TypeError::EmptyId);
        }
        if s.chars().any(char::is_control) {
            return Err(TypeError::InvalidId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000), "rs");
    }

    #[test]
    fn generated_id_has_time_prefix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = PostId::generate_with(Millis::new(1_000), &mut rng);
        assert!(id.as_str().starts_with("rs"));
        assert_eq!(id.as_str().len(), 2 + RANDOM_SUFFIX_LEN);
        assert!(id.as_str().bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn generated_ids_do_not_collide_at_same_instant() {
        let now = Millis::new(1_700_000_000_000);
        let ids: HashSet<PostId> = (0..1_000).map(|_| PostId::generate(now)).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn parse_rejects_empty_and_control() {
        assert_eq!(PostId::parse(""), Err(TypeError::EmptyId));
        assert!(matches!(PostId::parse("a\nb"), Err(TypeError::InvalidId(_))));
        assert_eq!(PostId::parse("abc123").unwrap().as_str(), "abc123");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PostId::parse("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }
}
