//! Post input and its validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Check the fields of a new post.
///
/// Content is checked before author. Whitespace-only counts as empty. The
/// values themselves are stored as entered.
pub fn validate_post(content: &str, author: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if author.trim().is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }
    Ok(())
}

/// Transient post input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub content: String,
    pub author: String,
}

impl Draft {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post(&self.content, &self.author)
    }

    /// Reset after a successful post. The author stays filled in.
    pub fn clear_content(&mut self) {
        self.content.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(validate_post("", "alice"), Err(ValidationError::EmptyContent));
        assert_eq!(validate_post(" \n\t", "alice"), Err(ValidationError::EmptyContent));
        assert_eq!(validate_post("hi", "   "), Err(ValidationError::EmptyAuthor));
        assert_eq!(validate_post("", ""), Err(ValidationError::EmptyContent));
        assert_eq!(validate_post("hi", "alice"), Ok(()));
    }

    #[test]
    fn clearing_keeps_author() {
        let mut draft = Draft::new("hello", "alice");
        assert!(draft.validate().is_ok());
        draft.clear_content();
        assert_eq!(draft.content, "");
        assert_eq!(draft.author, "alice");
        assert_eq!(draft.validate(), Err(ValidationError::EmptyContent));
    }
}
