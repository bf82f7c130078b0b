use crate::error::Result;
use crate::model::OTHER_KEY;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Language of a file: its lower-cased extension, or `Other`.
pub fn language_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| OTHER_KEY.to_string())
}

/// Gitignore-syntax exclusion patterns applied to repository-relative paths.
pub struct ExcludeMatcher {
    matcher: Option<Gitignore>,
}

impl ExcludeMatcher {
    pub fn new<P: AsRef<Path>>(root: P, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { matcher: None });
        }
        let mut builder = GitignoreBuilder::new(root.as_ref());
        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }
        Ok(Self {
            matcher: Some(builder.build()?),
        })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        match &self.matcher {
            Some(m) => m.matched_path_or_any_parents(path, false).is_ignore(),
            None => false,
        }
    }
}
