//! Compiled whitelist pattern matching.
//!
//! Patterns use shell-glob semantics (`*`, `?`, character classes) and are
//! matched against the complete remainder path, not as a prefix. They are
//! compiled once at configuration load; patterns that fail to compile are
//! skipped there rather than failing requests later.
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A set of glob matchers deciding whether a remainder path bypasses auth.
#[derive(Debug)]
pub struct Whitelist {
    set: GlobSet,
}

impl Whitelist {
    /// Compile the configured patterns. Invalid patterns are dropped silently.
    pub fn compile(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            // literal_separator stays off so `*` can span path segments
            match GlobBuilder::new(pattern).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    tracing::debug!(pattern = %pattern, error = %e, "Skipping invalid whitelist pattern");
                }
            }
        }

        let set = builder.build().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Whitelist compilation failed, treating as empty");
            GlobSet::empty()
        });
        Self { set }
    }

    /// True if any pattern matches the full remainder path (short-circuits).
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
