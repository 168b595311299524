//! Prefix to backend target resolution.
//!
//! The first path segment of the incoming request is the routing key. The
//! table is built once at startup from the validated configuration and is
//! immutable for the process lifetime, so lookups need no locking.
use std::collections::HashMap;

use crate::{config::models::GatewayConfig, core::whitelist::Whitelist};

/// Resolution failure; the pipeline answers these with HTTP 400.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Prefix \"{prefix}\" not found in mappings")]
    PrefixNotFound { prefix: String },
}

/// A backend target derived from one mapping: base URL plus compiled whitelist.
#[derive(Debug)]
pub struct ResolvedTarget {
    /// Absolute backend base URL the remainder path is appended to.
    pub forward: String,
    /// Compiled bypass patterns for this mapping.
    pub whitelist: Whitelist,
}

/// Immutable prefix -> target lookup table.
pub struct TargetTable {
    targets: HashMap<String, ResolvedTarget>,
}

impl TargetTable {
    /// Build the table from configuration, compiling each mapping's whitelist.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut targets = HashMap::new();
        for mapping in &config.mappings {
            let previous = targets.insert(
                mapping.prefix.clone(),
                ResolvedTarget {
                    forward: mapping.forward.clone(),
                    whitelist: Whitelist::compile(&mapping.whitelist),
                },
            );
            if previous.is_some() {
                tracing::warn!(prefix = %mapping.prefix, "Duplicate mapping prefix, later entry wins");
            }
        }
        Self { targets }
    }

    /// Resolve the original path-and-query string into a target and the
    /// remainder (the string with the leading `/prefix` stripped).
    ///
    /// The remainder keeps any query string and is exactly what gets appended
    /// to both the auth and backend base URLs. A request to `/` resolves an
    /// empty prefix, which can never be mapped.
    pub fn resolve<'a>(
        &self,
        original: &'a str,
    ) -> Result<(&ResolvedTarget, &'a str), ResolveError> {
        let rest = match original.strip_prefix('/') {
            Some(rest) => rest,
            None => {
                return Err(ResolveError::PrefixNotFound {
                    prefix: original.to_string(),
                });
            }
        };

        let prefix = rest.split('/').next().unwrap_or_default();
        match self.targets.get(prefix) {
            Some(target) if !prefix.is_empty() => Ok((target, &rest[prefix.len()..])),
            _ => Err(ResolveError::PrefixNotFound {
                prefix: prefix.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
