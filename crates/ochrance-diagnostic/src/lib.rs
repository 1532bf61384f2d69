//! q/p/z diagnostics: the single error currency every fallible operation in
//! this workspace surfaces through. `query` is the structural cause,
//! `priority` is severity, `zone` is blast radius.
#![forbid(unsafe_code)]

mod priority;
mod query;
mod zone;

pub use priority::Priority;
pub use query::Query;
pub use zone::Zone;

use std::fmt;

use serde::{Deserialize, Serialize};

/// `(query, priority, zone)` — the q/p/z triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub query: Query,
    pub priority: Priority,
    pub zone: Zone,
}

impl Diagnostic {
    #[must_use]
    pub fn new(query: Query, priority: Priority, zone: Zone) -> Self {
        Self {
            query,
            priority,
            zone,
        }
    }

    /// `[PRIORITY] query | zone` — the single-line user-visible form.
    #[must_use]
    pub fn render_line(&self) -> String {
        format!("[{}] {} | {}", self.priority, self.query, self.zone)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_line())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_line_matches_spec_shape() {
        let d = Diagnostic::new(
            Query::HashMismatch {
                field: "blocks".into(),
                expected: "sha256:aa".into(),
                actual: "sha256:bb".into(),
            },
            Priority::Error,
            Zone::single_block("2"),
        );
        assert_eq!(
            d.render_line(),
            "[ERROR] hash-mismatch on blocks: expected sha256:aa, got sha256:bb | block:2"
        );
    }

    #[test]
    fn serde_round_trip() {
        let d = Diagnostic::new(
            Query::MissingRequired {
                name: "manifest".into(),
            },
            Priority::Critical,
            Zone::full_subsystem("filesystem"),
        );
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
