use std::fmt;

use serde::{Deserialize, Serialize};

/// Blast radius of a diagnostic: the scope of storage or document it
/// concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Zone {
    SingleBlock { path: String },
    Subtree { root: String, depth: u32 },
    FullSubsystem { name: String },
    CrossCutting { list: Vec<String> },
}

impl Zone {
    #[must_use]
    pub fn single_block(path: impl Into<String>) -> Self {
        Self::SingleBlock { path: path.into() }
    }

    #[must_use]
    pub fn full_subsystem(name: impl Into<String>) -> Self {
        Self::FullSubsystem { name: name.into() }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleBlock { path } => write!(f, "block:{path}"),
            Self::Subtree { root, depth } => write!(f, "subtree:{root}@{depth}"),
            Self::FullSubsystem { name } => write!(f, "subsystem:{name}"),
            Self::CrossCutting { list } => write!(f, "cross-cutting:[{}]", list.join(",")),
        }
    }
}
