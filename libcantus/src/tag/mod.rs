//! Tag classification.

use serde::Serialize;
use std::fmt;


/// What kind of version a tag name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagKind {
    Latest,
    Snapshot,
    Major,
    Minor,
    Bugfix,
    AuroraVersion,
    AuroraSnapshotVersion,
    CommitHash,
}

impl TagKind {
    /// Classifies a tag name. First match wins.
    ///
    /// A seven character hex string is a commit hash even when it is all
    /// digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::tag::TagKind;
    ///
    /// assert_eq!(TagKind::classify("4.2.4"), TagKind::Bugfix);
    /// assert_eq!(TagKind::classify("4007103"), TagKind::CommitHash);
    /// ```
    pub fn classify(tag: &str) -> Self {
        let lower = tag.to_lowercase();

        if lower == "latest" {
            Self::Latest
        } else if lower.ends_with("-snapshot") {
            Self::Snapshot
        } else if lower.starts_with("snapshot-") {
            Self::AuroraSnapshotVersion
        } else if is_commit_hash(tag) {
            Self::CommitHash
        } else {
            match numeric_components(tag) {
                Some(1) => Self::Major,
                Some(2) => Self::Minor,
                Some(3) => Self::Bugfix,
                _ => Self::AuroraVersion,
            }
        }
    }

    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "LATEST",
            Self::Snapshot => "SNAPSHOT",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Bugfix => "BUGFIX",
            Self::AuroraVersion => "AURORA_VERSION",
            Self::AuroraSnapshotVersion => "AURORA_SNAPSHOT_VERSION",
            Self::CommitHash => "COMMIT_HASH",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_commit_hash(tag: &str) -> bool {
    tag.len() == 7 && tag.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Number of dot-separated components when every one is a non-empty run of digits.
fn numeric_components(tag: &str) -> Option<usize> {
    let mut count = 0;
    for part in tag.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        count += 1;
    }
    Some(count)
}

/// A tag name with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TagKind,
}

impl TagEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = TagKind::classify(&name);
        Self { name, kind }
    }
}

/// All tags of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagList {
    /// `registry/group/name`
    pub repository: String,
    pub tags: Vec<TagEntry>,
}
