//! Locations of nodes inside a parameter tree.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// One step into a tree: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// Sequence index this segment addresses, if it can address one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => {
                if !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()) {
                    k.parse().ok()
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered list of segments locating a node inside a root node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferencePath(Vec<PathSegment>);

impl ReferencePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// This path extended by one segment.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// `head` followed by this path.
    pub fn prefixed(&self, head: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.push(head.into());
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Segments rendered and joined with `sep`.
    pub fn join(&self, sep: &str) -> String {
        join_segments(&self.0, sep)
    }
}

pub fn join_segments(segments: &[PathSegment], sep: &str) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl Deref for ReferencePath {
    type Target = [PathSegment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.join("."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_keys_as_strings_and_indices_as_numbers() {
        let path = ReferencePath::new(vec![PathSegment::from("WFItems"), 2.into(), "Value".into()]);
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["WFItems", 2, "Value"]));

        let back: ReferencePath = serde_json::from_value(json!(["WFItems", 2, "Value"])).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_as_index() {
        assert_eq!(PathSegment::Index(3).as_index(), Some(3));
        assert_eq!(PathSegment::from("12").as_index(), Some(12));
        assert_eq!(PathSegment::from("-1").as_index(), None);
        assert_eq!(PathSegment::from("x").as_index(), None);
        assert_eq!(PathSegment::from("").as_index(), None);
    }

    #[test]
    fn test_prefix_and_display() {
        let tail = ReferencePath::new(["Value", "attachmentsByRange"]);
        let full = tail.prefixed("WFInput");
        assert_eq!(full.to_string(), "WFInput.Value.attachmentsByRange");
        assert_eq!(full.segments()[1..], tail.segments()[..]);
        assert_eq!(ReferencePath::root().to_string(), "<root>");
    }
}
