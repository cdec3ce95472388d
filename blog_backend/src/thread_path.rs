//! Materialized ancestry paths for threaded comments.
//!
//! A comment stores the ids of all its ancestors, oldest first, joined with
//! [`SEPARATOR`]. Top-level comments store the empty string. Because every
//! reply's path starts with its root's id, the whole subtree under a root can
//! be counted with a single equality-or-prefix match instead of a recursive
//! walk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SEPARATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThreadPathError {
    #[error("thread path segment {segment:?} in {path:?} is not a comment id")]
    InvalidSegment { path: String, segment: String },
}

/// Ordered ancestor ids of a comment, root first, immediate parent last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPath(Vec<i64>);

impl ThreadPath {
    /// Path of a top-level comment.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_ancestors(ancestors: Vec<i64>) -> Self {
        Self(ancestors)
    }

    /// Path for a new comment replying to `parent_id`, whose own path is
    /// `self`.
    pub fn child_of(&self, parent_id: i64) -> Self {
        let mut ancestors = Vec::with_capacity(self.0.len() + 1);
        ancestors.extend_from_slice(&self.0);
        ancestors.push(parent_id);
        Self(ancestors)
    }

    /// Splits a stored path. `None` and `""` both decode to the root path.
    /// Every segment must be written exactly as [`encode`](Self::encode)
    /// writes ids; `"05"` or `"+5"` would escape the descendant prefix match.
    pub fn decode(raw: Option<&str>) -> Result<Self, ThreadPathError> {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return Ok(Self::root());
        };
        raw.split(SEPARATOR)
            .map(|segment| {
                segment
                    .parse::<i64>()
                    .ok()
                    .filter(|id| *id >= 0 && id.to_string() == segment)
                    .ok_or_else(|| ThreadPathError::InvalidSegment {
                        path: raw.to_string(),
                        segment: segment.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn ancestors(&self) -> &[i64] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

}

impl fmt::Display for ThreadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, id) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

impl FromStr for ThreadPath {
    type Err = ThreadPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(Some(s))
    }
}

/// Stored path of a root's direct children: the root id on its own.
pub fn direct_children_path(root_id: i64) -> String {
    root_id.to_string()
}

/// Prefix shared by every deeper descendant of a root: `"<id>;"`.
pub fn descendant_prefix(root_id: i64) -> String {
    format!("{root_id}{SEPARATOR}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_and_missing_paths_are_root() {
        assert_eq!(ThreadPath::decode(None).unwrap(), ThreadPath::root());
        assert_eq!(ThreadPath::decode(Some("")).unwrap(), ThreadPath::root());
        assert_eq!(ThreadPath::root().encode(), "");
        assert_eq!(ThreadPath::root().depth(), 0);
    }

    #[test]
    fn child_path_appends_parent_id() {
        let root = ThreadPath::root();
        let first = root.child_of(4);
        assert_eq!(first.encode(), "4");
        let second = first.child_of(17);
        assert_eq!(second.encode(), "4;17");
        assert_eq!(second.depth(), first.depth() + 1);
        assert_eq!(second.ancestors(), &[4, 17]);
        assert!(root.is_root());
        assert!(!second.is_root());
    }

    #[test]
    fn decode_rejects_garbage_segments() {
        let err = "3;;9".parse::<ThreadPath>().unwrap_err();
        assert_eq!(
            err,
            ThreadPathError::InvalidSegment {
                path: "3;;9".into(),
                segment: String::new(),
            }
        );
        assert!(ThreadPath::decode(Some("3;x")).is_err());
    }

    #[test]
    fn decode_rejects_non_canonical_ids() {
        for raw in ["+5", "05", "5;07", "-3", " 5"] {
            assert!(
                matches!(
                    ThreadPath::decode(Some(raw)),
                    Err(ThreadPathError::InvalidSegment { .. })
                ),
                "{raw:?} should not decode"
            );
        }
        assert_eq!(ThreadPath::decode(Some("0;50")).unwrap().ancestors(), &[0, 50]);
    }

    #[test]
    fn prefixes_do_not_collide_across_roots() {
        assert_eq!(direct_children_path(1), "1");
        assert_eq!(descendant_prefix(1), "1;");
        assert!(!"12;5".starts_with(&descendant_prefix(1)));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(ids in proptest::collection::vec(0i64..i64::MAX, 0..16)) {
            let path = ThreadPath::from_ancestors(ids.clone());
            let decoded = ThreadPath::decode(Some(&path.encode())).unwrap();
            prop_assert_eq!(decoded.ancestors(), ids.as_slice());
        }
    }
}
