//! Derivation of flat parameter names from reference paths.
//!
//! A source key with a single reference keeps its own name. A key that fans
//! out to several references names each one by the segments left after
//! trimming the structural prefix and suffix the paths share.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::path::{join_segments, ReferencePath};
use crate::error::{Result, ToolboxError};

/// Separator between segments of a derived name.
pub const NAME_SEPARATOR: &str = ".";

/// What to do when two references reduce to the same (or an empty) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Name the reference by its full joined path instead.
    #[default]
    Fallback,
    /// Refuse to name the tool's parameters.
    Fail,
}

/// Length of the leading run of segments equal across all paths.
pub fn common_prefix_len(paths: &[ReferencePath]) -> usize {
    let Some(first) = paths.first() else {
        return 0;
    };
    let min_len = paths.iter().map(|p| p.len()).min().unwrap_or(0);
    (0..min_len)
        .take_while(|&i| paths.iter().all(|p| p[i] == first[i]))
        .count()
}

/// Length of the trailing run of segments equal across all paths.
///
/// Computed independently of the prefix, so the two windows may overlap on
/// short paths; the overlap shows up as an empty derived name.
pub fn common_suffix_len(paths: &[ReferencePath]) -> usize {
    let Some(first) = paths.first() else {
        return 0;
    };
    let min_len = paths.iter().map(|p| p.len()).min().unwrap_or(0);
    (0..min_len)
        .take_while(|&i| {
            let expected = &first[first.len() - 1 - i];
            paths.iter().all(|p| &p[p.len() - 1 - i] == expected)
        })
        .count()
}

/// Raw derived names for the references found under `key`, in path order.
///
/// Names may be empty or repeated; [`ParameterNamer`] resolves that.
pub fn derive_names(key: &str, paths: &[ReferencePath]) -> Vec<String> {
    if paths.len() == 1 {
        return vec![key.to_string()];
    }

    let prefix = common_prefix_len(paths);
    let suffix = common_suffix_len(paths);
    paths
        .iter()
        .map(|path| {
            let end = path.len().saturating_sub(suffix);
            if prefix >= end {
                String::new()
            } else {
                join_segments(&path[prefix..end], NAME_SEPARATOR)
            }
        })
        .collect()
}

/// How a parameter name came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameOrigin {
    /// The source key itself, for a key with a single reference.
    Key,
    /// Segments left after trimming a fanned-out key's shared prefix and suffix.
    Trimmed,
    /// The full joined path, after a collision.
    FullPath,
}

struct Assigned {
    key: String,
    path: ReferencePath,
    origin: NameOrigin,
}

/// Accumulates unique parameter names for one tool across all of its keys.
///
/// Trimmed names yield to anything else: when a trimmed name clashes, every
/// trimmed claimant is renamed to its full path and the name stays reserved,
/// so the result does not depend on the order keys are added in.
pub struct ParameterNamer<'a> {
    tool: &'a str,
    policy: CollisionPolicy,
    names: BTreeMap<String, Assigned>,
    contested: HashSet<String>,
}

impl<'a> ParameterNamer<'a> {
    pub fn new(tool: &'a str, policy: CollisionPolicy) -> Self {
        Self {
            tool,
            policy,
            names: BTreeMap::new(),
            contested: HashSet::new(),
        }
    }

    /// Name every reference found under `key`. `paths` are relative to the
    /// key's value. Returns the names assigned in path order; a later key can
    /// still move a trimmed name to its full path.
    pub fn add_key(&mut self, key: &str, paths: &[ReferencePath]) -> Result<Vec<String>> {
        let derived = derive_names(key, paths);
        let origin = if paths.len() == 1 {
            NameOrigin::Key
        } else {
            NameOrigin::Trimmed
        };

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for name in &derived {
            *counts.entry(name.as_str()).or_default() += 1;
        }

        let mut assigned = Vec::with_capacity(paths.len());
        for (name, path) in derived.iter().zip(paths) {
            let full_path = path.prefixed(key);
            let mut clashes = name.is_empty()
                || counts.get(name.as_str()).copied().unwrap_or(0) > 1
                || (origin == NameOrigin::Trimmed && self.contested.contains(name));

            if !clashes {
                match self.names.get(name).map(|a| a.origin) {
                    None => {}
                    Some(NameOrigin::Trimmed) => {
                        self.relocate(name)?;
                        clashes = origin == NameOrigin::Trimmed;
                    }
                    Some(_) => clashes = true,
                }
            }

            let (final_name, final_origin) = if clashes {
                self.contested.insert(name.clone());
                (self.resolve_collision(name, &full_path)?, NameOrigin::FullPath)
            } else {
                (name.clone(), origin)
            };

            self.names.insert(
                final_name.clone(),
                Assigned {
                    key: key.to_string(),
                    path: full_path,
                    origin: final_origin,
                },
            );
            assigned.push(final_name);
        }

        Ok(assigned)
    }

    /// Move the trimmed entry under `name` to its full path.
    fn relocate(&mut self, name: &str) -> Result<()> {
        let Some(entry) = self.names.remove(name) else {
            return Ok(());
        };
        self.contested.insert(name.to_string());
        let target = self.resolve_collision(name, &entry.path)?;
        self.names.insert(
            target,
            Assigned {
                origin: NameOrigin::FullPath,
                ..entry
            },
        );
        Ok(())
    }

    fn resolve_collision(&self, name: &str, full_path: &ReferencePath) -> Result<String> {
        let collision = || ToolboxError::NamingCollision {
            tool: self.tool.to_string(),
            name: if name.is_empty() {
                full_path.join(NAME_SEPARATOR)
            } else {
                name.to_string()
            },
        };

        match self.policy {
            CollisionPolicy::Fail => Err(collision()),
            CollisionPolicy::Fallback => {
                let fallback = full_path.join(NAME_SEPARATOR);
                if fallback.is_empty() || self.names.contains_key(&fallback) {
                    return Err(collision());
                }
                tracing::warn!(
                    "Parameter name {:?} of {} is ambiguous, using full path {:?}",
                    name,
                    self.tool,
                    fallback
                );
                Ok(fallback)
            }
        }
    }

    /// Assigned names with the source key each one was found under.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(|(name, assigned)| (name.as_str(), assigned.key.as_str()))
    }

    /// Parameter name to full template path.
    pub fn finish(self) -> BTreeMap<String, ReferencePath> {
        self.names
            .into_iter()
            .map(|(name, assigned)| (name, assigned.path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::path::PathSegment;
    use pretty_assertions::assert_eq;

    fn paths(raw: &[&[&str]]) -> Vec<ReferencePath> {
        raw.iter().map(|p| ReferencePath::new(p.iter().copied())).collect()
    }

    #[test]
    fn test_distinct_tails() {
        let p = paths(&[&["a", "b", "c"], &["a", "b", "d"]]);
        assert_eq!(common_prefix_len(&p), 2);
        assert_eq!(common_suffix_len(&p), 0);
        assert_eq!(derive_names("WFInput", &p), vec!["c", "d"]);
    }

    #[test]
    fn test_distinct_middles() {
        let p = paths(&[&["x", "1", "y"], &["x", "2", "y"]]);
        assert_eq!(common_prefix_len(&p), 1);
        assert_eq!(common_suffix_len(&p), 1);
        assert_eq!(derive_names("WFItems", &p), vec!["1", "2"]);
    }

    #[test]
    fn test_single_path_keeps_key() {
        let p = paths(&[&["Value", "attachmentsByRange", "{0, 1}"]]);
        assert_eq!(derive_names("WFText", &p), vec!["WFText"]);
    }

    #[test]
    fn test_multi_segment_names_are_dot_joined() {
        let p = vec![
            ReferencePath::new(vec![PathSegment::from("Value"), 0.into(), "a".into(), "v".into()]),
            ReferencePath::new(vec![PathSegment::from("Value"), 1.into(), "b".into(), "v".into()]),
        ];
        assert_eq!(derive_names("WFItems", &p), vec!["0.a", "1.b"]);
    }

    #[test]
    fn test_overlapping_windows_give_empty_name() {
        // prefix ["x"] and suffix ["y"] cover all of the shorter path
        let p = paths(&[&["x", "y"], &["x", "z", "y"]]);
        assert_eq!(derive_names("K", &p), vec!["", "z"]);
    }

    #[test]
    fn test_namer_records_full_paths() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        namer
            .add_key("WFInput", &paths(&[&["Value"]]))
            .unwrap();
        let assigned = namer
            .add_key("WFItems", &paths(&[&["x", "1", "y"], &["x", "2", "y"]]))
            .unwrap();
        assert_eq!(assigned, vec!["1", "2"]);

        let names = namer.finish();
        assert_eq!(names["WFInput"], ReferencePath::new(["WFInput", "Value"]));
        assert_eq!(names["1"], ReferencePath::new(["WFItems", "x", "1", "y"]));
        assert_eq!(names["2"], ReferencePath::new(["WFItems", "x", "2", "y"]));
    }

    #[test]
    fn test_empty_name_falls_back_to_full_path() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        let assigned = namer
            .add_key("K", &paths(&[&["x", "y"], &["x", "z", "y"]]))
            .unwrap();
        assert_eq!(assigned, vec!["K.x.y", "z"]);
    }

    #[test]
    fn test_cross_key_collision_falls_back() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        namer.add_key("b", &paths(&[&[]])).unwrap();
        let assigned = namer
            .add_key("A", &paths(&[&["b"], &["c"]]))
            .unwrap();
        assert_eq!(assigned, vec!["A.b", "c"]);
        assert_eq!(namer.finish().len(), 3);
    }

    #[test]
    fn test_cross_key_collision_is_order_independent() {
        let mut forward = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        forward.add_key("b", &paths(&[&[]])).unwrap();
        forward.add_key("A", &paths(&[&["b"], &["c"]])).unwrap();

        let mut reversed = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        let assigned = reversed
            .add_key("A", &paths(&[&["b"], &["c"]]))
            .unwrap();
        assert_eq!(assigned, vec!["b", "c"]);
        reversed.add_key("b", &paths(&[&[]])).unwrap();

        let sources: Vec<(String, String)> = reversed
            .sources()
            .map(|(name, key)| (name.to_string(), key.to_string()))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("A.b".to_string(), "A".to_string()),
                ("b".to_string(), "b".to_string()),
                ("c".to_string(), "A".to_string()),
            ]
        );

        let names = reversed.finish();
        assert_eq!(names, forward.finish());
        assert_eq!(names["b"], ReferencePath::new(["b"]));
        assert_eq!(names["A.b"], ReferencePath::new(["A", "b"]));
    }

    #[test]
    fn test_trimmed_names_from_two_keys_both_fall_back() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        namer.add_key("A", &paths(&[&["x"], &["y"]])).unwrap();
        let assigned = namer.add_key("B", &paths(&[&["x"], &["z"]])).unwrap();
        assert_eq!(assigned, vec!["B.x", "z"]);

        // a third trimmed claimant does not take the reserved name either
        let assigned = namer.add_key("C", &paths(&[&["x"], &["w"]])).unwrap();
        assert_eq!(assigned, vec!["C.x", "w"]);

        let names = namer.finish();
        assert!(!names.contains_key("x"));
        assert_eq!(names["A.x"], ReferencePath::new(["A", "x"]));
    }

    #[test]
    fn test_fail_policy_rejects_cross_key_clash() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fail);
        namer.add_key("A", &paths(&[&["b"], &["c"]])).unwrap();
        let err = namer.add_key("b", &paths(&[&[]])).unwrap_err();
        assert!(matches!(err, ToolboxError::NamingCollision { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_policy_parses_from_cli_value() {
        use clap::ValueEnum;
        assert_eq!(
            CollisionPolicy::from_str("fallback", false),
            Ok(CollisionPolicy::Fallback)
        );
        assert_eq!(CollisionPolicy::from_str("fail", false), Ok(CollisionPolicy::Fail));
        assert!(CollisionPolicy::from_str("strict", false).is_err());
    }

    #[test]
    fn test_fail_policy_reports_collision() {
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fail);
        let err = namer
            .add_key("K", &paths(&[&["x", "y"], &["x", "z", "y"]]))
            .unwrap_err();
        match err {
            ToolboxError::NamingCollision { tool, name } => {
                assert_eq!(tool, "tool");
                assert_eq!(name, "K.x.y");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_siblings_are_both_renamed() {
        // both references end in the same segment after trimming
        let p = vec![
            ReferencePath::new(vec![PathSegment::from("a"), 0.into(), "v".into()]),
            ReferencePath::new(vec![PathSegment::from("b"), 0.into(), "v".into()]),
            ReferencePath::new(vec![PathSegment::from("a"), 1.into(), "v".into()]),
        ];
        assert_eq!(derive_names("K", &p), vec!["a.0", "b.0", "a.1"]);

        let q = paths(&[&["p", "x", "q"], &["p", "x", "r", "q"], &["p", "x", "s", "q"]]);
        let mut namer = ParameterNamer::new("tool", CollisionPolicy::Fallback);
        let assigned = namer.add_key("K", &q).unwrap();
        assert_eq!(assigned, vec!["K.p.x.q", "r", "s"]);
    }
}
