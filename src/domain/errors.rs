use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::path::AttrPath;
use crate::domain::violation::Violation;

/// Serialized key for violations that belong to a nested node itself.
///
/// `.` can never be an attribute segment, so it cannot collide with a real key.
pub const OWN_KEY: &str = ".";

/// Violations keyed by attribute, nested the same way the validated data is.
///
/// Keys keep insertion order, so violations for distinct attributes appear in
/// the order their rules were declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorSet {
    own: Vec<Violation>,
    entries: IndexMap<String, ErrorSet>,
}

/// View of the errors stored under one key of an [`ErrorSet`].
///
/// A key without children is a plain violation list; a key with children is
/// nested, and keeps its own violations in [`ErrorSet::own`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorEntry<'a> {
    Violations(&'a [Violation]),
    Nested(&'a ErrorSet),
}

impl<'a> ErrorEntry<'a> {
    fn of(set: &'a ErrorSet) -> Self {
        if set.entries.is_empty() {
            Self::Violations(&set.own)
        } else {
            Self::Nested(set)
        }
    }

    pub fn as_violations(self) -> Option<&'a [Violation]> {
        match self {
            Self::Violations(list) => Some(list),
            Self::Nested(_) => None,
        }
    }

    pub fn as_nested(self) -> Option<&'a ErrorSet> {
        match self {
            Self::Violations(_) => None,
            Self::Nested(set) => Some(set),
        }
    }
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty() && self.entries.is_empty()
    }

    /// Total number of violations, nested ones included.
    pub fn len(&self) -> usize {
        self.own.len() + self.entries.values().map(ErrorSet::len).sum::<usize>()
    }

    /// Violations recorded against this node itself rather than one of its keys.
    pub fn own(&self) -> &[Violation] {
        &self.own
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ErrorEntry<'_>)> {
        self.entries
            .iter()
            .map(|(key, set)| (key.as_str(), ErrorEntry::of(set)))
    }

    pub fn get(&self, key: &str) -> Option<ErrorEntry<'_>> {
        self.entries.get(key).map(ErrorEntry::of)
    }

    /// Looks up a dotted path such as `customer.address.city`.
    pub fn get_path(&self, path: &str) -> Option<ErrorEntry<'_>> {
        self.node(path).map(ErrorEntry::of)
    }

    fn node(&self, path: &str) -> Option<&ErrorSet> {
        path.split('.').try_fold(self, |set, segment| set.entries.get(segment))
    }

    /// True when anything, nested violations included, was recorded under `path`.
    pub fn contains(&self, path: &AttrPath) -> bool {
        if path.is_root() {
            return !self.is_empty();
        }
        path.segments()
            .iter()
            .try_fold(self, |set, segment| set.entries.get(segment))
            .is_some()
    }

    /// Violations recorded exactly at `path`, without descending into children.
    pub fn violations_at(&self, path: &str) -> &[Violation] {
        self.node(path)
            .map(|set| set.own.as_slice())
            .unwrap_or_default()
    }

    /// Appends `violation` under `path`, creating nested levels as needed.
    pub fn push(&mut self, path: &AttrPath, violation: Violation) {
        self.push_at(path.segments(), violation);
    }

    fn push_at(&mut self, segments: &[String], violation: Violation) {
        match segments {
            [] => self.own.push(violation),
            [key, rest @ ..] => self.child_mut(key).push_at(rest, violation),
        }
    }

    fn child_mut(&mut self, key: &str) -> &mut ErrorSet {
        self.entries.entry(key.to_string()).or_default()
    }

    /// Combines `other` into `self`: violation lists of shared keys are
    /// concatenated, nested sets merged recursively, and new keys appended.
    pub fn merge(&mut self, other: ErrorSet) {
        self.own.extend(other.own);
        for (key, set) in other.entries {
            self.entries.entry(key).or_default().merge(set);
        }
    }

    /// Merges the errors of a nested schema under `path`.
    pub fn merge_at(&mut self, path: &AttrPath, other: ErrorSet) {
        if other.is_empty() {
            return;
        }
        let mut target = self;
        for segment in path.segments() {
            target = target.child_mut(segment);
        }
        target.merge(other);
    }

    /// All violations depth-first in insertion order; each carries its full path.
    pub fn violations(&self) -> Vec<&Violation> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Violation>) {
        out.extend(self.own.iter());
        for set in self.entries.values() {
            set.collect_into(out);
        }
    }
}

impl Serialize for ErrorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let own_len = usize::from(!self.own.is_empty());
        let mut map = serializer.serialize_map(Some(self.entries.len() + own_len))?;
        if !self.own.is_empty() {
            map.serialize_entry(OWN_KEY, &self.own)?;
        }
        for (key, entry) in self.iter() {
            match entry {
                ErrorEntry::Violations(list) => map.serialize_entry(key, list)?,
                ErrorEntry::Nested(set) => map.serialize_entry(key, set)?,
            }
        }
        map.end()
    }
}
