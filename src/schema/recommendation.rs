use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Version tag written into recommendation files.
pub const RECOMMENDATION_FORMAT_VERSION: &str = "1.0";

/// Candidate suggestions keyed by the step they would follow.
///
/// Keys keep their insertion order: the quota allocator trims groups in
/// that order, so it is part of the observable result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionGroups {
    entries: Vec<(String, Vec<String>)>,
}

impl SuggestionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of suggestions across all keys.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Replace the suggestions for `key`, keeping its position if present.
    pub fn insert(&mut self, key: impl Into<String>, suggestions: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = suggestions,
            None => self.entries.push((key, suggestions)),
        }
    }

    /// Append suggestions to `key`, creating the group if needed.
    pub fn extend(&mut self, key: &str, suggestions: impl IntoIterator<Item = String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.extend(suggestions),
            None => self
                .entries
                .push((key.to_string(), suggestions.into_iter().collect())),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl IntoIterator for SuggestionGroups {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for SuggestionGroups {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        let mut groups = SuggestionGroups::new();
        for (key, suggestions) in iter {
            groups.insert(key, suggestions);
        }
        groups
    }
}

impl Serialize for SuggestionGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, suggestions) in &self.entries {
            map.serialize_entry(key, suggestions)?;
        }
        map.end()
    }
}

struct GroupsVisitor;

impl<'de> Visitor<'de> for GroupsVisitor {
    type Value = SuggestionGroups;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of step ids to suggestion lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut groups = SuggestionGroups::new();
        while let Some((key, suggestions)) = access.next_entry::<String, Vec<String>>()? {
            groups.insert(key, suggestions);
        }
        Ok(groups)
    }
}

impl<'de> Deserialize<'de> for SuggestionGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Step sequences extracted from one schema, with its identifying text
/// echoed for the prompt builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSet {
    pub schema_id: String,
    pub name: String,
    pub description: String,
    pub sequences: Vec<Vec<String>>,
}

/// Filtered, budgeted suggestions for one schema, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub format_version: String,
    pub schema_id: String,
    pub schema_name: String,
    pub events: SuggestionGroups,
}

impl RecommendationSet {
    pub fn new(schema_id: &str, schema_name: &str, events: SuggestionGroups) -> Self {
        Self {
            format_version: RECOMMENDATION_FORMAT_VERSION.to_string(),
            schema_id: schema_id.to_string(),
            schema_name: schema_name.to_string(),
            events,
        }
    }

    /// Rows of `[step, suggestion, suggestion, ...]` as the schema view
    /// displays them.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.events
            .iter()
            .map(|(key, suggestions)| {
                std::iter::once(key.to_string())
                    .chain(suggestions.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
