/// Suggestion filters: composable quality checks over generated
/// candidate strings.
///
/// Every filter preserves order and only ever removes elements. Filters
/// that detect duplicates take their reference set at construction and
/// copy it on every call, so applying the same filter twice (or from two
/// threads) gives the same answer.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::recommendation::SuggestionGroups;

/// Similarity at or above which two suggestions count as the same event.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

const DEFAULT_BAD_WORDS: &str = include_str!("../../data/bad_words_en.txt");

static EMBEDDED_BAD_WORDS: LazyLock<Arc<FxHashSet<String>>> =
    LazyLock::new(|| Arc::new(parse_bad_words(DEFAULT_BAD_WORDS)));

static JUNK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)[_?!]+",
        r"(?i)[\n()]",
        r"(?i)[^a-z\s]{3,}",
        // Non-printable: control, format, unassigned and separator
        // characters, except a plain space.
        r"[[\p{C}\p{Z}]&&[^ ]]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("cannot read bad words file {path}: {source}")]
    BadWords {
        path: String,
        source: std::io::Error,
    },
}

/// A filter over candidate strings.
pub trait Criteria: fmt::Debug + Send + Sync {
    /// Return the elements that pass, in their original order.
    fn apply(&self, elements: Vec<String>) -> Vec<String>;
}

/// Drops empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmpty;

impl Criteria for NonEmpty {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        elements.retain(|e| !e.is_empty());
        elements
    }
}

/// Drops strings with junk characters: runs of `_?!`, newlines or
/// parentheses, three or more non-letters in a row, or anything
/// non-printable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJunkChars;

impl Criteria for NoJunkChars {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        elements.retain(|e| !JUNK_PATTERNS.iter().any(|p| p.is_match(e)));
        elements
    }
}

/// Keeps strings with at least two space-separated tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtLeastTwoWords;

impl Criteria for AtLeastTwoWords {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        elements.retain(|e| e.split(' ').count() >= 2);
        elements
    }
}

/// Drops strings containing a denylisted word as a whole token.
#[derive(Clone)]
pub struct NoBadWords {
    words: Arc<FxHashSet<String>>,
}

impl NoBadWords {
    pub fn new(words: Arc<FxHashSet<String>>) -> Self {
        Self { words }
    }
}

impl Default for NoBadWords {
    fn default() -> Self {
        Self::new(Arc::clone(&EMBEDDED_BAD_WORDS))
    }
}

impl fmt::Debug for NoBadWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoBadWords")
            .field("words", &self.words.len())
            .finish()
    }
}

impl Criteria for NoBadWords {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        elements.retain(|e| {
            !e.to_lowercase()
                .split_whitespace()
                .any(|token| self.words.contains(token))
        });
        elements
    }
}

/// Drops strings already seen, either earlier in the input or in the
/// reference set. Comparison ignores trailing whitespace, periods and case.
#[derive(Debug, Clone, Default)]
pub struct NoDuplicates {
    reference: BTreeSet<String>,
}

impl NoDuplicates {
    pub fn new<I, S>(reference: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reference: reference
                .into_iter()
                .map(|r| normalize(r.as_ref()))
                .collect(),
        }
    }

    /// The normalized reference set.
    pub fn reference(&self) -> &BTreeSet<String> {
        &self.reference
    }
}

impl Criteria for NoDuplicates {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        let mut seen: FxHashSet<String> = self.reference.iter().cloned().collect();
        elements.retain(|e| seen.insert(normalize(e)));
        elements
    }
}

/// `NoDuplicates`, then drops strings too similar to a reference string,
/// then drops strings too similar to an earlier surviving string.
#[derive(Debug, Clone)]
pub struct NoSemanticDuplicates {
    exact: NoDuplicates,
    threshold: f32,
}

impl NoSemanticDuplicates {
    pub fn new<I, S>(reference: I, threshold: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exact: NoDuplicates::new(reference),
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Criteria for NoSemanticDuplicates {
    fn apply(&self, elements: Vec<String>) -> Vec<String> {
        let mut keep = self.exact.apply(elements);

        // BTreeSet iteration is sorted.
        for reference in self.exact.reference() {
            keep.retain(|k| similarity(k, reference) < self.threshold);
        }

        let mut survivors: Vec<String> = Vec::with_capacity(keep.len());
        for candidate in keep {
            if survivors
                .iter()
                .all(|kept| similarity(&candidate, kept) < self.threshold)
            {
                survivors.push(candidate);
            }
        }
        survivors
    }
}

/// Keeps the first `n` elements.
#[derive(Debug, Clone, Copy)]
pub struct FirstXElements(pub usize);

impl Criteria for FirstXElements {
    fn apply(&self, mut elements: Vec<String>) -> Vec<String> {
        elements.truncate(self.0);
        elements
    }
}

/// Applies each filter in turn; later filters only see what earlier
/// filters kept.
#[derive(Debug, Default)]
pub struct And {
    criteria: Vec<Box<dyn Criteria>>,
}

impl And {
    pub fn new(criteria: Vec<Box<dyn Criteria>>) -> Self {
        Self { criteria }
    }

    pub fn with(mut self, criteria: impl Criteria + 'static) -> Self {
        self.criteria.push(Box::new(criteria));
        self
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl Criteria for And {
    fn apply(&self, elements: Vec<String>) -> Vec<String> {
        self.criteria.iter().fold(elements, |keep, c| {
            let before = keep.len();
            let keep = c.apply(keep);
            debug!(filter = ?c, before, after = keep.len(), "filter stage");
            keep
        })
    }
}

/// Settings for the default filter chain.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub keep: usize,
    pub similarity_threshold: f32,
    pub bad_words: Arc<FxHashSet<String>>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            keep: 3,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            bad_words: Arc::clone(&EMBEDDED_BAD_WORDS),
        }
    }
}

impl FilterPolicy {
    /// The default chain against a reference set of already-used strings:
    /// NonEmpty → NoJunkChars → AtLeastTwoWords → NoBadWords →
    /// NoDuplicates → NoSemanticDuplicates → FirstXElements.
    pub fn criteria(&self, reference: &BTreeSet<String>) -> And {
        And::default()
            .with(NonEmpty)
            .with(NoJunkChars)
            .with(AtLeastTwoWords)
            .with(NoBadWords::new(Arc::clone(&self.bad_words)))
            .with(NoDuplicates::new(reference))
            .with(NoSemanticDuplicates::new(
                reference,
                self.similarity_threshold,
            ))
            .with(FirstXElements(self.keep))
    }

    /// Filter each group of suggestions with a fresh chain.
    ///
    /// Each group's reference set is `existing` plus everything kept for
    /// earlier groups, so a suggestion is offered under at most one step.
    /// Suggestions that were filtered out never block later groups.
    /// Groups left empty are dropped.
    pub fn filter_groups(
        &self,
        raw: SuggestionGroups,
        existing: &BTreeSet<String>,
    ) -> SuggestionGroups {
        let mut reference = existing.clone();
        let mut kept = SuggestionGroups::new();

        for (key, suggestions) in raw {
            let survivors = self.criteria(&reference).apply(suggestions);
            if survivors.is_empty() {
                warn!(step = key.as_str(), "no suggestions survived filtering");
                continue;
            }
            reference.extend(survivors.iter().cloned());
            kept.insert(key, survivors);
        }
        kept
    }
}

/// Lower-case, drop periods, trim trailing whitespace.
pub fn normalize(s: &str) -> String {
    s.trim_end().replace('.', "").to_lowercase()
}

/// Case-insensitive similarity ratio in `[0, 1]`: twice the number of
/// characters in matching blocks over the combined length.
///
/// Blocks are found Ratcliff/Obershelp style: take the longest common run,
/// then recurse on the pieces left and right of it. Reordered words
/// therefore score lower than under a plain LCS ratio. No junk heuristic
/// is applied.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f32 / total as f32
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start_a, start_b, len)`. Ties go to the run starting earliest in `a`,
/// then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best) = (alo, blo, 0);
    // run[j - blo + 1]: length of the common run ending at a[i], b[j].
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut run = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let k = if a[i] == b[j] { prev[j - blo] + 1 } else { 0 };
            run[j - blo + 1] = k;
            if k > best {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best = k;
            }
        }
        std::mem::swap(&mut prev, &mut run);
    }
    (best_i, best_j, best)
}

/// Parse a denylist: one word per line, blank lines ignored.
pub fn parse_bad_words(text: &str) -> FxHashSet<String> {
    text.lines()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

pub fn load_bad_words(path: &Path) -> Result<FxHashSet<String>, FilterError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FilterError::BadWords {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_bad_words(&contents))
}

/// The denylist compiled into the crate.
pub fn embedded_bad_words() -> Arc<FxHashSet<String>> {
    Arc::clone(&EMBEDDED_BAD_WORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn reference(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn check(filter: &dyn Criteria, cases: &[(&[&str], &[&str])]) {
        for (input, expected) in cases {
            let actual = filter.apply(strings(input));
            assert_eq!(
                actual,
                strings(expected),
                "input {:?} through {:?}",
                input,
                filter
            );
        }
    }

    #[test]
    fn non_empty() {
        check(
            &NonEmpty,
            &[(&["", "a"], &["a"]), (&[], &[]), (&["", "", ""], &[])],
        );
    }

    #[test]
    fn at_least_two_words() {
        check(
            &AtLeastTwoWords,
            &[
                (&["", "oneword"], &[]),
                (&["two words"], &["two words"]),
                (&["more than two words", "", ""], &["more than two words"]),
                (&[], &[]),
            ],
        );
    }

    #[test]
    fn first_x_elements() {
        check(&FirstXElements(2), &[(&["", "a", "b", "c"], &["", "a"]), (&["a", "", ""], &["a", ""])]);
        check(&FirstXElements(1), &[(&["a"], &["a"])]);
        check(&FirstXElements(5), &[(&[], &[])]);
    }

    #[test]
    fn no_junk_chars() {
        check(
            &NoJunkChars,
            &[
                (&["\n", "a"], &["a"]),
                (&["ab\u{fe0f}", "a"], &["ab\u{fe0f}", "a"]),
                (&["a\u{200d}b\u{fe0f}", "a"], &["a"]),
                (&["suggestion__", "a"], &["a"]),
                (&["event??", "a"], &["a"]),
                (&["event!!", "a"], &["a"]),
                (&["event???", "a"], &["a"]),
                (&["event(", "a"], &["a"]),
                (&["event)", "a"], &["a"]),
                (&["~~~set fire to self~~~ 6.", "a"], &["a"]),
                (&["~~set fire to self", "a"], &["~~set fire to self", "a"]),
                (&["tab\tinside", "a"], &["a"]),
                (&[], &[]),
            ],
        );
    }

    #[test]
    fn no_bad_words() {
        check(
            &NoBadWords::default(),
            &[
                (&[], &[]),
                (&[""], &[""]),
                (&["help"], &["help"]),
                (&["nsfw"], &[]),
                (&["NSFW"], &[]),
                (&["nsfw stuff"], &[]),
                (&["class"], &["class"]),
            ],
        );
    }

    #[test]
    fn no_bad_words_custom_list() {
        let words = Arc::new(parse_bad_words("Heck\n\n  darn \n"));
        let filter = NoBadWords::new(words);
        check(
            &filter,
            &[(&["oh heck no", "darned socks", "fine"], &["darned socks", "fine"])],
        );
    }

    #[test]
    fn missing_bad_words_file_reports_path() {
        let err = load_bad_words(Path::new("no/such/bad_words.txt")).unwrap_err();
        assert!(err.to_string().contains("no/such/bad_words.txt"));
    }

    #[test]
    fn no_duplicates() {
        let cases: &[(&[&str], &[&str], &[&str])] = &[
            (&["", "a", "b", "c"], &["", "a"], &["b", "c"]),
            (&["", "a", "b", "c"], &["", "a", "b", "c"], &["d", "e"]),
            (&["", "a", "b", "c"], &["", "a", "b", "c"], &[]),
            (&["a", "", ""], &["a", ""], &[]),
            (&["a", "", ""], &["a", ""], &["b", "c"]),
            (&["burn fuel.", "", ""], &[""], &["Burn fuel.", "c"]),
            (&["set fire.", "", ""], &[""], &["set fire", "c"]),
            (&["set fire.", "", ""], &[""], &["set fire ", "c"]),
            (&["set fire. ", "", ""], &[""], &["set fire", "c"]),
            (&["check shipping address.", "", ""], &[""], &["Check shipping address.", "c"]),
            (&[], &[], &["b", "c"]),
        ];
        for (input, expected, refs) in cases {
            let filter = NoDuplicates::new(refs.iter());
            assert_eq!(filter.apply(strings(input)), strings(expected), "input {:?}", input);
        }
    }

    #[test]
    fn no_duplicates_reference_is_not_mutated() {
        let filter = NoDuplicates::new(["a"]);
        assert_eq!(filter.apply(strings(&["b", "c"])), strings(&["b", "c"]));
        assert_eq!(filter.apply(strings(&["b", "c"])), strings(&["b", "c"]));
        assert_eq!(filter.reference().len(), 1);
    }

    #[test]
    fn no_semantic_duplicates() {
        let cases: &[(&[&str], &[&str], &[&str])] = &[
            (
                &["organize the force", "some other event", ""],
                &["some other event", ""],
                &["organize the forces", "c"],
            ),
            (&["analyze data."], &[], &["analyze the data."]),
            (&["build the software."], &["build the software."], &["design the software."]),
            (&["build the software."], &["build the software."], &["share the software."]),
            (&["BUILD SOFTWARE."], &[], &["build the software."]),
            (
                &["a bomb squad is dispatched to the scene", "a bomb squad is called to the scene"],
                &["a bomb squad is dispatched to the scene"],
                &["a"],
            ),
            (&[], &[], &["b", "c"]),
        ];
        for (input, expected, refs) in cases {
            let filter = NoSemanticDuplicates::new(refs.iter(), DEFAULT_SIMILARITY_THRESHOLD);
            assert_eq!(filter.apply(strings(input)), strings(expected), "input {:?}", input);
        }
    }

    #[test]
    fn similarity_is_symmetric_and_case_insensitive() {
        assert_eq!(similarity("Set Fire", "set fire"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let ab = similarity("flee the scene", "leave the scene");
        let ba = similarity("leave the scene", "flee the scene");
        assert!((ab - ba).abs() < f32::EPSILON);
    }

    #[test]
    fn similarity_uses_longest_matching_blocks() {
        // "flee the scene" / "leave the scene": blocks "e the scene" and "le".
        assert!((similarity("flee the scene", "leave the scene") - 26.0 / 29.0).abs() < 1e-6);
        let longer = similarity("flee the scene", "flee the scene quickly");
        assert!((longer - 28.0 / 36.0).abs() < 1e-6);
    }

    #[test]
    fn reordered_words_stay_below_threshold() {
        // Blocks "evidence set " and "leave" give 36 / 46. An LCS ratio
        // would also count "flee" and cross the threshold.
        let score = similarity("evidence set flee leave", "evidence set leave flee");
        assert!((score - 36.0 / 46.0).abs() < 1e-6);
        assert!(score < DEFAULT_SIMILARITY_THRESHOLD);

        let filter =
            NoSemanticDuplicates::new(["evidence set leave flee"], DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(
            filter.apply(strings(&["evidence set flee leave"])),
            strings(&["evidence set flee leave"])
        );
    }

    #[test]
    fn and_threads_survivors() {
        let chain = And::default().with(NonEmpty).with(AtLeastTwoWords).with(FirstXElements(1));
        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.apply(strings(&["", "one", "two words", "three more words"])),
            strings(&["two words"])
        );
    }

    #[test]
    fn default_chain() {
        let policy = FilterPolicy {
            keep: 2,
            ..FilterPolicy::default()
        };
        let chain = policy.criteria(&reference(&["set fire"]));
        let out = chain.apply(strings(&[
            "",
            "flee",
            "set fire.",
            "set a fire",
            "call the police",
            "escape (quickly)",
            "call the police.",
            "hide the evidence",
            "buy more fuel",
        ]));
        assert_eq!(out, strings(&["call the police", "hide the evidence"]));
    }

    #[test]
    fn default_chain_is_idempotent() {
        let policy = FilterPolicy::default();
        let chain = policy.criteria(&reference(&["obtain fuel", "set fire"]));
        let once = chain.apply(strings(&[
            "call the police",
            "call the police now",
            "hide the evidence",
            "flee the scene",
            "watch the building burn",
        ]));
        let twice = policy.criteria(&reference(&["obtain fuel", "set fire"])).apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_groups_accumulates_kept_suggestions() {
        let policy = FilterPolicy::default();
        let raw: SuggestionGroups = vec![
            ("obtain fuel", strings(&["drive to the building", "hide the evidence"])),
            ("set fire", strings(&["hide the evidence", "flee the scene"])),
            ("flee", strings(&["oops", "x"])),
        ]
        .into_iter()
        .collect();
        let kept = policy.filter_groups(raw, &reference(&["obtain fuel", "set fire"]));
        assert_eq!(
            kept.get("obtain fuel"),
            Some(&strings(&["drive to the building", "hide the evidence"])[..])
        );
        assert_eq!(kept.get("set fire"), Some(&strings(&["flee the scene"])[..]));
        assert!(!kept.contains_key("flee"));
    }

    #[test]
    fn filtered_out_suggestions_do_not_block_later_groups() {
        let policy = FilterPolicy {
            keep: 1,
            ..FilterPolicy::default()
        };
        let raw: SuggestionGroups = vec![
            ("a", strings(&["call the police", "hide the evidence"])),
            ("b", strings(&["hide the evidence"])),
        ]
        .into_iter()
        .collect();
        let kept = policy.filter_groups(raw, &BTreeSet::new());
        assert_eq!(kept.get("a"), Some(&strings(&["call the police"])[..]));
        assert_eq!(kept.get("b"), Some(&strings(&["hide the evidence"])[..]));
    }
}
