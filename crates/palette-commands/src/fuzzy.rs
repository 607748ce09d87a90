//! Fuzzy filtering of palette entries using nucleo (Helix editor's fuzzy matcher)

use nucleo::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use std::cmp::Reverse;

/// Score of `text` against `query`, `None` when it does not match
pub fn fuzzy_score(query: &str, text: &str) -> Option<u32> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(query, CaseMatching::Smart, Normalization::Smart, AtomKind::Fuzzy);
    let mut buf = Vec::new();
    pattern
        .score(Utf32Str::new(text, &mut buf), &mut matcher)
        .map(Into::into)
}

/// Keep the items whose key matches `query`, best match first.
///
/// An empty query keeps every item in its original order; ties keep their
/// original relative order too.
pub fn fuzzy_lookup<T>(query: &str, items: Vec<T>, key: impl Fn(&T) -> &str) -> Vec<T> {
    let query = query.trim();
    if query.is_empty() {
        return items;
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(query, CaseMatching::Smart, Normalization::Smart, AtomKind::Fuzzy);
    let mut buf = Vec::new();

    let mut scored: Vec<(u32, T)> = items
        .into_iter()
        .filter_map(|item| {
            let score = pattern.score(Utf32Str::new(key(&item), &mut buf), &mut matcher)?;
            Some((score.into(), item))
        })
        .collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().map(|(_, item)| item).collect()
}
