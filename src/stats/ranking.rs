//! Grouped counting and top-N selection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How many entries the leaderboard queries keep
pub const TOP_N: usize = 10;

/// A labelled total (team wins, player runs, matches in a season, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub value: u64,
}

impl LabelCount {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        LabelCount {
            label: label.into(),
            value,
        }
    }
}

/// Per-key totals that remember the order in which keys were first seen.
#[derive(Debug, Default)]
pub struct Tally<'a> {
    entries: Vec<(&'a str, u64)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Tally<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `key`, creating the group on first sight.
    pub fn add(&mut self, key: &'a str, amount: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, amount));
            }
        }
    }

    /// Groups in first-encounter order
    pub fn into_entries(self) -> Vec<LabelCount> {
        self.entries
            .into_iter()
            .map(|(k, v)| LabelCount::new(k, v))
            .collect()
    }

    /// Groups by descending total; equal totals keep first-encounter order.
    pub fn into_descending(self) -> Vec<LabelCount> {
        let mut entries = self.into_entries();
        // sort_by is stable
        entries.sort_by(|a, b| b.value.cmp(&a.value));
        entries
    }

    /// The `n` largest groups, ties resolved by first encounter.
    pub fn top(self, n: usize) -> Vec<LabelCount> {
        let mut entries = self.into_descending();
        entries.truncate(n);
        entries
    }
}

/// Season ordering: numeric seasons numerically, then textual labels lexicographically.
pub fn season_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_accumulates_in_encounter_order() {
        let mut t = Tally::new();
        t.add("b", 1);
        t.add("a", 2);
        t.add("b", 3);
        assert_eq!(
            t.into_entries(),
            vec![LabelCount::new("b", 4), LabelCount::new("a", 2)]
        );
    }

    #[test]
    fn test_top_is_stable_on_ties() {
        let mut t = Tally::new();
        for key in ["z", "y", "x", "w"] {
            t.add(key, 5);
        }
        t.add("v", 9);
        let top = t.top(3);
        let labels: Vec<_> = top.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["v", "z", "y"]);
    }

    #[test]
    fn test_top_never_ascends_and_is_capped() {
        let names: Vec<String> = (0..25).map(|i| format!("p{i}")).collect();
        let mut t = Tally::new();
        for (i, name) in names.iter().enumerate() {
            t.add(name, (i as u64 * 7) % 11);
        }
        let top = t.top(TOP_N);
        assert_eq!(top.len(), TOP_N);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn test_top_with_fewer_groups_than_n() {
        let mut t = Tally::new();
        t.add("only", 1);
        assert_eq!(t.top(TOP_N).len(), 1);
    }

    #[test]
    fn test_season_order() {
        let mut seasons = vec!["2010", "2008", "2007/08", "2009", "2020/21"];
        seasons.sort_by(|a, b| season_order(a, b));
        assert_eq!(seasons, vec!["2008", "2009", "2010", "2007/08", "2020/21"]);
    }
}
