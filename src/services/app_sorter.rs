// src/services/app_sorter.rs
//
// Candidate ranking
//
// Order: preferred app, then most recently used, then enumeration order.
// The sort is stable, so ties keep the platform's order.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::{DisplayActivityInfo, PreferredApp};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortedApps {
    pub resolved: Vec<DisplayActivityInfo>,

    /// Preferred app when it is among the candidates, else the last chosen one
    pub filtered_item: Option<DisplayActivityInfo>,
}

/// Rank `candidates` and pick the filtered item.
///
/// With `withhold_filtered_item` the filtered item is removed from
/// `resolved`; otherwise it stays in the list as well.
pub fn sort(
    mut candidates: Vec<DisplayActivityInfo>,
    preferred: Option<&PreferredApp>,
    last_used: &HashMap<String, i64>,
    withhold_filtered_item: bool,
) -> SortedApps {
    for candidate in &mut candidates {
        candidate.last_used = last_used.get(&candidate.package_name).copied();
    }

    candidates.sort_by_key(|candidate| {
        let is_preferred = preferred.is_some_and(|p| candidate.matches_preferred(p));
        (!is_preferred, Reverse(candidate.last_used))
    });

    let filtered_index = preferred
        .and_then(|p| candidates.iter().position(|c| c.matches_preferred(p)))
        .or_else(|| {
            candidates
                .first()
                .filter(|c| c.last_used.is_some())
                .map(|_| 0)
        });

    let filtered_item = match filtered_index {
        Some(index) if withhold_filtered_item => Some(candidates.remove(index)),
        Some(index) => Some(candidates[index].clone()),
        None => None,
    };

    SortedApps {
        resolved: candidates,
        filtered_item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityInfo;

    fn candidate(package: &str) -> DisplayActivityInfo {
        ActivityInfo::new(package, &format!("{}.Main", package), package).to_display(false, None)
    }

    fn candidates() -> Vec<DisplayActivityInfo> {
        vec![candidate("a.first"), candidate("b.second"), candidate("c.third"), candidate("d.fourth")]
    }

    fn packages(list: &[DisplayActivityInfo]) -> Vec<&str> {
        list.iter().map(|c| c.package_name.as_str()).collect()
    }

    #[test]
    fn test_no_data_keeps_enumeration_order() {
        let sorted = sort(candidates(), None, &HashMap::new(), true);
        assert_eq!(packages(&sorted.resolved), vec!["a.first", "b.second", "c.third", "d.fourth"]);
        assert!(sorted.filtered_item.is_none());
    }

    #[test]
    fn test_history_ranks_by_last_used_desc() {
        let history = HashMap::from([("c.third".to_string(), 300), ("b.second".to_string(), 100)]);
        let sorted = sort(candidates(), None, &history, false);

        assert_eq!(packages(&sorted.resolved), vec!["c.third", "b.second", "a.first", "d.fourth"]);
        assert_eq!(sorted.resolved[0].last_used, Some(300));
        assert_eq!(sorted.filtered_item.map(|c| c.package_name), Some("c.third".to_string()));
    }

    #[test]
    fn test_preferred_beats_history_and_is_withheld() {
        let history = HashMap::from([("c.third".to_string(), 300)]);
        let preferred = PreferredApp::new("example.com", "d.fourth", None, true);
        let sorted = sort(candidates(), Some(&preferred), &history, true);

        assert_eq!(sorted.filtered_item.as_ref().map(|c| c.package_name.as_str()), Some("d.fourth"));
        assert_eq!(packages(&sorted.resolved), vec!["c.third", "a.first", "b.second"]);
    }

    #[test]
    fn test_filtered_item_folded_back_in() {
        let preferred = PreferredApp::new("example.com", "b.second", None, false);
        let sorted = sort(candidates(), Some(&preferred), &HashMap::new(), false);

        assert_eq!(sorted.filtered_item.as_ref().map(|c| c.package_name.as_str()), Some("b.second"));
        assert_eq!(packages(&sorted.resolved), vec!["b.second", "a.first", "c.third", "d.fourth"]);
    }

    #[test]
    fn test_preferred_not_installed_falls_back_to_history() {
        let history = HashMap::from([("a.first".to_string(), 5)]);
        let preferred = PreferredApp::new("example.com", "z.gone", None, true);
        let sorted = sort(candidates(), Some(&preferred), &history, true);

        assert_eq!(sorted.filtered_item.map(|c| c.package_name), Some("a.first".to_string()));
        assert_eq!(sorted.resolved.len(), 3);
    }
}
