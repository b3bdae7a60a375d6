//! Category helpers over a timer collection

use serde::Serialize;

use crate::state::Timer;

/// Filter value that selects every category
pub const ALL_CATEGORIES: &str = "All";

/// Timers sharing one category, in collection order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub timers: Vec<Timer>,
}

/// Distinct categories in order of first appearance
pub fn available_categories(timers: &[Timer]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for timer in timers {
        if !categories.contains(&timer.category) {
            categories.push(timer.category.clone());
        }
    }
    categories
}

/// `"All"` returns the collection unchanged, anything else keeps only that category
pub fn filter_timers_by_category(timers: &[Timer], filter: &str) -> Vec<Timer> {
    if filter == ALL_CATEGORIES {
        return timers.to_vec();
    }
    timers
        .iter()
        .filter(|timer| timer.category == filter)
        .cloned()
        .collect()
}

/// Group by category; groups appear in first-seen order, timers keep their relative order
pub fn group_timers_by_category(timers: &[Timer]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for timer in timers {
        match groups.iter_mut().find(|g| g.category == timer.category) {
            Some(group) => group.timers.push(timer.clone()),
            None => groups.push(CategoryGroup {
                category: timer.category.clone(),
                timers: vec![timer.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(name: &str, category: &str) -> Timer {
        Timer::new(name.into(), category.into(), 60, false)
    }

    fn sample() -> Vec<Timer> {
        vec![timer("item0", "A"), timer("item1", "B"), timer("item2", "A")]
    }

    #[test]
    fn groups_preserve_encounter_order() {
        let timers = sample();
        let groups = group_timers_by_category(&timers);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "A");
        assert_eq!(groups[0].timers, vec![timers[0].clone(), timers[2].clone()]);
        assert_eq!(groups[1].category, "B");
        assert_eq!(groups[1].timers, vec![timers[1].clone()]);
    }

    #[test]
    fn filter_all_is_identity() {
        let timers = sample();
        assert_eq!(filter_timers_by_category(&timers, "All"), timers);
    }

    #[test]
    fn filter_by_category_keeps_matches_only() {
        let timers = sample();
        let filtered = filter_timers_by_category(&timers, "B");
        assert_eq!(filtered, vec![timers[1].clone()]);
        assert!(filter_timers_by_category(&timers, "C").is_empty());
    }

    #[test]
    fn categories_are_distinct() {
        assert_eq!(available_categories(&sample()), vec!["A", "B"]);
        assert!(available_categories(&[]).is_empty());
    }
}
