/// Quota allocation: trims grouped suggestions down to a global budget.

use tracing::debug;

use crate::schema::recommendation::SuggestionGroups;

/// Trim `groups` until at most `budget` suggestions remain.
///
/// Input within budget is returned unchanged. Otherwise each pass walks
/// the keys in order, taking one suggestion from each key while the
/// running total is still over budget: the last suggestion of a longer
/// group is popped, a single-suggestion group is dropped entirely. Passes
/// repeat until the budget is met, so earlier keys lose suggestions first
/// and small groups disappear before large ones shrink to nothing.
pub fn allocate(groups: SuggestionGroups, budget: usize) -> SuggestionGroups {
    let mut total = groups.total();
    if total <= budget {
        return groups;
    }

    let mut current = groups;
    let mut pass = 0usize;
    while total > budget {
        pass += 1;
        let mut removed = 0usize;
        let mut next = SuggestionGroups::new();
        for (key, mut suggestions) in current {
            if total - removed > budget {
                removed += 1;
                if suggestions.len() > 1 {
                    suggestions.pop();
                    next.insert(key, suggestions);
                }
            } else {
                next.insert(key, suggestions);
            }
        }
        current = next;
        total = current.total();
        debug!(pass, removed, total, budget, "quota pass");
    }
    current
}
