//! Marketplace visibility rule for task listings.

use super::{Actor, Task};

/// Returns `true` when `viewer` may see `task` in a listing.
///
/// Drivers see the tasks assigned to them plus the unassigned pending tasks
/// of their own company. Administrators see everything handed to them; their
/// company scope is applied by the listing query before this rule runs.
///
/// Every task a driver may accept satisfies this rule.
#[must_use]
pub fn is_visible_to(viewer: &Actor, task: &Task) -> bool {
    if !viewer.is_driver() {
        return true;
    }
    task.assigned_to() == Some(viewer.id())
        || (task.is_in_marketplace() && viewer.belongs_to(task.company_id()))
}

/// Keeps only the tasks visible to `viewer`, preserving order.
#[must_use]
pub fn filter_visible(viewer: &Actor, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| is_visible_to(viewer, task))
        .collect()
}
