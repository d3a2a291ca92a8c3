//! Cascading exclusion over the dependency graph.
//!
//! When a resource is deferred, every other planned resource on the
//! dependency path from the root to it is deferred as well, so the next
//! apply never lands half of a coherent change.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use super::graph::DependencyGraph;
use super::plan::{Plan, PlanAction, PlanReason};

/// Second planning pass that defers dependents of deferred items.
#[derive(Debug)]
pub struct GraphFilter<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> GraphFilter<'a> {
    /// Creates a filter over the given graph.
    #[must_use]
    pub const fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Rewrites the plan in place and returns how many items were deferred.
    ///
    /// Items deferred by this pass are processed too, so exclusion is
    /// transitive. A deferred item with no path from the root is skipped.
    pub fn apply(&self, plan: &mut Plan) -> usize {
        let mut queue: VecDeque<usize> = plan
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.action() == PlanAction::NotPicked)
            .map(|(i, _)| i)
            .collect();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut downgraded = 0;

        while let Some(excluded) = queue.pop_front() {
            if !visited.insert(excluded) {
                continue;
            }
            let excluded_address = plan.items()[excluded].address().to_string();

            let path = match self.graph.path_from_root(&excluded_address) {
                Ok(path) => path,
                Err(e) => {
                    warn!("No dependency information for {excluded_address}: {e}");
                    continue;
                }
            };
            debug!("Dependency path of {excluded_address}: {}", path.join(" -> "));

            for (position, node) in path.iter().enumerate() {
                let Some(index) = plan
                    .items()
                    .iter()
                    .position(|item| item.address() == node.as_str())
                else {
                    continue;
                };
                if index == excluded || plan.items()[index].action() == PlanAction::NotPicked {
                    continue;
                }

                let remaining = path[position + 1..].to_vec();
                info!(
                    "Deferring {node} as it depends on deferred {excluded_address}"
                );
                if let Some(item) = plan.item_mut(index) {
                    item.defer(PlanReason::DependentOn(remaining));
                    downgraded += 1;
                    queue.push_back(index);
                }
            }
        }

        downgraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan::PlanItem;

    fn item(address: &str, action: PlanAction, reason: PlanReason) -> PlanItem {
        PlanItem::new(address, Some(String::from("group-1")), action, reason)
    }

    fn masters_plan() -> Plan {
        Plan::from_items(vec![
            item("master-0", PlanAction::Relaunch, PlanReason::PickedFirst { total: 2 }),
            item("eip.master-0", PlanAction::Change, PlanReason::NonDestructiveChange),
            item("master-1", PlanAction::NotPicked, PlanReason::NotSelectedFromGroup),
            item("eip.master-1", PlanAction::Change, PlanReason::NonDestructiveChange),
        ])
    }

    fn masters_graph() -> DependencyGraph {
        DependencyGraph::from_export(
            r#"
            "[root] eip.master-0" -> "[root] master-0"
            "[root] eip.master-1" -> "[root] master-1"
            "[root] root" -> "[root] eip.master-0"
            "[root] root" -> "[root] eip.master-1"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_defers_dependents_of_excluded_items() {
        let graph = masters_graph();
        let mut plan = masters_plan();

        let downgraded = GraphFilter::new(&graph).apply(&mut plan);

        assert_eq!(downgraded, 1);
        assert_eq!(plan.items()[0], masters_plan().items()[0]);
        assert_eq!(plan.items()[1], masters_plan().items()[1]);
        assert_eq!(plan.items()[2], masters_plan().items()[2]);

        let eip = plan.get("eip.master-1").unwrap();
        assert_eq!(eip.action(), PlanAction::NotPicked);
        assert_eq!(eip.target_group(), Some("group-1"));
        assert_eq!(
            eip.reason().to_string(),
            "not selected as dependent on master-1"
        );
    }

    #[test]
    fn test_reason_lists_remaining_path() {
        let graph = DependencyGraph::from_export(
            r#"
            "[root] root" -> "[root] lb"
            "[root] lb" -> "[root] eip"
            "[root] eip" -> "[root] instance"
            "#,
        )
        .unwrap();
        let mut plan = Plan::from_items(vec![
            item("lb", PlanAction::Change, PlanReason::NonDestructiveChange),
            item("instance", PlanAction::NotPicked, PlanReason::NotSelectedFromGroup),
        ]);

        GraphFilter::new(&graph).apply(&mut plan);

        assert_eq!(
            plan.get("lb").unwrap().reason(),
            &PlanReason::DependentOn(vec![String::from("eip"), String::from("instance")])
        );
    }

    #[test]
    fn test_missing_path_is_skipped() {
        let graph = masters_graph();
        let mut plan = masters_plan();
        plan.push(item("detached", PlanAction::NotPicked, PlanReason::NotSelectedFromGroup));

        let downgraded = GraphFilter::new(&graph).apply(&mut plan);

        assert_eq!(downgraded, 1);
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn test_plan_without_deferred_items_is_untouched() {
        let graph = masters_graph();
        let mut plan = Plan::from_items(vec![
            item("master-0", PlanAction::Relaunch, PlanReason::OnlyMemberInGroup),
            item("eip.master-0", PlanAction::Change, PlanReason::NonDestructiveChange),
        ]);
        let before = plan.items().to_vec();

        assert_eq!(GraphFilter::new(&graph).apply(&mut plan), 0);
        assert_eq!(plan.items(), before.as_slice());
        assert!(!plan.has_unpicked_resources());
    }
}
