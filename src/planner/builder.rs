//! Change plan construction.
//!
//! Turns a parsed [`ChangeSet`] into a [`Plan`], allowing at most one
//! destructive relaunch per target group and deferring the rest.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::changes::ChangeSet;
use super::groups::TargetGroupIndex;
use super::plan::{Plan, PlanAction, PlanItem, PlanReason};

/// Builds change plans for one deployment.
#[derive(Debug)]
pub struct ChangePlanBuilder<'a> {
    /// Target group declarations.
    groups: &'a TargetGroupIndex,
    /// Every resource address the deployment declares.
    known: HashSet<&'a str>,
}

impl<'a> ChangePlanBuilder<'a> {
    /// Creates a builder for the given groups and declared resources.
    #[must_use]
    pub fn new(groups: &'a TargetGroupIndex, resources: &'a [String]) -> Self {
        Self {
            groups,
            known: resources.iter().map(String::as_str).collect(),
        }
    }

    /// Builds the plan.
    ///
    /// Every address in `changes` ends up in exactly one item. When an
    /// address shows up in several categories, relaunch wins over new and
    /// new wins over changed.
    #[must_use]
    pub fn build(&self, changes: &ChangeSet) -> Plan {
        let mut plan = Plan::new();

        for address in &changes.new {
            if changes.relaunch.contains(address) {
                warn!("{address} is reported as both new and destructive, treating as relaunch");
                continue;
            }
            plan.push(self.item(address, PlanAction::Create, PlanReason::NewResource));
        }

        for address in &changes.changed {
            if changes.relaunch.contains(address) || changes.new.contains(address) {
                warn!("{address} is reported in more than one category, skipping in-place change");
                continue;
            }
            plan.push(self.item(
                address,
                PlanAction::Change,
                PlanReason::NonDestructiveChange,
            ));
        }

        let buckets = self.relaunch_buckets(changes, &mut plan);
        Self::select_from_buckets(&buckets, &mut plan);

        debug!("Built change plan with {} items", plan.len());
        plan
    }

    /// Emits ungrouped and removed resources directly and buckets the rest
    /// by target group.
    fn relaunch_buckets<'c>(
        &self,
        changes: &'c ChangeSet,
        plan: &mut Plan,
    ) -> IndexMap<&'a str, Vec<&'c str>> {
        let mut buckets: IndexMap<&'a str, Vec<&'c str>> = IndexMap::new();

        for address in &changes.relaunch {
            if let Some(group) = self.group_of(address) {
                buckets.entry(group).or_default().push(address);
            } else if self.known.contains(address.as_str()) {
                plan.push(PlanItem::new(
                    address.as_str(),
                    None,
                    PlanAction::Relaunch,
                    PlanReason::NoTargetGroup,
                ));
            } else {
                debug!("{address} is no longer declared, planning destroy");
                plan.push(PlanItem::new(
                    address.as_str(),
                    None,
                    PlanAction::Destroy,
                    PlanReason::DefinitionRemoved,
                ));
            }
        }

        buckets
    }

    /// Relaunches one member per group and defers the others.
    ///
    /// Within a group the lexicographically smallest address is picked.
    fn select_from_buckets(buckets: &IndexMap<&str, Vec<&str>>, plan: &mut Plan) {
        for (group, members) in buckets.iter().filter(|(_, m)| m.len() == 1) {
            plan.push(PlanItem::new(
                members[0],
                Some((*group).to_string()),
                PlanAction::Relaunch,
                PlanReason::OnlyMemberInGroup,
            ));
        }

        for (group, members) in buckets.iter().filter(|(_, m)| m.len() > 1) {
            let mut members = members.clone();
            members.sort_unstable();
            let total = members.len();

            info!(
                "Target group {group} has {total} pending relaunches, picking {}",
                members[0]
            );
            plan.push(PlanItem::new(
                members[0],
                Some((*group).to_string()),
                PlanAction::Relaunch,
                PlanReason::PickedFirst { total },
            ));

            for address in &members[1..] {
                plan.push(PlanItem::new(
                    *address,
                    Some((*group).to_string()),
                    PlanAction::NotPicked,
                    PlanReason::NotSelectedFromGroup,
                ));
            }
        }
    }

    /// Group membership counts only for resources the deployment declares.
    fn group_of(&self, address: &str) -> Option<&'a str> {
        let groups: &'a TargetGroupIndex = self.groups;
        if self.known.contains(address) {
            groups.group_of(address)
        } else {
            None
        }
    }

    fn item(&self, address: &str, action: PlanAction, reason: PlanReason) -> PlanItem {
        let group = self.group_of(address).map(String::from);
        PlanItem::new(address, group, action, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::changes::parse_plan_output;

    fn groups() -> TargetGroupIndex {
        TargetGroupIndex::from_groups(vec![
            (
                String::from("group-1"),
                vec!["type.main_name1", "type.main_name2"],
            ),
            (String::from("group-2"), vec!["type.main_name3"]),
        ])
    }

    fn resources(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("type.main_{n}")).collect()
    }

    fn expect_item(plan: &Plan, address: &str, group: Option<&str>, action: PlanAction, reason: &PlanReason) {
        let item = plan.get(address).unwrap_or_else(|| panic!("{address} missing from plan"));
        assert_eq!(item.target_group(), group, "{address}");
        assert_eq!(item.action(), action, "{address}");
        assert_eq!(item.reason(), reason, "{address}");
    }

    #[test]
    fn test_picks_one_relaunch_per_group() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3"]);
        let changes = parse_plan_output(
            "
-/+ type.main_name1
-/+ type.main_name2
-/+ type.main_name3
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 3);
        expect_item(
            &plan,
            "type.main_name1",
            Some("group-1"),
            PlanAction::Relaunch,
            &PlanReason::PickedFirst { total: 2 },
        );
        expect_item(
            &plan,
            "type.main_name2",
            Some("group-1"),
            PlanAction::NotPicked,
            &PlanReason::NotSelectedFromGroup,
        );
        expect_item(
            &plan,
            "type.main_name3",
            Some("group-2"),
            PlanAction::Relaunch,
            &PlanReason::OnlyMemberInGroup,
        );
    }

    #[test]
    fn test_three_member_group_relaunches_one() {
        let groups = TargetGroupIndex::from_groups(vec![(
            String::from("pool"),
            vec!["type.main_name3", "type.main_name1", "type.main_name2"],
        )]);
        let resources = resources(&["name1", "name2", "name3"]);
        let changes = parse_plan_output(
            "
-/+ type.main_name2
-/+ type.main_name3
-/+ type.main_name1
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.count(PlanAction::Relaunch), 1);
        assert_eq!(plan.count(PlanAction::NotPicked), 2);
        expect_item(
            &plan,
            "type.main_name1",
            Some("pool"),
            PlanAction::Relaunch,
            &PlanReason::PickedFirst { total: 3 },
        );
        for address in ["type.main_name2", "type.main_name3"] {
            expect_item(
                &plan,
                address,
                Some("pool"),
                PlanAction::NotPicked,
                &PlanReason::NotSelectedFromGroup,
            );
        }
        assert_eq!(
            plan.get("type.main_name1").unwrap().reason().to_string(),
            "group has total 3 resources. Picked this as the first"
        );
    }

    #[test]
    fn test_pick_is_lexicographic() {
        let groups = groups();
        let resources = resources(&["name1", "name2"]);
        let changes = parse_plan_output("-/+ type.main_name2\n-/+ type.main_name1\n");

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(
            plan.get("type.main_name1").map(PlanItem::action),
            Some(PlanAction::Relaunch)
        );
        assert_eq!(
            plan.get("type.main_name2").map(PlanItem::action),
            Some(PlanAction::NotPicked)
        );
    }

    #[test]
    fn test_changes_are_not_limited_by_group() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3"]);
        let changes = parse_plan_output(
            "
~ type.main_name1
~ type.main_name2
~ type.main_name3
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.count(PlanAction::Change), 3);
        expect_item(
            &plan,
            "type.main_name2",
            Some("group-1"),
            PlanAction::Change,
            &PlanReason::NonDestructiveChange,
        );
        assert!(!plan.has_unpicked_resources());
    }

    #[test]
    fn test_ungrouped_relaunch() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3", "name4"]);
        let changes = parse_plan_output(
            "
-/+ type.main_name1
-/+ type.main_name2
-/+ type.main_name3
-/+ type.main_name4
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 4);
        expect_item(
            &plan,
            "type.main_name4",
            None,
            PlanAction::Relaunch,
            &PlanReason::NoTargetGroup,
        );
    }

    #[test]
    fn test_single_ungrouped_relaunch() {
        let groups = TargetGroupIndex::new();
        let resources = resources(&["name4"]);
        let changes = parse_plan_output("-/+ type.main_name4\n");

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 1);
        expect_item(
            &plan,
            "type.main_name4",
            None,
            PlanAction::Relaunch,
            &PlanReason::NoTargetGroup,
        );
    }

    #[test]
    fn test_removed_definition_is_destroyed() {
        let groups = groups();
        let resources = resources(&["name4"]);
        let changes = parse_plan_output("- type.main_name3\n");

        // name3 is still listed in group-2 but the deployment no longer declares it
        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 1);
        expect_item(
            &plan,
            "type.main_name3",
            None,
            PlanAction::Destroy,
            &PlanReason::DefinitionRemoved,
        );
    }

    #[test]
    fn test_new_resources() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3", "name4"]);
        let changes = parse_plan_output(
            "
+ type.main_name1
+ type.main_name2
+ type.main_name3
+ type.main_name4
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 4);
        expect_item(&plan, "type.main_name1", Some("group-1"), PlanAction::Create, &PlanReason::NewResource);
        expect_item(&plan, "type.main_name2", Some("group-1"), PlanAction::Create, &PlanReason::NewResource);
        expect_item(&plan, "type.main_name3", Some("group-2"), PlanAction::Create, &PlanReason::NewResource);
        expect_item(&plan, "type.main_name4", None, PlanAction::Create, &PlanReason::NewResource);
    }

    #[test]
    fn test_empty_plan() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3", "name4"]);
        let plan = ChangePlanBuilder::new(&groups, &resources).build(&parse_plan_output("\n"));
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn test_address_in_several_categories_yields_one_item() {
        let groups = TargetGroupIndex::new();
        let resources = resources(&["a"]);
        let changes = parse_plan_output("+ type.main_a\n~ type.main_a\n-/+ type.main_a\n");

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items()[0].action(), PlanAction::Relaunch);
    }

    #[test]
    fn test_mixed_plan_targets() {
        let groups = groups();
        let resources = resources(&["name1", "name2", "name3", "name4", "name5"]);
        let changes = parse_plan_output(
            "
-/+ type.main_name1
- type.main_name2
+ type.main_name3
+ type.main_name4
",
        );

        let plan = ChangePlanBuilder::new(&groups, &resources).build(&changes);
        let targets = plan.resources_to_apply();

        assert!(targets.contains(&"type.main_name1"));
        assert!(!targets.contains(&"type.main_name2"));
        assert!(targets.contains(&"type.main_name3"));
        assert!(targets.contains(&"type.main_name4"));
        assert!(!targets.contains(&"type.main_name5"));
    }
}
