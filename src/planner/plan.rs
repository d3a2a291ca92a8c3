//! Change plan types and reporting.
//!
//! A [`Plan`] is the ordered list of decisions produced for one planning run.
//! Each [`PlanItem`] carries the resource address, its target group, the
//! chosen [`PlanAction`] and a [`PlanReason`] explaining the choice.

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Action chosen for a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    /// Create a new resource.
    Create,
    /// Change a resource in place.
    Change,
    /// Destroy and recreate a resource.
    Relaunch,
    /// Destroy a resource that is no longer declared.
    Destroy,
    /// Defer a pending change to a later planning cycle.
    NotPicked,
}

/// Why a plan item received its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanReason {
    /// The resource does not exist yet.
    NewResource,
    /// The resource is modified in place.
    NonDestructiveChange,
    /// The resource is relaunched and belongs to no target group.
    NoTargetGroup,
    /// The provisioning tool still tracks a resource the deployment dropped.
    DefinitionRemoved,
    /// The resource is the only pending relaunch in its group.
    OnlyMemberInGroup,
    /// The resource was picked out of several pending relaunches in its group.
    PickedFirst {
        /// Number of pending relaunches in the group.
        total: usize,
    },
    /// Another member of the group was relaunched instead.
    NotSelectedFromGroup,
    /// The resource lies on the dependency path of a deferred resource.
    ///
    /// Holds the remainder of that path, ending at the deferred resource.
    DependentOn(Vec<String>),
}

/// A single decision in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanItem {
    address: String,
    #[serde(serialize_with = "serialize_group")]
    target_group: Option<String>,
    action: PlanAction,
    reason: PlanReason,
}

/// The outcome of a planning run.
#[derive(Debug, Clone)]
pub struct Plan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    items: Vec<PlanItem>,
}

impl PlanAction {
    /// Returns true if resources with this action go into the next apply.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        !matches!(self, Self::NotPicked)
    }

    /// Short marker used in reports, mirroring the provisioning tool.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Change => "~",
            Self::Relaunch => "-/+",
            Self::Destroy => "-",
            Self::NotPicked => "!",
        }
    }
}

impl PlanReason {
    /// Stable machine-readable tag for this reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NewResource => "new_resource",
            Self::NonDestructiveChange => "non_destructive_change",
            Self::NoTargetGroup => "no_target_group",
            Self::DefinitionRemoved => "definition_removed",
            Self::OnlyMemberInGroup => "only_member_in_group",
            Self::PickedFirst { .. } => "picked_first",
            Self::NotSelectedFromGroup => "not_selected_from_group",
            Self::DependentOn(_) => "dependent_on_deferred",
        }
    }
}

impl PlanItem {
    /// Creates a new plan item.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        target_group: Option<String>,
        action: PlanAction,
        reason: PlanReason,
    ) -> Self {
        Self {
            address: address.into(),
            target_group,
            action,
            reason,
        }
    }

    /// Resource address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Target group the resource belongs to, if any.
    #[must_use]
    pub fn target_group(&self) -> Option<&str> {
        self.target_group.as_deref()
    }

    /// Chosen action.
    #[must_use]
    pub const fn action(&self) -> PlanAction {
        self.action
    }

    /// Reason for the chosen action.
    #[must_use]
    pub const fn reason(&self) -> &PlanReason {
        &self.reason
    }

    /// Defers this item. Address and group never change.
    pub(super) fn defer(&mut self, reason: PlanReason) {
        self.action = PlanAction::NotPicked;
        self.reason = reason;
    }
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Creates a plan from already decided items.
    #[must_use]
    pub fn from_items(items: Vec<PlanItem>) -> Self {
        Self {
            created_at: Utc::now(),
            items,
        }
    }

    pub(super) fn push(&mut self, item: PlanItem) {
        self.items.push(item);
    }

    pub(super) fn item_mut(&mut self, index: usize) -> Option<&mut PlanItem> {
        self.items.get_mut(index)
    }

    /// All items in decision order.
    #[must_use]
    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    /// Returns the number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the plan holds no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up the item for a resource address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&PlanItem> {
        self.items.iter().find(|i| i.address == address)
    }

    /// Returns true if any change was deferred to a later run.
    #[must_use]
    pub fn has_unpicked_resources(&self) -> bool {
        self.items.iter().any(|i| i.action == PlanAction::NotPicked)
    }

    /// Resource addresses safe to target in the next apply.
    #[must_use]
    pub fn resources_to_apply(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.action.is_applied())
            .map(PlanItem::address)
            .collect()
    }

    /// `-target=<address>` flags for the next apply invocation.
    #[must_use]
    pub fn target_flags(&self) -> Vec<String> {
        self.resources_to_apply()
            .into_iter()
            .map(|address| format!("-target={address}"))
            .collect()
    }

    /// Returns the number of items with the given action.
    #[must_use]
    pub fn count(&self, action: PlanAction) -> usize {
        self.items.iter().filter(|i| i.action == action).count()
    }

    /// Deferred items.
    #[must_use]
    pub fn deferred_items(&self) -> Vec<&PlanItem> {
        self.items
            .iter()
            .filter(|i| i.action == PlanAction::NotPicked)
            .collect()
    }

    /// Named target groups in order of first appearance.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for group in self.items.iter().filter_map(PlanItem::target_group) {
            if !names.contains(&group) {
                names.push(group);
            }
        }
        names
    }

    /// Items belonging to `group`; `None` selects the ungrouped items.
    #[must_use]
    pub fn items_in_group(&self, group: Option<&str>) -> Vec<&PlanItem> {
        self.items
            .iter()
            .filter(|i| i.target_group() == group)
            .collect()
    }

    /// Writes the grouped, human-readable report.
    ///
    /// Items are listed per target group, then the ungrouped ones. A warning
    /// closes the report when anything was deferred.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn report(&self, out: &mut impl Write) -> io::Result<()> {
        if self.items.is_empty() {
            writeln!(out, "{} No changes in plan.", "✓".green())?;
            return Ok(());
        }

        for group in self.group_names() {
            writeln!(out, "Target group {}:", group.bold())?;
            for item in self.items_in_group(Some(group)) {
                writeln!(out, "  {}", colorize(item))?;
            }
        }

        let ungrouped = self.items_in_group(None);
        if !ungrouped.is_empty() {
            writeln!(out, "Not in any target group:")?;
            for item in ungrouped {
                writeln!(out, "  {}", colorize(item))?;
            }
        }

        writeln!(
            out,
            "\nPlan: {} to create, {} to change, {} to relaunch, {} to destroy, {} deferred",
            self.count(PlanAction::Create).to_string().green(),
            self.count(PlanAction::Change).to_string().yellow(),
            self.count(PlanAction::Relaunch).to_string().red(),
            self.count(PlanAction::Destroy).to_string().red(),
            self.count(PlanAction::NotPicked).to_string().dimmed(),
        )?;

        if self.has_unpicked_resources() {
            writeln!(
                out,
                "\n{} Some changes were deferred. Run the planner again after this apply.",
                "⚠".yellow()
            )?;
        }

        Ok(())
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}

/// Colors a report line by action.
fn colorize(item: &PlanItem) -> String {
    let line = item.to_string();
    match item.action {
        PlanAction::Create => line.green().to_string(),
        PlanAction::Change => line.yellow().to_string(),
        PlanAction::Relaunch | PlanAction::Destroy => line.red().to_string(),
        PlanAction::NotPicked => line.dimmed().to_string(),
    }
}

fn serialize_group<S: Serializer>(group: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(group.as_deref().unwrap_or_default())
}

impl Serialize for PlanReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PlanReason", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Change => "change",
            Self::Relaunch => "relaunch",
            Self::Destroy => "destroy",
            Self::NotPicked => "not picked",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewResource => write!(f, "new resource"),
            Self::NonDestructiveChange => write!(f, "non-destructive change"),
            Self::NoTargetGroup => write!(f, "does not belong to any target group"),
            Self::DefinitionRemoved => write!(f, "resource definition has been removed"),
            Self::OnlyMemberInGroup => write!(f, "only member in its group"),
            Self::PickedFirst { total } => {
                write!(f, "group has total {total} resources. Picked this as the first")
            }
            Self::NotSelectedFromGroup => write!(f, "not selected from this group"),
            Self::DependentOn(path) => {
                write!(f, "not selected as dependent on {}", path.join(" -> "))
            }
        }
    }
}

impl fmt::Display for PlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.action.symbol(),
            self.address,
            self.reason
        )
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "No changes in plan");
        }

        writeln!(f, "Change plan ({} items):", self.items.len())?;
        for (i, item) in self.items.iter().enumerate() {
            writeln!(f, "  {i}. {item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan::from_items(vec![
            PlanItem::new(
                "type.main_name1",
                Some(String::from("group-1")),
                PlanAction::Relaunch,
                PlanReason::PickedFirst { total: 2 },
            ),
            PlanItem::new(
                "type.main_name2",
                Some(String::from("group-1")),
                PlanAction::NotPicked,
                PlanReason::NotSelectedFromGroup,
            ),
            PlanItem::new("type.main_name3", None, PlanAction::Create, PlanReason::NewResource),
            PlanItem::new(
                "type.gone",
                None,
                PlanAction::Destroy,
                PlanReason::DefinitionRemoved,
            ),
        ])
    }

    #[test]
    fn test_resources_to_apply_skips_deferred() {
        let plan = sample_plan();
        assert_eq!(
            plan.resources_to_apply(),
            vec!["type.main_name1", "type.main_name3", "type.gone"]
        );
        assert!(plan.has_unpicked_resources());
    }

    #[test]
    fn test_target_flags() {
        let plan = sample_plan();
        assert_eq!(
            plan.target_flags(),
            vec![
                "-target=type.main_name1",
                "-target=type.main_name3",
                "-target=type.gone"
            ]
        );
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            PlanReason::PickedFirst { total: 3 }.to_string(),
            "group has total 3 resources. Picked this as the first"
        );
        assert_eq!(
            PlanReason::DependentOn(vec![String::from("a"), String::from("b")]).to_string(),
            "not selected as dependent on a -> b"
        );
        assert_eq!(PlanReason::NoTargetGroup.code(), "no_target_group");
    }

    #[test]
    fn test_report_groups_then_ungrouped() {
        let plan = sample_plan();
        let mut out = Vec::new();
        plan.report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let group_pos = text.find("group-1").unwrap();
        let ungrouped_pos = text.find("Not in any target group:").unwrap();
        assert!(group_pos < ungrouped_pos);
        assert!(text.contains("type.main_name2"));
        assert!(text.contains("Some changes were deferred"));
    }

    #[test]
    fn test_report_without_deferred_items_has_no_warning() {
        let plan = Plan::from_items(vec![PlanItem::new(
            "type.a",
            None,
            PlanAction::Change,
            PlanReason::NonDestructiveChange,
        )]);
        let mut out = Vec::new();
        plan.report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("deferred. Run"));
        assert!(!plan.has_unpicked_resources());
    }

    #[test]
    fn test_serialized_item_uses_empty_group() {
        let item = PlanItem::new("type.a", None, PlanAction::NotPicked, PlanReason::NoTargetGroup);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["target_group"], "");
        assert_eq!(json["action"], "not_picked");
        assert_eq!(json["reason"]["code"], "no_target_group");
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::new();
        assert_eq!(plan.len(), 0);
        assert!(plan.is_empty());
        assert!(plan.resources_to_apply().is_empty());
        assert_eq!(plan.to_string(), "No changes in plan");
    }
}
