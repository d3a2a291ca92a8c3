//! Planning module for safe partial applies.
//!
//! This module parses the provisioning tool's change plan and dependency
//! graph, and decides which pending changes can be applied in one pass.
//!
//! The flow is: plan text → [`ChangeSet`], graph text → [`DependencyGraph`],
//! then [`ChangePlanBuilder`] and [`GraphFilter`] produce the final [`Plan`].

mod builder;
mod changes;
mod filter;
mod graph;
mod groups;
mod plan;

pub use builder::ChangePlanBuilder;
pub use changes::{parse_line, parse_plan_output, strip_ansi, ChangeKind, ChangeSet};
pub use filter::GraphFilter;
pub use graph::{parse_line as parse_graph_line, DependencyGraph, GraphLine, ROOT};
pub use groups::TargetGroupIndex;
pub use plan::{Plan, PlanAction, PlanItem, PlanReason};

use tracing::info;

/// Runs a complete planning pass for one deployment.
#[derive(Debug)]
pub struct Planner<'a> {
    builder: ChangePlanBuilder<'a>,
}

impl<'a> Planner<'a> {
    /// Creates a planner for the given groups and declared resources.
    #[must_use]
    pub fn new(groups: &'a TargetGroupIndex, resources: &'a [String]) -> Self {
        Self {
            builder: ChangePlanBuilder::new(groups, resources),
        }
    }

    /// Parses `plan_output`, builds the plan and, when a graph is given,
    /// defers dependents of deferred items.
    #[must_use]
    pub fn plan(&self, plan_output: &str, graph: Option<&DependencyGraph>) -> Plan {
        let changes = parse_plan_output(plan_output);
        self.plan_changes(&changes, graph)
    }

    /// Same as [`Planner::plan`] for an already parsed change set.
    #[must_use]
    pub fn plan_changes(&self, changes: &ChangeSet, graph: Option<&DependencyGraph>) -> Plan {
        let mut plan = self.builder.build(changes);

        if let Some(graph) = graph {
            let deferred = GraphFilter::new(graph).apply(&mut plan);
            if deferred > 0 {
                info!("Deferred {deferred} dependent resources");
            }
        }

        info!(
            "Planned {} resources, {} to apply",
            plan.len(),
            plan.resources_to_apply().len()
        );
        plan
    }
}
