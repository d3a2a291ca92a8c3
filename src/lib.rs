// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports
#![warn(unused_variables)]            // Unused variables
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # safe-apply
//!
//! Decides which pending infrastructure changes can be applied together
//! without taking down every member of a redundant group at once.
//!
//! ## Overview
//!
//! Given the output of an infrastructure plan, the dependency graph export
//! and a deployment declaration, safe-apply:
//!
//! - Parses new, changed and relaunched resources from the plan output
//! - Picks at most one relaunch per target group
//! - Defers every resource on the dependency path of a deferred resource
//! - Emits the `-target` flags for the next partial apply
//!
//! Running the tool again after each apply walks through a rolling
//! relaunch, one group member at a time.
//!
//! ## Modules
//!
//! - [`config`]: Deployment declaration parsing and validation
//! - [`planner`]: Plan output parsing, dependency graph and plan building
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! deployment:
//!   name: prod
//!
//! resources:
//!   - type: aws_instance
//!     name: master-0
//!     group: masters
//!   - type: aws_instance
//!     name: master-1
//!     group: masters
//!   - address: aws_eip.master-0
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod planner;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, DeploymentConfig};
pub use error::{Result, SafeApplyError};
pub use planner::{
    ChangePlanBuilder, ChangeSet, DependencyGraph, GraphFilter, Plan, PlanAction, PlanItem,
    PlanReason, Planner, TargetGroupIndex,
};
