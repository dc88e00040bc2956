//! Gradient-descent optimizer.
//!
//! [`run_gradient_descent`] minimises any [`Objective`] with one of the
//! [`UpdateRule`](crate::config::UpdateRule)s; [`run_one_vs_rest`] fans a
//! multiclass problem out into independent binary runs.
pub mod gradient_descent;
pub mod objective;
pub mod one_vs_rest;
pub mod update_rules;

pub use gradient_descent::{run_gradient_descent, GradientDescentOutcome, Termination};
pub use objective::{LossKind, Objective};
pub use one_vs_rest::{binary_targets, run_one_vs_rest, OneVsRestOutcome};
pub use update_rules::OptimizerState;
