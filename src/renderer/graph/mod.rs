//! Render graph
//!
//! The per-frame pipeline is an explicit ordered list of pass descriptors:
//! each [`RenderNode`] declares its inputs, outputs and an enable predicate,
//! and [`RenderGraph`] iterates them in order, validating that every
//! required input was produced by an earlier enabled pass. Pass data flows
//! strictly forward; skipped passes leave neutral fallback resources in
//! place so later stages never see a missing binding.

pub mod context;
pub mod graph;
pub mod node;
pub mod passes;

pub use context::{ExecuteContext, FrameResources, ObjectBuffer, PrepareContext};
pub use graph::RenderGraph;
pub use node::{GraphResource, PassDescriptor, RenderNode};
