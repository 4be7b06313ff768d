//! Render graph executor
//!
//! Nodes execute in insertion order, the fixed per-frame sequence
//! `Shadow → Geometry → [SSAO] → [Bloom] → Composite`. A single command
//! encoder spans the whole graph and is submitted once per frame.

use crate::renderer::graph::context::{ExecuteContext, PrepareContext};
use crate::renderer::graph::node::{GraphResource, RenderNode};
use crate::scene::Scene;

/// Ordered list of render nodes with dependency validation.
pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a node. Nodes execute in insertion order.
    pub fn add_node(&mut self, node: Box<dyn RenderNode>) {
        self.nodes.push(node);
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Names of the enabled passes, in execution order.
    #[must_use]
    pub fn enabled_pass_names(&self, scene: &Scene) -> Vec<&'static str> {
        self.nodes
            .iter()
            .filter(|node| node.enabled(scene))
            .map(|node| node.descriptor().name)
            .collect()
    }

    /// Checks that every enabled pass's required inputs are produced by an
    /// earlier enabled pass. Optional inputs may be absent; the consumer
    /// substitutes a neutral fallback.
    pub fn validate(&self, scene: &Scene) -> Result<(), String> {
        let mut produced: Vec<GraphResource> = Vec::new();
        for node in &self.nodes {
            if !node.enabled(scene) {
                continue;
            }
            let desc = node.descriptor();
            for input in desc.inputs {
                if !produced.contains(input) {
                    return Err(format!(
                        "pass '{}' requires {input:?}, which no earlier enabled pass produces",
                        desc.name
                    ));
                }
            }
            produced.extend_from_slice(desc.outputs);
        }
        Ok(())
    }

    /// Runs the prepare phase for every enabled node.
    pub fn prepare(&mut self, ctx: &mut PrepareContext) {
        for node in &mut self.nodes {
            if node.enabled(ctx.scene) {
                node.prepare(ctx);
            }
        }
    }

    /// Records every enabled node into one command encoder and submits it.
    pub fn execute(&self, ctx: &ExecuteContext) {
        let mut encoder = ctx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Graph Encoder"),
            });

        for node in &self.nodes {
            if !node.enabled(ctx.scene) {
                continue;
            }
            encoder.push_debug_group(node.descriptor().name);
            node.run(ctx, &mut encoder);
            encoder.pop_debug_group();
        }

        ctx.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
