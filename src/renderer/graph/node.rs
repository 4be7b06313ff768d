//! Render node trait and pass descriptors

use crate::renderer::graph::context::{ExecuteContext, PrepareContext};
use crate::scene::Scene;

/// Logical identifier for the GPU resources passed between graph stages.
///
/// Passes declare data flow in these terms instead of hard-coding texture
/// fields, which makes the dependency chain a checkable data structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphResource {
    /// Depth-only shadow map, light's point of view.
    ShadowMap,
    /// Lit HDR scene color (G-buffer attachment 0).
    SceneColor,
    /// View-space normals (G-buffer attachment 1).
    SceneNormal,
    /// View-space positions (G-buffer attachment 2).
    ScenePosition,
    /// Scene depth buffer.
    SceneDepth,
    /// Raw (noisy) ambient occlusion.
    SsaoRaw,
    /// Blurred ambient occlusion.
    SsaoBlurred,
    /// Bloom mip chain; level 0 holds the composited contribution.
    BloomPyramid,
    /// Final presentable image.
    FinalColor,
}

/// Static description of one pass: name, data dependencies, products.
#[derive(Debug, Clone, Copy)]
pub struct PassDescriptor {
    pub name: &'static str,
    /// Resources that must be produced by an earlier enabled pass.
    pub inputs: &'static [GraphResource],
    /// Resources consumed when available; a neutral fallback substitutes
    /// when the producing pass is disabled.
    pub optional_inputs: &'static [GraphResource],
    /// Resources this pass produces.
    pub outputs: &'static [GraphResource],
}

/// A pass in the render graph.
///
/// `prepare` runs first for every enabled node (uniform uploads, bind-group
/// builds); `run` then records GPU commands into the frame's shared command
/// encoder. All mutation happens in `prepare`; `run` is read-only.
pub trait RenderNode {
    /// The pass descriptor; must be stable across frames.
    fn descriptor(&self) -> PassDescriptor;

    /// Whether the pass runs this frame. Disabled passes are skipped
    /// entirely; their outputs fall back to neutral dummies.
    fn enabled(&self, _scene: &Scene) -> bool {
        true
    }

    /// Resource allocation, uniform upload and bind-group construction.
    fn prepare(&mut self, _ctx: &mut PrepareContext) {}

    /// Records GPU commands for this pass.
    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder);
}
