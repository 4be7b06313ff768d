//! Render passes
//!
//! Fixed per-frame sequence: shadow depth, geometry/lighting MRT, SSAO
//! (raw + blur), bloom (bright + mip chain), final composite. Each pass
//! owns its pipelines, uniform buffers and bind groups; shared targets and
//! samplers come from [`FrameResources`](super::FrameResources) through the
//! pass contexts.

pub mod bloom;
pub mod composite;
pub mod geometry;
pub mod shadow;
pub mod ssao;

pub use bloom::BloomPass;
pub use composite::{CompositePass, CompositeUniforms};
pub use geometry::GeometryPass;
pub use shadow::ShadowPass;
pub use ssao::SsaoPass;
