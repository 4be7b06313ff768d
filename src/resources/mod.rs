//! CPU-side resource data
//!
//! Pure data structures shared between the scene layer and the renderer:
//! decoded images, meshes, materials, and the post-processing settings
//! structs. Nothing in this module touches the GPU; the renderer uploads
//! these on demand.

pub mod bloom;
pub mod image;
pub mod material;
pub mod mesh;
pub mod ssao;
pub mod tone_mapping;

pub use bloom::{BloomSettings, mip_chain_sizes};
pub use image::{HdrImage, ImageData};
pub use material::{MapFlags, Material};
pub use mesh::{Mesh, Vertex};
pub use ssao::{SsaoSettings, generate_ssao_kernel, generate_ssao_noise};
pub use tone_mapping::ToneMappingSettings;
