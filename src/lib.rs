#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{EmberError, Result};
pub use renderer::Renderer;
pub use renderer::context::GpuContext;
pub use resources::{BloomSettings, Material, Mesh, SsaoSettings, ToneMappingSettings};
pub use scene::{Camera, DirectionalLight, Entity, EntityKey, OrbitCamera, Scene};
