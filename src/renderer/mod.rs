//! Renderer core
//!
//! The [`Renderer`] owns the GPU context, all fixed-resolution frame
//! resources, the pre-warmed static geometry, the texture registry and the
//! render graph. A frame advances through the fixed pass sequence
//! `Shadow → Geometry → [SSAO] → [Bloom] → Composite`; the final composed
//! image is exposed as a texture view for UI display.
//!
//! Targets are created once at [`Renderer::init`]. There is no live
//! resize: a size change is a `shutdown()` followed by a fresh `init()`,
//! which reproduces an equivalent set of targets.

pub mod context;
pub mod environment;
pub mod geometry;
pub mod graph;
pub mod mipmap;
pub mod target;
pub mod texture;
pub mod tracked;

use crate::errors::Result;
use crate::renderer::context::GpuContext;
use crate::renderer::environment::EnvironmentBaker;
use crate::renderer::geometry::StaticGeometry;
use crate::renderer::graph::passes::{
    BloomPass, CompositePass, GeometryPass, ShadowPass, SsaoPass,
};
use crate::renderer::graph::{
    ExecuteContext, FrameResources, ObjectBuffer, PrepareContext, RenderGraph,
};
use crate::renderer::mipmap::MipmapGenerator;
use crate::renderer::texture::TextureRegistry;
use crate::renderer::tracked::Tracked;
use crate::resources::HdrImage;
use crate::scene::{Camera, RenderCamera, Scene};

/// The deferred rendering pipeline.
pub struct Renderer {
    gpu: GpuContext,
    frame: FrameResources,
    statics: StaticGeometry,
    objects: ObjectBuffer,
    textures: TextureRegistry,
    graph: RenderGraph,

    baker: EnvironmentBaker,
    mipgen: MipmapGenerator,

    frame_index: u64,
}

impl Renderer {
    /// Creates the pipeline at a fixed resolution.
    ///
    /// Every render target is validated for completeness here; an
    /// incomplete target aborts initialization and the renderer never
    /// reaches the frame loop.
    pub fn init(gpu: GpuContext, width: u32, height: u32) -> Result<Self> {
        let frame = FrameResources::new(&gpu, width, height)?;
        let statics = StaticGeometry::new(&gpu);
        let objects = ObjectBuffer::new(&gpu);

        let mut graph = RenderGraph::new();
        graph.add_node(Box::new(ShadowPass::new(&gpu, &objects)));
        graph.add_node(Box::new(GeometryPass::new(&gpu, &objects)));
        graph.add_node(Box::new(SsaoPass::new(&gpu, &frame)));
        graph.add_node(Box::new(BloomPass::new(&gpu, &frame)));
        graph.add_node(Box::new(CompositePass::new(&gpu)));

        let baker = EnvironmentBaker::new(&gpu.device);
        let mipgen = MipmapGenerator::new(&gpu.device);

        log::info!(
            "Renderer initialized at {width}x{height} with {} passes",
            graph.node_count()
        );

        Ok(Self {
            gpu,
            frame,
            statics,
            objects,
            textures: TextureRegistry::new(),
            graph,
            baker,
            mipgen,
            frame_index: 0,
        })
    }

    /// Advances exactly one frame: writes per-object uniforms, runs the
    /// prepare phase for every enabled pass, then records and submits the
    /// whole graph on a single command encoder.
    pub fn render(&mut self, scene: &Scene, camera: &dyn Camera) {
        let camera = RenderCamera::capture(camera);
        self.objects.write(&self.gpu, scene, &camera);

        debug_assert!(
            self.graph.validate(scene).is_ok(),
            "render graph dependency validation failed: {:?}",
            self.graph.validate(scene)
        );

        let mut prepare_ctx = PrepareContext {
            gpu: &self.gpu,
            scene,
            camera: &camera,
            frame: &self.frame,
            statics: &self.statics,
            objects: &self.objects,
            textures: &mut self.textures,
        };
        self.graph.prepare(&mut prepare_ctx);

        let execute_ctx = ExecuteContext {
            gpu: &self.gpu,
            scene,
            frame: &self.frame,
            statics: &self.statics,
            objects: &self.objects,
        };
        self.graph.execute(&execute_ctx);

        self.frame_index += 1;
    }

    /// Bakes an environment from a decoded HDR image and installs the
    /// resulting maps into the scene.
    ///
    /// A long, blocking scene-load operation; never called from the frame
    /// loop.
    pub fn set_environment(&mut self, scene: &mut Scene, hdr: &HdrImage) {
        let maps = self
            .baker
            .bake(&self.gpu, &mut self.mipgen, &self.statics, hdr);
        scene.environment.install_maps(maps);
    }

    /// Loads an equirectangular HDR image from disk and bakes it.
    ///
    /// On a decode failure the error is logged and returned, and the
    /// scene's previous environment maps (or not-ready state) are left in
    /// place, and downstream passes keep rendering with their fallback.
    pub fn set_environment_from_path(
        &mut self,
        scene: &mut Scene,
        path: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        let hdr = match HdrImage::open(path.as_ref()) {
            Ok(hdr) => hdr,
            Err(err) => {
                log::error!(
                    "Failed to load environment HDR '{}': {err}",
                    path.as_ref().display()
                );
                return Err(err);
            }
        };
        self.set_environment(scene, &hdr);
        Ok(())
    }

    /// View of the final composed image, suitable for UI display.
    #[must_use]
    pub fn output_view(&self) -> &Tracked<wgpu::TextureView> {
        self.frame.output.color_view(0)
    }

    /// Target resolution fixed at init.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    /// Frames rendered since init.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[must_use]
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    #[must_use]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// Tears the pipeline down, releasing every render target and GPU
    /// resource it owns. A following [`init`](Self::init) with the same
    /// configuration reproduces an equivalent-complete set of targets.
    pub fn shutdown(self) {
        log::info!("Renderer shut down after {} frames", self.frame_index);
    }
}
