//! Render Graph Tests
//!
//! Tests for:
//! - Dependency validation over the ordered pass-descriptor list
//! - Toggle-driven pass skipping without breaking later stages
//! - Composite neutrality when SSAO and bloom are disabled

use ember::Scene;
use ember::renderer::graph::passes::CompositeUniforms;
use ember::renderer::graph::{
    ExecuteContext, GraphResource, PassDescriptor, RenderGraph, RenderNode,
};

/// Descriptor-only node: validation never calls `run`.
struct StubPass {
    descriptor: PassDescriptor,
    ssao_gated: bool,
    bloom_gated: bool,
}

impl StubPass {
    fn always(descriptor: PassDescriptor) -> Box<Self> {
        Box::new(Self {
            descriptor,
            ssao_gated: false,
            bloom_gated: false,
        })
    }

    fn ssao(descriptor: PassDescriptor) -> Box<Self> {
        Box::new(Self {
            descriptor,
            ssao_gated: true,
            bloom_gated: false,
        })
    }

    fn bloom(descriptor: PassDescriptor) -> Box<Self> {
        Box::new(Self {
            descriptor,
            ssao_gated: false,
            bloom_gated: true,
        })
    }
}

impl RenderNode for StubPass {
    fn descriptor(&self) -> PassDescriptor {
        self.descriptor
    }

    fn enabled(&self, scene: &Scene) -> bool {
        if self.ssao_gated {
            return scene.ssao.enabled;
        }
        if self.bloom_gated {
            return scene.bloom.enabled;
        }
        true
    }

    fn run(&self, _ctx: &ExecuteContext, _encoder: &mut wgpu::CommandEncoder) {}
}

const SHADOW: PassDescriptor = PassDescriptor {
    name: "Shadow Pass",
    inputs: &[],
    optional_inputs: &[],
    outputs: &[GraphResource::ShadowMap],
};
const GEOMETRY: PassDescriptor = PassDescriptor {
    name: "Geometry Pass",
    inputs: &[GraphResource::ShadowMap],
    optional_inputs: &[],
    outputs: &[
        GraphResource::SceneColor,
        GraphResource::SceneNormal,
        GraphResource::ScenePosition,
        GraphResource::SceneDepth,
    ],
};
const SSAO: PassDescriptor = PassDescriptor {
    name: "SSAO Pass",
    inputs: &[GraphResource::SceneNormal, GraphResource::ScenePosition],
    optional_inputs: &[],
    outputs: &[GraphResource::SsaoRaw, GraphResource::SsaoBlurred],
};
const BLOOM: PassDescriptor = PassDescriptor {
    name: "Bloom Pass",
    inputs: &[GraphResource::SceneColor],
    optional_inputs: &[],
    outputs: &[GraphResource::BloomPyramid],
};
const COMPOSITE: PassDescriptor = PassDescriptor {
    name: "Composite Pass",
    inputs: &[GraphResource::SceneColor],
    optional_inputs: &[GraphResource::SsaoBlurred, GraphResource::BloomPyramid],
    outputs: &[GraphResource::FinalColor],
};

fn full_graph() -> RenderGraph {
    let mut graph = RenderGraph::new();
    graph.add_node(StubPass::always(SHADOW));
    graph.add_node(StubPass::always(GEOMETRY));
    graph.add_node(StubPass::ssao(SSAO));
    graph.add_node(StubPass::bloom(BLOOM));
    graph.add_node(StubPass::always(COMPOSITE));
    graph
}

#[test]
fn full_pipeline_validates() {
    let mut scene = Scene::new();
    scene.ssao.set_enabled(true);
    scene.bloom.set_enabled(true);
    assert!(full_graph().validate(&scene).is_ok());
}

#[test]
fn disabled_branches_keep_the_chain_valid() {
    let graph = full_graph();
    for (ssao, bloom) in [(false, false), (true, false), (false, true)] {
        let mut scene = Scene::new();
        scene.ssao.set_enabled(ssao);
        scene.bloom.set_enabled(bloom);
        assert!(
            graph.validate(&scene).is_ok(),
            "graph must stay valid with ssao={ssao} bloom={bloom}"
        );
    }
}

#[test]
fn skipped_passes_drop_out_of_the_execution_order() {
    let graph = full_graph();
    let scene = Scene::new();
    assert_eq!(
        graph.enabled_pass_names(&scene),
        vec!["Shadow Pass", "Geometry Pass", "Composite Pass"]
    );
}

#[test]
fn missing_producer_is_reported() {
    let mut graph = RenderGraph::new();
    // Geometry requires the shadow map, but no pass produces it.
    graph.add_node(StubPass::always(GEOMETRY));
    let err = graph.validate(&Scene::new()).unwrap_err();
    assert!(err.contains("Geometry Pass"), "error names the pass: {err}");
    assert!(err.contains("ShadowMap"), "error names the resource: {err}");
}

#[test]
fn required_input_from_disabled_pass_is_an_error() {
    let mut graph = RenderGraph::new();
    graph.add_node(StubPass::always(SHADOW));
    graph.add_node(StubPass::always(GEOMETRY));
    // A hypothetical pass that *requires* SSAO output while SSAO is off.
    graph.add_node(StubPass::ssao(SSAO));
    graph.add_node(StubPass::always(PassDescriptor {
        name: "AO Debug View",
        inputs: &[GraphResource::SsaoBlurred],
        optional_inputs: &[],
        outputs: &[GraphResource::FinalColor],
    }));

    let mut scene = Scene::new();
    scene.ssao.set_enabled(true);
    assert!(graph.validate(&scene).is_ok());

    scene.ssao.set_enabled(false);
    assert!(graph.validate(&scene).is_err());
}

#[test]
fn graph_construction_is_deterministic() {
    let scene = Scene::new();
    let first = full_graph();
    let second = full_graph();
    assert_eq!(first.node_count(), second.node_count());
    assert_eq!(
        first.enabled_pass_names(&scene),
        second.enabled_pass_names(&scene)
    );
}

// ============================================================================
// Composite neutrality
// ============================================================================

#[test]
fn composite_flags_are_zero_when_both_branches_are_off() {
    let scene = Scene::new();
    let uniforms = CompositeUniforms::from_scene(&scene);
    assert_eq!(uniforms.flags.x, 0, "use_ssao must be off");
    assert_eq!(uniforms.flags.y, 0, "use_bloom must be off");
}

#[test]
fn composite_flags_track_the_toggles_independently() {
    let mut scene = Scene::new();
    scene.ssao.set_enabled(true);
    let uniforms = CompositeUniforms::from_scene(&scene);
    assert_eq!((uniforms.flags.x, uniforms.flags.y), (1, 0));

    scene.ssao.set_enabled(false);
    scene.bloom.set_enabled(true);
    let uniforms = CompositeUniforms::from_scene(&scene);
    assert_eq!((uniforms.flags.x, uniforms.flags.y), (0, 1));
}

#[test]
fn composite_carries_exposure_and_background() {
    let mut scene = Scene::new();
    scene.tone_mapping.set_exposure(1.5);
    scene.set_background(glam::Vec3::new(0.2, 0.3, 0.4));

    let uniforms = CompositeUniforms::from_scene(&scene);
    assert!((uniforms.params.x - 1.5).abs() < 1e-6);
    assert!((uniforms.background.x - 0.2).abs() < 1e-6);
    assert!((uniforms.background.y - 0.3).abs() < 1e-6);
    assert!((uniforms.background.z - 0.4).abs() < 1e-6);
}
