//! Environment Precomputation Tests
//!
//! CPU-side tests for the capture math:
//! - The six face bases use the specified forward/up pairs and are
//!   orthonormal
//! - Each face matrix projects its forward direction to the NDC center
//! - Prefilter mip geometry covers roughness 0..1 over halving resolutions

use glam::{Vec3, Vec4};

use ember::renderer::environment::{
    BRDF_LUT_SIZE, ENV_CUBE_SIZE, IRRADIANCE_SIZE, PREFILTER_MIP_LEVELS, PREFILTER_SIZE,
    capture_face_bases, capture_face_matrices,
};

const EPSILON: f32 = 1e-4;

#[test]
fn bake_resolutions_match_the_pipeline_contract() {
    assert_eq!(ENV_CUBE_SIZE, 2048);
    assert_eq!(IRRADIANCE_SIZE, 32);
    assert_eq!(PREFILTER_SIZE, 512);
    assert_eq!(PREFILTER_MIP_LEVELS, 5);
    assert_eq!(BRDF_LUT_SIZE, 512);
}

#[test]
fn face_bases_cover_the_six_axes() {
    let forwards: Vec<Vec3> = capture_face_bases().iter().map(|(f, _)| *f).collect();
    assert_eq!(
        forwards,
        vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z
        ]
    );
}

#[test]
fn face_ups_follow_the_capture_convention() {
    let bases = capture_face_bases();
    // ±X and ±Z faces look with up (0,-1,0); ±Y faces use (0,0,±1).
    assert_eq!(bases[0].1, Vec3::NEG_Y);
    assert_eq!(bases[1].1, Vec3::NEG_Y);
    assert_eq!(bases[2].1, Vec3::Z);
    assert_eq!(bases[3].1, Vec3::NEG_Z);
    assert_eq!(bases[4].1, Vec3::NEG_Y);
    assert_eq!(bases[5].1, Vec3::NEG_Y);
}

#[test]
fn face_bases_are_orthonormal() {
    for (i, (forward, up)) in capture_face_bases().iter().enumerate() {
        assert!(
            (forward.length() - 1.0).abs() < EPSILON,
            "face {i} forward not unit"
        );
        assert!((up.length() - 1.0).abs() < EPSILON, "face {i} up not unit");
        assert!(
            forward.dot(*up).abs() < EPSILON,
            "face {i} forward/up not perpendicular"
        );
    }
}

#[test]
fn face_matrices_project_forward_to_ndc_center() {
    let bases = capture_face_bases();
    for (i, matrix) in capture_face_matrices().iter().enumerate() {
        let forward = bases[i].0;
        let clip = *matrix * Vec4::new(forward.x, forward.y, forward.z, 1.0);
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        assert!(
            ndc_x.abs() < EPSILON && ndc_y.abs() < EPSILON,
            "face {i}: forward should hit NDC center, got ({ndc_x}, {ndc_y})"
        );
    }
}

#[test]
fn face_matrices_put_the_face_edge_at_the_frustum_edge() {
    // With a 90° FOV, a direction rotated 45° off the forward axis lands on
    // the edge of the face.
    let matrices = capture_face_matrices();
    let (forward, up) = capture_face_bases()[0];
    let edge_dir = (forward + up).normalize();

    let clip = matrices[0] * Vec4::new(edge_dir.x, edge_dir.y, edge_dir.z, 1.0);
    let ndc_y = clip.y / clip.w;
    assert!(
        (ndc_y.abs() - 1.0).abs() < 1e-3,
        "45° off-axis should project to |ndc_y| = 1, got {ndc_y}"
    );
}

#[test]
fn face_matrices_are_invertible() {
    for (i, matrix) in capture_face_matrices().iter().enumerate() {
        assert!(
            matrix.determinant().abs() > 1e-10,
            "face matrix {i} is singular"
        );
    }
}

#[test]
fn prefilter_mips_map_roughness_linearly_over_halving_sizes() {
    for mip in 0..PREFILTER_MIP_LEVELS {
        let size = (PREFILTER_SIZE >> mip).max(1);
        assert!(size >= 1);
        let roughness = mip as f32 / (PREFILTER_MIP_LEVELS - 1) as f32;
        assert!((0.0..=1.0).contains(&roughness));
        if mip == 0 {
            assert_eq!(roughness, 0.0);
        }
        if mip == PREFILTER_MIP_LEVELS - 1 {
            assert_eq!(roughness, 1.0);
        }
    }
    assert_eq!(PREFILTER_SIZE >> (PREFILTER_MIP_LEVELS - 1), 32);
}
