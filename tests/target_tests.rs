//! Render Target Layout Tests
//!
//! Tests for:
//! - Completeness validation across 1..N color attachments
//! - Draw-buffer list rules (set once, count match, index range, no repeats)
//! - Depth-required validation
//! - Attachment/target size agreement

use smallvec::smallvec;

use ember::renderer::target::{ColorSlot, DepthKind, TargetLayout};

fn hdr_slot(width: u32, height: u32) -> ColorSlot {
    ColorSlot {
        format: wgpu::TextureFormat::Rgba16Float,
        width,
        height,
        external: false,
    }
}

#[test]
fn valid_layouts_for_one_to_four_attachments() {
    for count in 1..=4 {
        let mut layout = TargetLayout::new(256, 128);
        for _ in 0..count {
            layout.colors.push(hdr_slot(256, 128));
        }
        layout.set_draw_buffers();
        assert!(
            layout.validate(false).is_ok(),
            "{count} attachments should validate"
        );
    }
}

#[test]
fn missing_draw_buffers_is_incomplete() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    assert!(
        layout.validate(false).is_err(),
        "rendering without set_draw_buffers() must fail validation"
    );
}

#[test]
fn draw_buffer_count_must_match_attachment_count() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    layout.colors.push(hdr_slot(64, 64));
    layout.draw_buffers = Some(smallvec![0]);
    assert!(layout.validate(false).is_err());
}

#[test]
fn draw_buffer_index_out_of_range_fails() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    layout.draw_buffers = Some(smallvec![3]);
    assert!(layout.validate(false).is_err());
}

#[test]
fn repeated_draw_buffer_index_fails() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    layout.colors.push(hdr_slot(64, 64));
    layout.draw_buffers = Some(smallvec![0, 0]);
    assert!(layout.validate(false).is_err());
}

#[test]
fn no_attachments_is_incomplete() {
    let layout = TargetLayout::new(64, 64);
    assert!(layout.validate(false).is_err());
}

#[test]
fn depth_only_layout_is_complete() {
    let mut layout = TargetLayout::new(2048, 2048);
    layout.depth = Some(DepthKind::Texture {
        width: 2048,
        height: 2048,
    });
    assert!(
        layout.validate(true).is_ok(),
        "a depth-only target (shadow map) should validate"
    );
}

#[test]
fn depth_required_but_missing_fails() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    layout.set_draw_buffers();
    assert!(layout.validate(false).is_ok());
    assert!(
        layout.validate(true).is_err(),
        "depth-required validation must fail without a depth attachment"
    );
}

#[test]
fn depth_buffer_satisfies_requirement() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(64, 64));
    layout.depth = Some(DepthKind::Buffer);
    layout.set_draw_buffers();
    assert!(layout.validate(true).is_ok());
}

#[test]
fn mismatched_color_size_fails() {
    let mut layout = TargetLayout::new(64, 64);
    layout.colors.push(hdr_slot(32, 32));
    layout.set_draw_buffers();
    assert!(layout.validate(false).is_err());
}

#[test]
fn set_draw_buffers_covers_all_slots_in_order() {
    let mut layout = TargetLayout::new(64, 64);
    for _ in 0..3 {
        layout.colors.push(hdr_slot(64, 64));
    }
    layout.set_draw_buffers();
    let draw_buffers = layout.draw_buffers.as_ref().unwrap();
    assert_eq!(draw_buffers.as_slice(), &[0, 1, 2]);
}
