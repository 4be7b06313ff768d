//! Bloom Mip Chain Tests
//!
//! Tests for:
//! - Floor-halving chain geometry
//! - Strictly decreasing dimensions with a minimum of one level
//! - Level-count clamping against the base size
//! - Settings clamping

use ember::BloomSettings;
use ember::resources::bloom::mip_chain_sizes;

#[test]
fn chain_halves_with_floor_at_every_level() {
    let sizes = mip_chain_sizes(1280, 720, 6);
    assert_eq!(sizes.len(), 6);
    for i in 1..sizes.len() {
        assert_eq!(sizes[i].0, sizes[i - 1].0 / 2, "width at level {i}");
        assert_eq!(sizes[i].1, sizes[i - 1].1 / 2, "height at level {i}");
    }
}

#[test]
fn chain_starts_at_base_size() {
    let sizes = mip_chain_sizes(640, 360, 5);
    assert_eq!(sizes[0], (640, 360));
}

#[test]
fn chain_dimensions_strictly_decrease() {
    let sizes = mip_chain_sizes(1023, 511, 8);
    for i in 1..sizes.len() {
        assert!(sizes[i].0 < sizes[i - 1].0);
        assert!(sizes[i].1 < sizes[i - 1].1);
    }
}

#[test]
fn chain_has_at_least_one_level() {
    assert_eq!(mip_chain_sizes(1, 1, 6).len(), 1);
    assert_eq!(mip_chain_sizes(7, 3, 0).len(), 1);
}

#[test]
fn chain_stops_before_a_dimension_vanishes() {
    let sizes = mip_chain_sizes(64, 4, 16);
    let last = sizes.last().unwrap();
    assert!(last.0 >= 1 && last.1 >= 1);
    // 4 -> 2 -> 1; the next halving would reach zero, so the chain stops.
    assert_eq!(sizes.len(), 3);
    assert_eq!(*last, (16, 1));
}

#[test]
fn odd_sizes_floor_like_integer_division() {
    let sizes = mip_chain_sizes(9, 9, 3);
    assert_eq!(sizes, vec![(9, 9), (4, 4), (2, 2)]);
}

#[test]
fn requested_level_count_is_honored_when_possible() {
    for levels in 1..=6 {
        let sizes = mip_chain_sizes(2048, 2048, levels);
        assert_eq!(sizes.len(), levels as usize);
    }
}

#[test]
fn settings_clamp_to_sane_ranges() {
    let mut settings = BloomSettings::new();

    settings.set_threshold(-5.0);
    assert_eq!(settings.threshold(), 0.0);

    settings.set_soft_knee(2.0);
    assert_eq!(settings.soft_knee(), 1.0);

    settings.set_strength(-1.0);
    assert_eq!(settings.strength(), 0.0);

    settings.set_max_mip_levels(0);
    assert_eq!(settings.max_mip_levels(), 1);
    settings.set_max_mip_levels(99);
    assert_eq!(settings.max_mip_levels(), 16);
}

#[test]
fn settings_default_disabled() {
    let settings = BloomSettings::new();
    assert!(!settings.enabled);
}
