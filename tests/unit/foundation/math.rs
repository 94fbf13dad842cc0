use super::*;

#[test]
fn db_gain_conversions() {
    assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
    assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-6);
    assert!((gain_to_db(0.5) + 6.0206).abs() < 1e-3);
    assert!(gain_to_db(0.0).is_infinite());
}

#[test]
fn lerp_u8_endpoints() {
    assert_eq!(lerp_u8(10, 200, 0), 10);
    assert_eq!(lerp_u8(10, 200, 255), 200);
    let mid = lerp_u8(0, 254, 128);
    assert!((126..=128).contains(&mid));
}

#[test]
fn derive_seed_is_stable_and_label_sensitive() {
    assert_eq!(derive_seed(7, "line:0"), derive_seed(7, "line:0"));
    assert_ne!(derive_seed(7, "line:0"), derive_seed(7, "line:1"));
    assert_ne!(derive_seed(7, "line:0"), derive_seed(8, "line:0"));
}

#[test]
fn splitmix_spreads_neighbours() {
    assert_ne!(splitmix64(1), splitmix64(2));
    assert_eq!(splitmix64(42), splitmix64(42));
}
