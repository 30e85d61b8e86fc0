//! Basic smoke test to verify the public API surface.

#[test]
fn crate_compiles() {
    let _ = std::any::type_name::<keywarden::KeywardenConfig>();
    let _ = std::any::type_name::<keywarden::KeywardenError>();
    let _ = std::any::type_name::<keywarden::KeyManager>();
}

#[test]
fn default_config_validates() {
    assert!(keywarden::KeywardenConfig::default().validate().is_ok());
}
