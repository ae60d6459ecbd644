use std::path::PathBuf;
use std::sync::{Arc, Once};

use radar_core::{load_radar_config_from_env, RadarConfig, CONFIG_PATH_ENV};

static INIT: Once = Once::new();

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture("test_radar_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test radar config at {}",
            config_path.display()
        );

        std::env::set_var(CONFIG_PATH_ENV, &config_path);
    });
}

#[allow(dead_code)]
pub fn test_config() -> Arc<RadarConfig> {
    ensure_test_config();
    let (config, metadata) = load_radar_config_from_env(None);
    assert!(metadata.path().is_some(), "test config should come from a file");
    config
}
