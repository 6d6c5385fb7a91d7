fn main() {
    // Secrets and device settings are read from `cfg.toml` at build time.
    assert!(
        std::path::Path::new("cfg.toml").exists(),
        "A `cfg.toml` file is required, copy `cfg.toml.example` and fill it in."
    );
    println!("cargo:rerun-if-changed=cfg.toml");
}
