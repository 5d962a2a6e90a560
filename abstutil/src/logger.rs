/// Route everything logged through the `log` crate to STDERR. The level defaults to `info`, and
/// `RUST_LOG` overrides it the usual way (`RUST_LOG=geofence=debug`).
pub fn setup() {
    setup_with_default("info");
}

/// Like `setup`, but with a different default filter when `RUST_LOG` isn't set.
pub fn setup_with_default(filter: &str) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use env_logger::{Builder, Env};
        // Tests and tools may call this more than once; only the first call wins.
        let _ = Builder::from_env(Env::default().default_filter_or(filter)).try_init();
    }
}
