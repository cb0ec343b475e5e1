//! Compile-time app configuration
//!
//! Identity values are baked at build time from app.config.json.
//! Runtime knobs live in `settings`.

macro_rules! baked_config {
    ($name:ident, $env:literal) => {
        pub fn $name() -> &'static str {
            env!($env)
        }
    };
}

// App display name (e.g., "Lantern Shell")
baked_config!(app_name, "ASSETBOOT_APP_NAME");

// App slug for machine use (e.g., "lantern")
baked_config!(app_slug, "ASSETBOOT_APP_SLUG");

// Page loaded from the chosen asset root (e.g., "assets/index.html")
baked_config!(index_page, "ASSETBOOT_INDEX_PAGE");

/// Crate version, reported by the host as the app version
pub fn app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
