// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prefix for fatal diagnostics, e.g. `netvolmon: wound up with no devices to monitor`.
pub fn diagnostic(message: impl std::fmt::Display) -> String {
    format!("{}: {}", NAME, message)
}
