//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `memoer_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("memoer_core version={}", memoer_core::core_version());
    println!(
        "memoer_core schema_version={}",
        memoer_core::db::migrations::latest_version()
    );
}
