//! Tracing/logging setup shared by the binaries.

/// Initialize process-wide tracing, as JSON or human-readable lines.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(json: bool) {
    tracing::init(json);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
