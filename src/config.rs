//! This module contains constants and configuration parameters for the resolver.

/// Upper bound on any single buffer or block allocation whose size is declared
/// on the wire (bytes, strings, fixed payloads, skipped blocks). Sizes above
/// this limit are reported as an allocation failure instead of being trusted.
pub const MAX_ALLOC_SIZE: usize = 512 * 1024 * 1024;
