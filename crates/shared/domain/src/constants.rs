//! Domain-level constants.

// =============================================================================
// Orders
// =============================================================================

/// Status assigned to orders created without an explicit status
pub const DEFAULT_ORDER_STATUS: &str = "pending";
