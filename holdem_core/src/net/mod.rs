//! The wire boundary: typed inbound commands, versioned outbound events,
//! the privacy-preserving projections, and client-facing error codes.

pub mod errors;
pub mod messages;
