//! Contract bindings for the OP Stack withdrawal contracts.
//!
//! - OptimismPortal2 (L1 finalization and status queries)
//! - L2ToL1MessagePasser (L2 withdrawal events)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod opstack;
