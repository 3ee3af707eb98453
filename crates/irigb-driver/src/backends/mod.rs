//! Register transports
//!
//! Two backends:
//! - **Kernel**: `/dev/moxa_irigb*` ioctls (requires the `moxa_irigb` module)
//! - **Simulated**: in-memory register file with a write log and fault
//!   injection, for tests and CI without a card

pub mod kernel;
pub mod simulated;

pub use kernel::KernelPort;
pub use simulated::{Access, FaultOp, SimulatedCard};
