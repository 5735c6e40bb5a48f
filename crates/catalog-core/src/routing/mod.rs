//! Navigation gating.
//!
//! `RouteGate` decides, from the synchronously readable token cookie alone,
//! whether a navigation may proceed. `Router` applies it to every
//! navigation and records where the user ended up.

pub mod gate;
pub mod router;

pub use gate::{GateDecision, RouteClass, RouteGate};
pub use router::{History, Navigator, Router};
