//! Authorization for listing screens.
//!
//! Permissions are derived purely from a static role mapping that is
//! resolved onto the [`Actor`] when it is loaded. [`PermissionGate`] is a
//! fail-closed predicate over that set, and [`Capabilities`] is the
//! projection each screen derives once.

mod actor;
mod gate;
mod key;
mod role;

pub use actor::{Actor, PermissionSet};
pub use gate::{Capabilities, PermissionGate};
pub use key::{Capability, PermissionKey, Resource};
pub use role::Role;
