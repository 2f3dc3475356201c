//! Action records, the per-creature action stack and the holds actions own.
//!
//! An action's holds (tile locks, room memberships, carry locks, worker
//! accounting, listener registrations) are acquired when it is pushed and
//! released when it is popped or cleared, see [`lifecycle`].
mod kind;
pub(crate) mod lifecycle;
mod record;
mod stack;

pub use kind::ActionKind;
pub use record::{Action, ActionRecord, FightTarget};
pub use stack::ActionStack;
