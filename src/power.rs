//! Power-state model and transition gate.
//!
//! Interfaces and bundles share one three-state machine:
//!
//! ```text
//!         power_on                 power_suspend
//!   OFF ───────────▶ ON ◀──────────────────────▶ SUSPEND
//!    ▲                │                             │
//!    └── power_off ───┘        SUSPEND ─╳─▶ OFF     │
//!                              OFF ─╳─▶ SUSPEND ◀───┘
//! ```
//!
//! [`gate`] decides, before any remote call is made, whether a requested
//! transition proceeds, is skipped, or is rejected.  A transition towards a
//! lower state is *vetoed* (skipped, not failed) while any child is still
//! more powered than the target.  Callers issue the remote request only on
//! [`Gate::Proceed`] and commit the local state only after it succeeds.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Power state of a connection, bundle or interface.
///
/// Ordered by how "on" the entity is: `Off < Suspend < On`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerState {
    Off = 0,
    Suspend = 1,
    On = 2,
}

impl PowerState {
    /// Value carried in set-power-state requests.
    pub const fn wire(self) -> u8 {
        self as u8
    }

    /// Attribute text shown by the inspection surface.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Suspend => "SUSPENDED",
            Self::On => "ON",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Transition outcome
// ---------------------------------------------------------------------------

/// What a successful power operation actually did.
///
/// Every variant is a success; only [`Outcome::Performed`] means the state
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Remote request issued and local state updated.
    Performed,
    /// Entity was already in the target state; nothing was sent.
    AlreadyInState,
    /// A child is more powered than the target; nothing was sent.
    Vetoed,
}

/// Verdict of [`gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Skip(Outcome),
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Check whether `current -> target` may proceed given the states of the
/// entity's children.
///
/// * same state: skipped, [`Outcome::AlreadyInState`]
/// * towards `On`: always proceeds
/// * towards a lower state while any child is above `target`: vetoed
/// * `Off -> Suspend`, `Suspend -> Off`: [`Error::InvalidTransition`]
///
/// The veto is checked before the illegal edges, so a suspended bundle
/// with an active connection answers `power_off` with a veto.
pub fn gate<I>(current: PowerState, target: PowerState, children: I) -> Result<Gate>
where
    I: IntoIterator<Item = PowerState>,
{
    if current == target {
        return Ok(Gate::Skip(Outcome::AlreadyInState));
    }
    if target == PowerState::On {
        return Ok(Gate::Proceed);
    }

    if children.into_iter().any(|child| child > target) {
        return Ok(Gate::Skip(Outcome::Vetoed));
    }

    if matches!(
        (current, target),
        (PowerState::Off, PowerState::Suspend) | (PowerState::Suspend, PowerState::Off)
    ) {
        return Err(Error::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(Gate::Proceed)
}
