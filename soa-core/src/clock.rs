//! Injectable "now" and call-context signals.
//!
//! Rule logic never reads the wall clock itself; callers hand in a [`Clock`].

use chrono::{DateTime, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the OS clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Used by simulations and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Whether the current call was initiated by the member (inbound).
///
/// Inbound calls are exempt from the cooldown rule.
pub trait InboundSignal {
    fn is_inbound(&self) -> bool;
}

/// No call-context source wired up: never inbound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInboundSignal;

impl InboundSignal for NoInboundSignal {
    fn is_inbound(&self) -> bool {
        false
    }
}

/// Fixed inbound flag, e.g. from a CLI switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticInbound(pub bool);

impl InboundSignal for StaticInbound {
    fn is_inbound(&self) -> bool {
        self.0
    }
}
