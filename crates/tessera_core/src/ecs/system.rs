//! # System Interface
//!
//! A **system** is a unit of per-frame logic. Systems are registered with
//! the [`Scheduler`] under a stable type id, declare dependencies on other
//! systems, and receive three phase callbacks per frame in work-order
//! sequence.
//!
//! Priority and the active flag are scheduler-side state: the trait itself
//! is a minimal capability set (a name for diagnostics plus the phase
//! callbacks), so any type can be a system without carrying bookkeeping
//! fields.
//!
//! [`Scheduler`]: crate::ecs::Scheduler

use std::fmt;

/// Stable integer type-id of a registered system.
///
/// Chosen by the registering code; the scheduler keys its dependency
/// relation and work order on these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SystemId(u32);

impl SystemId {
    /// Creates a system id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling priority of a system. Higher values run earlier.
pub type SystemPriority = u16;

/// Priority assigned by [`Scheduler::register`] when none is given.
///
/// [`Scheduler::register`]: crate::ecs::Scheduler::register
pub const LOWEST_SYSTEM_PRIORITY: SystemPriority = SystemPriority::MIN;

/// Middling priority for ordinary per-frame logic.
pub const NORMAL_SYSTEM_PRIORITY: SystemPriority = 100;

/// Highest defined priority; such a group runs before everything else.
pub const HIGHEST_SYSTEM_PRIORITY: SystemPriority = SystemPriority::MAX;

/// A schedulable unit of per-frame logic.
///
/// The scheduler drives each phase across the whole work order before the
/// next phase begins; all calls are synchronous and single-threaded, and a
/// system runs only while its active flag is set.
pub trait System {
    /// Human-readable name, used in work-order diagnostics.
    fn name(&self) -> &str;

    /// Called once per frame before [`System::update`]; `dt` is the elapsed
    /// time in milliseconds.
    fn pre_update(&mut self, dt: f64) {
        let _ = dt;
    }

    /// Called once per frame; `dt` is the elapsed time in milliseconds.
    fn update(&mut self, dt: f64);

    /// Called once per frame after [`System::update`]; `dt` is the elapsed
    /// time in milliseconds.
    fn post_update(&mut self, dt: f64) {
        let _ = dt;
    }
}
