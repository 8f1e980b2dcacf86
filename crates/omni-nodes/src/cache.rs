//! Cached groups and the refresh policy.
//!
//! A node caches two independent groups: its anchor and (for producers) its
//! downstream link. Each is either [`Cached::Unresolved`] or
//! [`Cached::Resolved`] with every field present. There is no
//! "partially resolved" state, and an empty path is a legitimate resolved
//! value, not a cache miss.

/// Seconds of simulated time per tick.
pub const TICK_SECONDS: u64 = 5;

/// Default refresh interval: 12 hours of simulated time, in ticks.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 12 * 60 * 60 / TICK_SECONDS;

/// A lazily computed group of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cached<T> {
    /// Never computed, or discarded.
    #[default]
    Unresolved,
    /// Computed in one pass; all fields consistent.
    Resolved(T),
}

impl<T> Cached<T> {
    /// The resolved value, if any.
    pub const fn as_resolved(&self) -> Option<&T> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(value) => Some(value),
        }
    }

    /// Returns `true` if a value is cached.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl<T> From<Option<T>> for Cached<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unresolved, Self::Resolved)
    }
}

/// TTL rule deciding when a cached group must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    interval_ticks: u64,
}

impl RefreshPolicy {
    /// A policy that expires cached groups after `interval_ticks` ticks.
    pub const fn new(interval_ticks: u64) -> Self {
        Self { interval_ticks }
    }

    /// The configured interval.
    pub const fn interval_ticks(&self) -> u64 {
        self.interval_ticks
    }

    /// A group computed at `resolved_at` is stale at `now` when more than
    /// the interval has elapsed.
    pub const fn is_stale(&self, resolved_at: u64, now: u64) -> bool {
        now.saturating_sub(resolved_at) > self.interval_ticks
    }

    /// Negation of [`is_stale`](Self::is_stale).
    pub const fn is_fresh(&self, resolved_at: u64, now: u64) -> bool {
        !self.is_stale(resolved_at, now)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
