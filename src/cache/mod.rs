//! Cache module for keeping API responses in memory
//!
//! This module provides a cache manager that stores API responses in a
//! process-local map with configurable TTL (time-to-live) values. Expired
//! entries are never served: every read checks the entry's expiry against an
//! injectable [`Clock`] and drops the entry if it has gone stale.
//!
//! Named invalidation helpers (`clear_vehicles`, `on_login`, ...) and the
//! read-through wrappers [`cached`] and [`with_cache`] are layered on top.

mod clock;
mod invalidation;
mod manager;
mod wrapper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use invalidation::{
    mechanic_key, vehicle_key, CacheEvent, BOOKINGS_KEY, MECHANICS_KEY, USER_PROFILE_KEY,
    VEHICLES_KEY,
};
pub use manager::{CacheConfig, CacheError, CacheManager, DEFAULT_TTL};
pub use wrapper::{cached, with_cache};
