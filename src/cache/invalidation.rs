//! Named invalidation helpers and domain event hooks
//!
//! These wrap the `CacheManager` primitives with the key layout used by the
//! rental API client. They hold no state of their own.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::clock::Clock;
use super::manager::CacheManager;

/// Cache key for the full vehicle list
pub const VEHICLES_KEY: &str = "vehicles";

/// Cache key for the full mechanic list
pub const MECHANICS_KEY: &str = "mechanics";

/// Cache key for the signed-in user's profile
pub const USER_PROFILE_KEY: &str = "user_profile";

/// Cache key for the booking list
pub const BOOKINGS_KEY: &str = "bookings";

static VEHICLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^vehicle_").expect("vehicle pattern is valid"));

static MECHANIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^mechanic_").expect("mechanic pattern is valid"));

static ALL_DATA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^(vehicles|mechanics|bookings|user_)").expect("data pattern is valid")
});

/// Cache key for a single vehicle
pub fn vehicle_key(id: &str) -> String {
    format!("vehicle_{}", id)
}

/// Cache key for a single mechanic
pub fn mechanic_key(id: &str) -> String {
    format!("mechanic_{}", id)
}

/// Domain events that make cached reads stale
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A user signed in
    Login,
    /// The user signed out
    Logout,
    /// A vehicle was written
    VehicleUpdated(String),
    /// A mechanic was written
    MechanicUpdated(String),
    /// A booking was created or changed
    BookingUpdated,
}

impl<V: Clone, C: Clock> CacheManager<V, C> {
    /// Drops the vehicle list and every per-vehicle entry
    pub fn clear_vehicles(&self) {
        let removed = usize::from(self.delete(VEHICLES_KEY)) + self.clear_by_pattern(&VEHICLE_PATTERN);
        debug!(removed, "Cleared vehicle cache");
    }

    /// Drops the mechanic list and every per-mechanic entry
    pub fn clear_mechanics(&self) {
        let removed =
            usize::from(self.delete(MECHANICS_KEY)) + self.clear_by_pattern(&MECHANIC_PATTERN);
        debug!(removed, "Cleared mechanic cache");
    }

    /// Drops the cached user profile
    pub fn clear_user(&self) {
        let removed = self.delete(USER_PROFILE_KEY);
        debug!(removed, "Cleared user cache");
    }

    /// Drops the cached booking list
    pub fn clear_bookings(&self) {
        let removed = self.delete(BOOKINGS_KEY);
        debug!(removed, "Cleared booking cache");
    }

    /// Drops every key starting with `vehicles`, `mechanics`, `bookings` or `user_`
    pub fn clear_all_data(&self) {
        let removed = self.clear_by_pattern(&ALL_DATA_PATTERN);
        debug!(removed, "Cleared all data caches");
    }

    /// Forces a fresh fetch of everything for the new session
    pub fn on_login(&self) {
        self.clear_user();
        self.clear_vehicles();
        self.clear_mechanics();
        self.clear_bookings();
        self.clear_all_data();
    }

    /// Drops the whole store
    pub fn on_logout(&self) {
        self.clear();
    }

    /// Drops the written vehicle and the vehicle list
    pub fn on_vehicle_update(&self, id: &str) {
        self.delete(&vehicle_key(id));
        self.delete(VEHICLES_KEY);
        debug!(id = %id, "Invalidated vehicle");
    }

    /// Drops the written mechanic and the mechanic list
    pub fn on_mechanic_update(&self, id: &str) {
        self.delete(&mechanic_key(id));
        self.delete(MECHANICS_KEY);
        debug!(id = %id, "Invalidated mechanic");
    }

    /// Drops the booking list
    pub fn on_booking_update(&self) {
        self.clear_bookings();
    }

    /// Dispatches an event to the matching hook
    pub fn apply(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Login => self.on_login(),
            CacheEvent::Logout => self.on_logout(),
            CacheEvent::VehicleUpdated(id) => self.on_vehicle_update(id),
            CacheEvent::MechanicUpdated(id) => self.on_mechanic_update(id),
            CacheEvent::BookingUpdated => self.on_booking_update(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn populated_cache() -> CacheManager<u32, ManualClock> {
        let cache = CacheManager::with_clock(ManualClock::default());
        for (i, key) in [
            "vehicles",
            "vehicle_42",
            "vehicle_7",
            "mechanics",
            "mechanic_3",
            "user_profile",
            "bookings",
            "settings",
        ]
        .iter()
        .enumerate()
        {
            cache.set(*key, i as u32, None);
        }
        cache
    }

    fn sorted_keys(cache: &CacheManager<u32, ManualClock>) -> Vec<String> {
        let mut keys = cache.keys();
        keys.sort();
        keys
    }

    #[test]
    fn test_clear_vehicles_removes_list_and_items() {
        let cache = populated_cache();
        cache.clear_vehicles();

        assert!(!cache.has("vehicles"));
        assert!(!cache.has("vehicle_42"));
        assert!(!cache.has("vehicle_7"));
        assert!(cache.has("mechanics"));
        assert!(cache.has("mechanic_3"));
    }

    #[test]
    fn test_clear_mechanics_removes_list_and_items() {
        let cache = populated_cache();
        cache.clear_mechanics();

        assert!(!cache.has("mechanics"));
        assert!(!cache.has("mechanic_3"));
        assert!(cache.has("vehicles"));
    }

    #[test]
    fn test_clear_user_and_bookings_are_single_key() {
        let cache = populated_cache();
        cache.clear_user();
        cache.clear_bookings();

        assert!(!cache.has("user_profile"));
        assert!(!cache.has("bookings"));
        assert_eq!(cache.size(), 6);
    }

    #[test]
    fn test_clear_all_data_uses_prefix_pattern() {
        let cache = populated_cache();
        cache.clear_all_data();

        // `vehicle_` and `mechanic_` items are not covered by the data pattern
        assert_eq!(
            sorted_keys(&cache),
            vec![
                "mechanic_3".to_string(),
                "settings".to_string(),
                "vehicle_42".to_string(),
                "vehicle_7".to_string(),
            ]
        );
    }

    #[test]
    fn test_on_login_clears_user_and_data_caches() {
        let cache = CacheManager::with_clock(ManualClock::default());
        cache.set("vehicles", 1, None);
        cache.set("vehicle_42", 2, None);
        cache.set("mechanics", 3, None);
        cache.set("user_profile", 4, None);

        cache.on_login();

        assert!(!cache.has("vehicles"));
        assert!(!cache.has("vehicle_42"));
        assert!(!cache.has("mechanics"));
        assert!(!cache.has("user_profile"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_on_login_keeps_unrelated_keys() {
        let cache = populated_cache();
        cache.on_login();
        assert_eq!(sorted_keys(&cache), vec!["settings".to_string()]);
    }

    #[test]
    fn test_on_logout_clears_everything() {
        let cache = populated_cache();
        cache.on_logout();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_on_vehicle_update_drops_item_and_list() {
        let cache = populated_cache();
        cache.on_vehicle_update("42");

        assert!(!cache.has("vehicle_42"));
        assert!(!cache.has("vehicles"));
        assert!(cache.has("vehicle_7"));
    }

    #[test]
    fn test_on_mechanic_update_drops_item_and_list() {
        let cache = populated_cache();
        cache.on_mechanic_update("3");

        assert!(!cache.has("mechanic_3"));
        assert!(!cache.has("mechanics"));
        assert!(cache.has("vehicles"));
    }

    #[test]
    fn test_apply_dispatches_events() {
        let cache = populated_cache();

        cache.apply(&CacheEvent::BookingUpdated);
        assert!(!cache.has("bookings"));

        cache.apply(&CacheEvent::VehicleUpdated("7".to_string()));
        assert!(!cache.has("vehicle_7"));

        cache.apply(&CacheEvent::MechanicUpdated("3".to_string()));
        assert!(!cache.has("mechanic_3"));

        cache.apply(&CacheEvent::Logout);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(vehicle_key("42"), "vehicle_42");
        assert_eq!(mechanic_key("abc"), "mechanic_abc");
    }
}
