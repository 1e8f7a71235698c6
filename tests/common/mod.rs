//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use shiftlist::db::Database;
use shiftlist::lifecycle::{Lifecycle, LifecyclePolicy};
use shiftlist::types::{Category, Task};
use std::sync::{Arc, Mutex};

/// A clock that stays where it is put.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Mid-June noon UTC; far from any expiry-hour boundary in most zones.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Helper to create a fresh in-memory database for testing.
pub fn setup_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

/// Engine over a fresh database with a fixed clock at [`noon`].
pub fn setup_engine() -> (Arc<Lifecycle>, Arc<FixedClock>) {
    setup_engine_with(LifecyclePolicy::default())
}

pub fn setup_engine_with(policy: LifecyclePolicy) -> (Arc<Lifecycle>, Arc<FixedClock>) {
    let clock = FixedClock::at(noon());
    let dyn_clock: Arc<dyn Clock + Send + Sync> = clock.clone();
    let engine = Lifecycle::new(setup_db(), dyn_clock, policy);
    (Arc::new(engine), clock)
}

pub fn seed_category(engine: &Lifecycle, name: &str) -> Category {
    engine
        .create_category(Some(name.to_string()), None)
        .expect("Failed to create category")
}

pub fn seed_master(engine: &Lifecycle, title: &str, category: &Category) -> Task {
    engine
        .create_master(
            Some(title.to_string()),
            Some(format!("{} thoroughly", title)),
            Some(category.id.clone()),
        )
        .expect("Failed to create master task")
}
