//! Configuration.
//!
//! Merged field-by-field from three tiers, then environment overrides:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/shiftlist/config.yaml`
//! 3. **User** - `~/.shiftlist/config.yaml`
//!
//! ## Environment Variables
//! - `SHIFTLIST_CONFIG_PATH` - Explicit config file (replaces tier lookup)
//! - `SHIFTLIST_DB_PATH` - Database path
//! - `SHIFTLIST_ADMIN_PASSWORD` - Admin secret
//! - `SHIFTLIST_CRON_SECRET` - Scheduler bearer secret
//! - `SHIFTLIST_PORT` - HTTP port
//! - `SHIFTLIST_USER_DIR` - User config dir (default: `~/.shiftlist`)
//! - `SHIFTLIST_PROJECT_DIR` - Project config dir (default: `./shiftlist`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::deep_merge;
pub use types::*;
