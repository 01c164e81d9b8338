//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - Built into the binary
//! 2. **Project** - `$CWD/license-import/config.yaml`
//! 3. **User** - `~/.license-import/config.yaml`
//! 4. **Environment** - variables listed below
//!
//! ## Environment Variables
//! - `LICENSE_IMPORT_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `LICENSE_IMPORT_DB_PATH` - Database path
//! - `LICENSE_IMPORT_USER_DIR` - User config dir (default: `~/.license-import`)
//! - `LICENSE_IMPORT_PROJECT_DIR` - Project config dir (default: `./license-import`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::deep_merge;
pub use types::*;
