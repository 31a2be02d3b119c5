//! Settings Module
//!
//! Persisted configuration loaded from TOML. There is no global instance:
//! the binary loads [`Settings`] once and hands the pieces to the objects
//! that need them.
//!
//! ## Loading Order
//!
//! 1. `REPORT_MASTER_CONFIG` environment variable (path to TOML file)
//! 2. `report_master.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Example
//!
//! ```toml
//! motor = "api"
//!
//! [remote]
//! url = "https://api.openai.com/v1"
//! api_key = "sk-..."
//! model = "gpt-4o-mini"
//!
//! [ui]
//! theme = "light"
//! ```

mod settings;
pub mod defaults;
pub mod validation;

pub use settings::*;
