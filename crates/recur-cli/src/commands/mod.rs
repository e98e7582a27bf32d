//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, detect, policy) and shared utilities (open_db)
//! - `import` - CSV import
//! - `patterns` - Stored pattern listings and projections
//! - `serve` - Web server command

pub mod core;
pub mod import;
pub mod patterns;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use import::*;
pub use patterns::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
