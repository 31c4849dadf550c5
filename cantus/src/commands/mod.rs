/// Effective configuration display
pub mod config;

/// Manifest command handlers
pub mod manifest;

/// Image copy handler
pub mod tag;

/// Tag listing handler
pub mod tags;

/// Version command handlers
pub mod version;
