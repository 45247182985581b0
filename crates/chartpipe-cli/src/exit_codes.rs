//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - lint, render or Chart.yaml checks failed
pub const VALIDATION_ERROR: i32 = 2;

/// Chart not found - unknown chart name or missing Chart.yaml
pub const CHART_NOT_FOUND: i32 = 3;

/// Package error - packaging or publishing failed
pub const PACKAGE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
