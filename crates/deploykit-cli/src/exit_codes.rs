//! Exit codes for the deploy CLI (spec §6: "0 on success, non-zero on any
//! fatal/timeout outcome").

#![allow(dead_code)]

/// Success - every resource succeeded.
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure.
pub const ERROR: i32 = 1;

/// Configuration error - pre-flight checks failed.
pub const CONFIGURATION_ERROR: i32 = 2;

/// Template error - a manifest failed to parse or validate.
pub const TEMPLATE_ERROR: i32 = 3;

/// Deployment failure - apply/replace/create failed, or a resource's
/// `deploy_failed?` returned true after verify.
pub const DEPLOYMENT_ERROR: i32 = 4;

/// The watcher's global deadline elapsed with no hard failures.
pub const TIMEOUT: i32 = 5;

/// Usage error - invalid arguments (following sysexits.h convention).
pub const USAGE_ERROR: i32 = 64;
