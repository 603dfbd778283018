// Test modules for vendor-api-harness crate
//
// Each source file has a corresponding test file that focuses on
// behavior verification.

// Test helper utilities
pub mod helpers;
