//! Process exit codes.

pub const SUCCESS: i32 = 0;
pub const ANALYSIS_ERROR: i32 = 1;
pub const CONFIG_ERROR: i32 = 2;
pub const INTERNAL_ERROR: i32 = 3;
