//! Infrastructure: filesystem scanning, regex recognizers, indices,
//! include resolution, and the external Joern slicer integration.

pub mod call_extractor;
pub mod function_locator;
pub mod include_resolver;
pub mod joern;
pub mod project_index;
pub mod scanner;
pub mod source_sink_scanner;

use std::path::Path;

/// Read a file as text, replacing invalid UTF-8 rather than failing.
/// Returns `None` when the file cannot be read at all.
pub(crate) fn read_lossy(path: &Path) -> Option<String> {
    std::fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
