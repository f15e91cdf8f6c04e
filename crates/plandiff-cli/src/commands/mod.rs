pub mod compare;
pub mod validate;

use std::path::Path;

use plandiff_core::model::SnapshotInput;

/// Read a snapshot input from a JSON file
pub(crate) fn read_input(path: &Path) -> Result<SnapshotInput, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let input = serde_json::from_str(&text)
        .map_err(|e| format!("invalid snapshot file {}: {}", path.display(), e))?;
    Ok(input)
}
