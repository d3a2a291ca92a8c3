//! CLI module for the safe-apply planner.
//!
//! This module provides the command-line interface and the helpers that
//! read planning inputs from files or stdin.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, PlanInputs};
pub use output::OutputFormatter;

use std::io::Read;
use std::path::Path;

use crate::error::{PlanError, Result};

/// Reads an input file, or stdin when the path is `-`.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn read_input(path: &Path) -> Result<String> {
    let source_name = path.display().to_string();
    let unreadable = |e: std::io::Error| PlanError::UnreadableInput {
        source_name: source_name.clone(),
        message: e.to_string(),
    };

    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(unreadable)?;
        return Ok(buffer);
    }

    Ok(std::fs::read_to_string(path).map_err(unreadable)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SafeApplyError;
    use tempfile::TempDir;

    #[test]
    fn test_read_input_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plan.txt");
        std::fs::write(&path, "+ aws_instance.a\n").unwrap();
        assert_eq!(read_input(&path).unwrap(), "+ aws_instance.a\n");
    }

    #[test]
    fn test_read_input_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_input(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(
            err,
            SafeApplyError::Plan(PlanError::UnreadableInput { .. })
        ));
    }
}
