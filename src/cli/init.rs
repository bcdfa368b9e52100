//! Init command - write a shipready.toml template

use crate::config::write_template;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

/// Run the init command
pub fn run(path: &Path) -> Result<()> {
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !repo_path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", repo_path.display());
    }

    match write_template(&repo_path) {
        Ok(config_path) => {
            println!(
                "{} Created {}",
                style("✓").green(),
                style(config_path.display()).cyan()
            );
            println!("\nNext: {}", style("shipready scan .").bold());
            Ok(())
        }
        Err(ConfigError::AlreadyExists(config_path)) => {
            println!(
                "{} Config already exists at {}",
                style("✓").green(),
                style(config_path.display()).cyan()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path()).unwrap();
        std::fs::write(dir.path().join("shipready.toml"), "# edited\n").unwrap();
        run(dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("shipready.toml")).unwrap();
        assert_eq!(content, "# edited\n");
    }

    #[test]
    fn test_init_missing_path() {
        assert!(run(Path::new("/definitely/not/here")).is_err());
    }
}
