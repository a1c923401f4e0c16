use std::io::Read;

use anyhow::Context;

pub mod generate;
pub mod rules;
pub mod versions;

/// Read a whole input file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}
