use crate::parser::Rank;
use crate::utils::config::{DEFAULT_INPUT_TRACE, DEFAULT_OUTPUT_TRACE};
use std::path::PathBuf;

/// Arguments for the simulate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct SimulateArgs {
    /// Textual trace to analyse
    pub input: PathBuf,

    /// Rewritten trace
    pub output: PathBuf,

    /// Output path for JSON report (optional)
    pub report: Option<PathBuf>,

    /// `(rank, factor)` compute accelerations
    pub hardware: Vec<(Rank, f64)>,

    /// `(from, to, factor)` link accelerations
    pub links: Vec<(Rank, Rank, f64)>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_TRACE),
            output: PathBuf::from(DEFAULT_OUTPUT_TRACE),
            report: None,
            hardware: Vec::new(),
            links: Vec::new(),
            print_summary: false,
        }
    }
}

/// Parse a `--hw` value of the form `<rank>=<factor>`
pub fn parse_hardware_factor(value: &str) -> Result<(Rank, f64), String> {
    let (rank, factor) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <rank>=<factor>, got '{}'", value))?;
    Ok((parse_rank(rank)?, parse_factor(factor)?))
}

/// Parse a `--link` value of the form `<from>:<to>=<factor>`
pub fn parse_link_factor(value: &str) -> Result<(Rank, Rank, f64), String> {
    let (link, factor) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <from>:<to>=<factor>, got '{}'", value))?;
    let (from, to) = link
        .split_once(':')
        .ok_or_else(|| format!("expected <from>:<to>, got '{}'", link))?;
    Ok((parse_rank(from)?, parse_rank(to)?, parse_factor(factor)?))
}

fn parse_rank(text: &str) -> Result<Rank, String> {
    text.trim()
        .parse()
        .map_err(|e| format!("invalid rank '{}': {}", text.trim(), e))
}

fn parse_factor(text: &str) -> Result<f64, String> {
    text.trim()
        .parse()
        .map_err(|e| format!("invalid factor '{}': {}", text.trim(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hardware_factor() {
        assert_eq!(parse_hardware_factor("3=2.5"), Ok((3, 2.5)));
        assert!(parse_hardware_factor("3").is_err());
        assert!(parse_hardware_factor("x=2").is_err());
    }

    #[test]
    fn test_parse_link_factor() {
        assert_eq!(parse_link_factor("0:1=4"), Ok((0, 1, 4.0)));
        assert!(parse_link_factor("0-1=4").is_err());
        assert!(parse_link_factor("0:1=fast").is_err());
    }
}
