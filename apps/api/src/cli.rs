//! Command-line surface: serve the API, match two files, or validate a saved reply.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::llm_client::ChatBackend;
use crate::matching::matcher::{process_resume_and_jd, ProcessResult};
use crate::normalizer::validate_json_output;

#[derive(Debug, Parser)]
#[command(name = "jdmatch", version, about = "Resume ↔ job description matching via an LLM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Match a resume file against a job description file
    Match {
        /// Path to the resume text file
        #[arg(long)]
        resume: PathBuf,
        /// Path to the job description text file
        #[arg(long)]
        jd: PathBuf,
        /// Also write the full result (parsed documents included) here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run JSON recovery on a saved model reply; no API key needed
    Validate {
        /// File holding the raw reply
        file: PathBuf,
    },
}

pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Error reading file {}", path.display()))
}

pub fn write_output(path: &Path, result: &ProcessResult) -> Result<()> {
    let body = serde_json::to_string_pretty(result)?;
    std::fs::write(path, body).with_context(|| format!("Error saving output to {}", path.display()))
}

/// Runs a match and returns the pretty-printed matching result.
pub async fn run_match(
    resume: &Path,
    jd: &Path,
    output: Option<&Path>,
    llm: &dyn ChatBackend,
    repair_retry: bool,
) -> Result<String> {
    let resume_text = read_input(resume)?;
    let jd_text = read_input(jd)?;

    info!("Processing resume and job description...");
    let result = process_resume_and_jd(&resume_text, &jd_text, llm, repair_retry).await;

    if let Some(path) = output {
        write_output(path, &result)?;
        info!("Full results saved to {}", path.display());
    }

    Ok(serde_json::to_string_pretty(&result.matching_result)?)
}

/// Returns the recovered JSON or the diagnostic, pretty-printed.
pub fn run_validate(file: &Path) -> Result<String> {
    let raw = read_input(file)?;
    let rendered = match validate_json_output(&raw) {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(diagnostic) => serde_json::to_string_pretty(&diagnostic)?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::tests::{good_match_reply, ScriptedBackend};
    use serde_json::Value;

    #[test]
    fn test_cli_parses_match_command() {
        let cli = Cli::try_parse_from([
            "jdmatch", "match", "--resume", "r.txt", "--jd", "j.txt", "--output", "o.json",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Match { resume, jd, output }) => {
                assert_eq!(resume, PathBuf::from("r.txt"));
                assert_eq!(jd, PathBuf::from("j.txt"));
                assert_eq!(output, Some(PathBuf::from("o.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["jdmatch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_match_requires_both_files() {
        assert!(Cli::try_parse_from(["jdmatch", "match", "--resume", "r.txt"]).is_err());
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Error reading file"));
    }

    #[test]
    fn test_run_validate_reports_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.txt");
        std::fs::write(&path, "no json here").unwrap();

        let rendered = run_validate(&path).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["error"], "Invalid JSON format");
    }

    #[test]
    fn test_run_validate_recovers_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.txt");
        std::fs::write(&path, "Sure!\n```json\n{\"skills\": {\"match_level\": 4,}}\n```").unwrap();

        let rendered = run_validate(&path).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["skills"]["match_level"], 4);
    }

    #[tokio::test]
    async fn test_run_match_writes_full_output() {
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.txt");
        let jd = dir.path().join("jd.txt");
        let output = dir.path().join("out.json");
        std::fs::write(&resume, "Jane Smith\nRust engineer").unwrap();
        std::fs::write(&jd, "Senior Rust Engineer").unwrap();

        let backend = ScriptedBackend::new(vec![Ok(good_match_reply())]);
        let printed = run_match(&resume, &jd, Some(output.as_path()), &backend, true)
            .await
            .unwrap();

        let matching: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(matching["education"]["match_level"], 6);

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert!(saved["parsed_resume"].is_object());
        assert!(saved["parsed_job_description"].is_object());
        assert_eq!(saved["matching_result"], matching);
    }
}
