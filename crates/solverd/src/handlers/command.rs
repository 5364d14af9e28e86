//! Restricted command execution.
//!
//! Pipelines extracted from recognized question phrasings run inside an
//! isolated working directory holding a copy of the uploaded file. Every
//! program and argument is validated against the compiled-in allow-list
//! BEFORE anything executes; stages run strictly sequentially with each
//! stage's stdout piped into the next, and the first nonzero exit aborts
//! with that stage's diagnostics. The working directory is discarded when
//! the guard drops, success or not.

use solver_common::CommandAllowlist;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use crate::files::StagedUpload;
use crate::patterns;

/// Placeholder tokens replaced with the uploaded file's name.
const FILE_PLACEHOLDERS: &[&str] = &["$FILE", "{file}"];

/// Answer a question that requires command execution, re-extracting the
/// command clause from the original question text.
pub async fn process_command_question(question: &str, upload: Option<&StagedUpload>) -> String {
    let Some(upload) = upload else {
        return "Error: No file was uploaded for command execution.".to_string();
    };

    let Some(stages) = patterns::extract_command_stages(question) else {
        return "Error: Could not identify command to execute from question.".to_string();
    };

    run_pipeline(&stages, upload).await
}

/// The canonical format-then-hash pipeline used by the literal
/// short-circuit, bypassing clause extraction entirely.
pub async fn prettier_sha256(upload: &StagedUpload) -> String {
    let stages = vec![
        format!("npx -y prettier@3.4.2 {}", upload.name()),
        "sha256sum".to_string(),
    ];
    run_pipeline(&stages, upload).await
}

/// Run pipeline stages left to right in an isolated working directory.
pub async fn run_pipeline(stages: &[String], upload: &StagedUpload) -> String {
    match run_pipeline_inner(stages, upload).await {
        Ok(output) => output,
        Err(message) => message,
    }
}

async fn run_pipeline_inner(stages: &[String], upload: &StagedUpload) -> Result<String, String> {
    let file_name = upload.name().to_string();

    let workdir =
        tempfile::tempdir().map_err(|e| format!("Error executing commands: {}", e))?;
    std::fs::copy(upload.path(), workdir.path().join(&file_name))
        .map_err(|e| format!("Error executing commands: {}", e))?;

    // Validate the whole pipeline up front - nothing runs if any stage
    // carries a disallowed program or argument.
    let allowlist = CommandAllowlist::new();
    let mut pipeline: Vec<Vec<String>> = Vec::new();

    for stage in stages {
        let tokens: Vec<String> = stage
            .split_whitespace()
            .map(|token| {
                if FILE_PLACEHOLDERS.contains(&token) {
                    file_name.clone()
                } else {
                    token.to_string()
                }
            })
            .collect();

        let argv = allowlist
            .validate_stage(&tokens, &file_name)
            .map_err(|e| format!("Error: {}", e))?;

        if argv[1..].contains(&file_name) && !allowlist.extension_allowed(&argv[0], &file_name) {
            return Err(format!(
                "Error: File '{}' is not allowed for command '{}'.",
                file_name, argv[0]
            ));
        }

        pipeline.push(argv);
    }

    let mut piped: Option<String> = None;

    for argv in &pipeline {
        let program = &argv[0];
        info!("Executing pipeline stage: {}", argv.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(&argv[1..])
            .current_dir(workdir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let spawn_err = |e: std::io::Error| format!("Error executing {}: {}", program, e);

        let output = match piped.take() {
            Some(input) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn().map_err(spawn_err)?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin
                        .write_all(input.as_bytes())
                        .await
                        .map_err(spawn_err)?;
                }
                child.wait_with_output().await.map_err(spawn_err)?
            }
            None => {
                cmd.stdin(Stdio::null());
                cmd.output().await.map_err(spawn_err)?
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("Error executing {}: {}", program, stderr.trim()));
        }

        piped = Some(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    Ok(piped.unwrap_or_default().trim().to_string())
}
