//! Command allow-list.
//!
//! This module defines the ONLY programs the command handler may execute.
//! The list is compiled into the binary - the generative service cannot
//! extend it. Any program or argument outside the list aborts the whole
//! pipeline with an explicit rejection; unknown tokens are never dropped
//! silently.

use std::collections::HashMap;
use thiserror::Error;

/// One allow-listed program and the arguments it accepts.
#[derive(Debug, Clone)]
pub struct AllowedCommand {
    /// Program name as it appears in the question (e.g. "npx")
    pub program: &'static str,
    /// Exact argument strings permitted for this program
    pub allowed_args: &'static [&'static str],
    /// File extensions the program may be pointed at; "*" allows any
    pub allowed_extensions: &'static [&'static str],
}

/// The complete allow-list - defined at compile time.
pub static COMMAND_ALLOWLIST: &[AllowedCommand] = &[
    AllowedCommand {
        program: "npx",
        allowed_args: &["-y", "prettier@3.4.2"],
        allowed_extensions: &[".md", ".js", ".json", ".html", ".css"],
    },
    AllowedCommand {
        program: "sha256sum",
        allowed_args: &[],
        allowed_extensions: &["*"],
    },
];

/// Rejections from allow-list validation.
#[derive(Debug, Clone, Error)]
pub enum AllowlistError {
    #[error("Command '{0}' is not allowed for security reasons.")]
    CommandNotAllowed(String),

    #[error("Argument '{arg}' is not allowed for command '{program}'.")]
    ArgumentNotAllowed { program: String, arg: String },

    #[error("Package '{0}' is not allowed for security reasons.")]
    PackageNotAllowed(String),

    #[error("Empty command stage.")]
    EmptyStage,
}

/// Registry for validating pipeline stages against the allow-list.
pub struct CommandAllowlist {
    by_program: HashMap<&'static str, &'static AllowedCommand>,
}

impl CommandAllowlist {
    pub fn new() -> Self {
        let mut by_program = HashMap::new();
        for cmd in COMMAND_ALLOWLIST {
            by_program.insert(cmd.program, cmd);
        }
        Self { by_program }
    }

    /// Look up a program by name.
    pub fn get(&self, program: &str) -> Option<&'static AllowedCommand> {
        self.by_program.get(program).copied()
    }

    /// Validate one pipeline stage, already split into tokens, with the
    /// uploaded file's name substituted in.
    ///
    /// Returns the argv to execute. Every argument must be the file name,
    /// an allow-listed value, a `--` flag, or (for npx) a versioned
    /// package containing an allow-listed identifier. Anything else is a
    /// hard rejection.
    pub fn validate_stage(
        &self,
        tokens: &[String],
        file_name: &str,
    ) -> Result<Vec<String>, AllowlistError> {
        let program = tokens.first().ok_or(AllowlistError::EmptyStage)?;

        let cmd = self
            .get(program)
            .ok_or_else(|| AllowlistError::CommandNotAllowed(program.clone()))?;

        let mut argv = vec![program.clone()];
        for arg in &tokens[1..] {
            if arg == file_name {
                argv.push(arg.clone());
            } else if cmd.allowed_args.contains(&arg.as_str()) || arg.starts_with("--") {
                argv.push(arg.clone());
            } else if cmd.program == "npx" && arg.contains('@') {
                if cmd.allowed_args.iter().any(|pkg| arg.contains(pkg)) {
                    argv.push(arg.clone());
                } else {
                    return Err(AllowlistError::PackageNotAllowed(arg.clone()));
                }
            } else {
                return Err(AllowlistError::ArgumentNotAllowed {
                    program: program.clone(),
                    arg: arg.clone(),
                });
            }
        }

        Ok(argv)
    }

    /// Whether the program may operate on a file with this name.
    pub fn extension_allowed(&self, program: &str, file_name: &str) -> bool {
        let Some(cmd) = self.get(program) else {
            return false;
        };
        if cmd.allowed_extensions.contains(&"*") {
            return true;
        }
        let lower = file_name.to_lowercase();
        cmd.allowed_extensions.iter().any(|ext| lower.ends_with(ext))
    }
}

impl Default for CommandAllowlist {
    fn default() -> Self {
        Self::new()
    }
}
