//! Extractor backed by an external command.

use super::{Ecosystem, Extractor, ExtractorOutput};
use crate::config::CommandExtractorConfig;
use crate::context::ScanContext;
use crate::error::{ExtractorErrorKind, Result, SbomGraphError};
use crate::utils::{run_command, CommandSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder in configured arguments replaced with the scanned path.
const PATH_PLACEHOLDER: &str = "{path}";
/// Placeholder replaced with a file in a per-run scratch directory.
///
/// When present, the output is read from that file instead of stdout.
const OUTPUT_PLACEHOLDER: &str = "{output}";
/// Name of the output file inside the scratch directory.
const OUTPUT_FILE: &str = "bom.json";
/// Longest stderr excerpt kept in an error.
const STDERR_EXCERPT: usize = 2048;

/// Runs a configured program and reads its stdout, or the `{output}`
/// scratch file, as extractor output.
///
/// Each failed or empty run counts towards the program's circuit breaker
/// in the scan context; once it opens, the program is not started again.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    config: CommandExtractorConfig,
    ecosystem: Ecosystem,
}

impl CommandExtractor {
    pub fn from_config(config: &CommandExtractorConfig) -> Result<Self> {
        let ecosystem = Ecosystem::from_name(&config.ecosystem).ok_or_else(|| {
            SbomGraphError::config(format!(
                "extractor '{}' has unknown ecosystem '{}'",
                config.name, config.ecosystem
            ))
        })?;
        Ok(Self {
            config: config.clone(),
            ecosystem,
        })
    }

    fn applies_to(&self, path: &Path) -> bool {
        self.config.manifests.is_empty()
            || self
                .config
                .manifests
                .iter()
                .any(|manifest| path.join(manifest).exists())
    }

    /// Create a scratch directory for one run and register it for removal.
    fn scratch_file(&self, ctx: &ScanContext) -> std::result::Result<PathBuf, ExtractorErrorKind> {
        let dir = std::env::temp_dir().join(format!("sbom-graph-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).map_err(|e| ExtractorErrorKind::Spawn {
            program: self.config.program.clone(),
            reason: format!("cannot create {}: {e}", dir.display()),
        })?;
        ctx.register_temp_dir(dir.clone());
        Ok(dir.join(OUTPUT_FILE))
    }

    /// The command line for `path` and, if the arguments ask for one, the
    /// file the program writes its output to.
    fn command_spec(
        &self,
        path: &Path,
        ctx: &ScanContext,
    ) -> std::result::Result<(CommandSpec, Option<PathBuf>), ExtractorErrorKind> {
        let output_file = if self.config.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            Some(self.scratch_file(ctx)?)
        } else {
            None
        };
        let path_str = path.to_string_lossy();
        let output_str = output_file
            .as_deref()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let args = self.config.args.iter().map(|arg| {
            arg.replace(PATH_PLACEHOLDER, &path_str)
                .replace(OUTPUT_PLACEHOLDER, &output_str)
        });
        let cwd = if path.is_dir() { path } else { path.parent().unwrap_or(path) };
        let execution = ctx.execution();
        let spec = CommandSpec::new(&self.config.program)
            .args(args)
            .cwd(cwd)
            .timeout(Duration::from_secs(execution.timeout_secs))
            .max_output_bytes(execution.max_buffer_bytes);
        Ok((spec, output_file))
    }
}

fn read_output_file(file: &Path) -> std::result::Result<ExtractorOutput, ExtractorErrorKind> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| ExtractorErrorKind::Unparsable(format!("{}: {e}", file.display())))?;
    ExtractorOutput::from_json(&content)
}

impl Extractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    fn extract(&self, path: &Path, ctx: &ScanContext) -> std::result::Result<ExtractorOutput, ExtractorErrorKind> {
        if !self.applies_to(path) {
            return Ok(ExtractorOutput::default());
        }
        let program = self.config.program.as_str();
        if ctx.circuit_open(program) {
            return Err(ExtractorErrorKind::CircuitOpen(program.to_string()));
        }

        let (spec, output_file) = self.command_spec(path, ctx)?;
        ctx.record_command(format!("{} {}", spec.program, spec.args.join(" ")).trim_end().to_string());
        tracing::debug!("Running {} for {}", self.config.name, path.display());

        let result = run_command(&spec).and_then(|out| {
            if out.success {
                match &output_file {
                    Some(file) => read_output_file(file),
                    None => ExtractorOutput::from_json(&out.stdout),
                }
            } else {
                let mut stderr = out.stderr;
                if stderr.len() > STDERR_EXCERPT {
                    let mut cut = STDERR_EXCERPT;
                    while !stderr.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    stderr.truncate(cut);
                }
                Err(ExtractorErrorKind::NonZeroExit {
                    program: program.to_string(),
                    code: out.code,
                    stderr: stderr.trim().to_string(),
                })
            }
        });

        match &result {
            Ok(output) if !output.is_empty() => ctx.record_success(program),
            _ => ctx.record_failure(program),
        }
        result
    }
}
