//! Converter backed by the `asciidoctor` executable.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use super::{ConvertError, Converter, DocumentMetadata, scanner};
use crate::config::ConverterConfig;

/// Renders documents by running `asciidoctor` once per request.
///
/// Metadata never touches the executable: it comes from the line scanner,
/// which keeps file events cheap.
#[derive(Debug, Clone)]
pub struct AsciidoctorConverter {
    command: String,
    args: Vec<String>,
    safe_mode: String,
    attributes: BTreeMap<String, String>,
}

impl AsciidoctorConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            safe_mode: config.safe_mode.clone(),
            attributes: config.attributes.clone(),
        }
    }

    /// Full argument list for rendering `path` to stdout.
    pub fn command_args(&self, path: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--safe-mode".to_string());
        args.push(self.safe_mode.clone());
        for (name, value) in &self.attributes {
            args.push("-a".to_string());
            args.push(format!("{name}={value}"));
        }
        args.push("-o".to_string());
        args.push("-".to_string());
        args.push(path.display().to_string());
        args
    }
}

impl Default for AsciidoctorConverter {
    fn default() -> Self {
        Self::new(&ConverterConfig::default())
    }
}

impl Converter for AsciidoctorConverter {
    fn render(&self, path: &Path) -> Result<String, ConvertError> {
        let mut command = Command::new(&self.command);
        command.args(self.command_args(path));
        if let Some(dir) = path.parent() {
            command.current_dir(dir);
        }

        let out = command.output().map_err(|source| ConvertError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if !out.status.success() {
            return Err(ConvertError::Failed {
                path: path.to_path_buf(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        let stderr = String::from_utf8_lossy(&out.stderr);
        if !stderr.trim().is_empty() {
            tracing::warn!("[converter] {}: {}", path.display(), stderr.trim());
        }

        if out.stdout.is_empty() {
            return Err(ConvertError::EmptyOutput {
                path: path.to_path_buf(),
            });
        }

        String::from_utf8(out.stdout).map_err(|_| ConvertError::InvalidUtf8 {
            path: path.to_path_buf(),
        })
    }

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ConvertError> {
        scanner::scan_document(path)
    }
}
