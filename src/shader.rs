mod validate;

pub use validate::{Platform, WgslCompiler};

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::Context;

/// A single shader file picked up by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// How the unit is named in the report.
    pub name: String,
    pub path: PathBuf,
}

impl CompilationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        CompilationUnit {
            name: path.display().to_string(),
            path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One issue reported by the compiler for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Target platform the issue was found on.
    pub platform: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, platform: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            platform: platform.into(),
        }
    }

    pub fn warning(message: impl Into<String>, platform: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            platform: platform.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The unit could not be loaded at all.
    Unresolvable { reason: String },
    Checked(Vec<Diagnostic>),
}

/// Enumerates the compilation units below a set of roots.
pub trait ResourceIndex {
    /// Must return units in the same order for the same input.
    fn discover(&self, roots: &[PathBuf]) -> anyhow::Result<Vec<CompilationUnit>>;
}

pub trait Compiler {
    /// Compiles a single unit. Load failures are reported through the outcome, never as `Err`.
    fn compile_check(&self, unit: &CompilationUnit) -> CheckOutcome;
}

/// Finds shader files on disk by extension.
#[derive(Debug, Clone)]
pub struct ShaderDirectory {
    extensions: Vec<String>,
}

impl ShaderDirectory {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ShaderDirectory {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_owned())
                .collect(),
        }
    }

    fn is_shader(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

impl ResourceIndex for ShaderDirectory {
    fn discover(&self, roots: &[PathBuf]) -> anyhow::Result<Vec<CompilationUnit>> {
        let mut seen = HashSet::new();
        let mut units = Vec::new();

        for root in roots {
            if !root.exists() {
                warn!(root = %root.display(), "shader root does not exist");
                continue;
            }

            for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
                let entry = entry.with_context(|| format!("could not scan '{}'", root.display()))?;

                // symlinks are kept: a dangling one shows up as an unloadable shader
                if entry.file_type().is_dir() || !self.is_shader(entry.path()) {
                    continue;
                }

                let path = entry.into_path();
                // the same file reached through different spellings counts once
                let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if seen.insert(key) {
                    debug!(path = %path.display(), "discovered shader");
                    units.push(CompilationUnit::new(path));
                }
            }
        }

        Ok(units)
    }
}
