use std::fmt;

use super::{CheckOutcome, CompilationUnit, Compiler, Diagnostic};

/// Platform tag for issues that do not depend on the target.
pub const ALL_PLATFORMS: &str = "all";

/// Target a module is validated against. Each one enables a different set of capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    /// Portable baseline without optional capabilities
    Webgpu,
    /// Native backends with every capability enabled
    Native,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Webgpu, Platform::Native];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Webgpu => "webgpu",
            Platform::Native => "native",
        }
    }

    fn capabilities(self) -> naga::valid::Capabilities {
        match self {
            Platform::Webgpu => naga::valid::Capabilities::empty(),
            Platform::Native => naga::valid::Capabilities::all(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiles WGSL with naga and validates the result once per platform.
#[derive(Debug, Clone)]
pub struct WgslCompiler {
    platforms: Vec<Platform>,
    rich_reports: bool,
}

impl WgslCompiler {
    pub fn new(platforms: Vec<Platform>) -> Self {
        WgslCompiler {
            platforms,
            rich_reports: false,
        }
    }

    /// Also print annotated source snippets to stderr for every compile error.
    pub fn with_rich_reports(mut self, enabled: bool) -> Self {
        self.rich_reports = enabled;
        self
    }

    pub fn check_source(&self, source: &str, path: &str) -> Vec<Diagnostic> {
        let module = match naga::front::wgsl::parse_str(source) {
            Ok(module) => module,
            Err(error) => {
                if self.rich_reports {
                    error.emit_to_stderr_with_path(source, path);
                }
                return vec![Diagnostic::error(error.message(), ALL_PLATFORMS)];
            }
        };

        let mut diagnostics = Vec::new();

        for &platform in &self.platforms {
            let mut validator = naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                platform.capabilities(),
            );

            if let Err(error) = validator.validate(&module) {
                debug!(path, %platform, %error, "validation failed");
                if self.rich_reports {
                    emit_validation_error(&error, source, path);
                }
                diagnostics.push(Diagnostic::error(error_chain(&error), platform.name()));
            }
        }

        if module.entry_points.is_empty() {
            diagnostics.push(Diagnostic::warning(
                "shader declares no entry points",
                ALL_PLATFORMS,
            ));
        }

        diagnostics
    }
}

impl Compiler for WgslCompiler {
    fn compile_check(&self, unit: &CompilationUnit) -> CheckOutcome {
        let source = match std::fs::read_to_string(&unit.path) {
            Ok(source) => source,
            Err(error) => {
                debug!(path = %unit.name, %error, "could not read shader");
                return CheckOutcome::Unresolvable {
                    reason: error.to_string(),
                };
            }
        };

        CheckOutcome::Checked(self.check_source(&source, &unit.name))
    }
}

/// Joins an error with all of its sources, outermost first.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(next) = source {
        message.push_str(": ");
        message.push_str(&next.to_string());
        source = next.source();
    }
    message
}

fn emit_validation_error(
    error: &naga::WithSpan<naga::valid::ValidationError>,
    source: &str,
    path: &str,
) {
    use codespan_reporting::{
        diagnostic::{Diagnostic, Label},
        files::SimpleFile,
        term,
    };

    let files = SimpleFile::new(path, source);
    let config = term::Config::default();
    let mut writer = term::termcolor::Ansi::new(std::io::stderr());

    let diagnostic = Diagnostic::error()
        .with_message(error.to_string())
        .with_labels(
            error
                .spans()
                .filter_map(|(span, desc)| {
                    let range = span.to_range()?;
                    Some(Label::primary((), range).with_message(desc.to_owned()))
                })
                .collect(),
        )
        .with_notes({
            let mut notes = Vec::new();
            let mut source: &dyn std::error::Error = error;
            while let Some(next) = std::error::Error::source(source) {
                notes.push(next.to_string());
                source = next;
            }
            notes
        });

    if let Err(error) = term::emit(&mut writer, &config, &files, &diagnostic) {
        warn!(%error, "could not write validation report");
    }
}
