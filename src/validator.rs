//! Discover every shader, compile each one, and decide whether the run passed.
//!
//! Any diagnostic fails its shader, warnings included. Shaders that cannot be loaded fail the
//! same way. The run itself only stops early when there is nothing to validate.

use std::path::PathBuf;

use crate::{
    report::{LogSink, Report},
    shader::{CheckOutcome, Compiler, ResourceIndex},
};

/// Aggregate over all validated units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    failed: Vec<String>,
    passed: usize,
    total: usize,
}

impl ValidationResult {
    fn record_pass(&mut self) {
        self.passed += 1;
        self.total += 1;
    }

    fn record_failure(&mut self, name: &str) {
        self.failed.push(name.to_owned());
        self.total += 1;
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Names of the failed units, in discovery order.
    pub fn failed_units(&self) -> &[String] {
        &self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Discovery came back empty, nothing was compiled.
    NothingFound,
    Completed(ValidationResult),
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed(result) if result.is_success() => 0,
            _ => 1,
        }
    }
}

pub fn run<I, C, S>(
    index: &I,
    compiler: &C,
    roots: &[PathBuf],
    sink: &mut S,
) -> anyhow::Result<RunOutcome>
where
    I: ResourceIndex + ?Sized,
    C: Compiler + ?Sized,
    S: LogSink + ?Sized,
{
    let mut report = Report::new(sink);
    report.started();

    let units = index.discover(roots)?;
    if units.is_empty() {
        report.nothing_found(roots);
        return Ok(RunOutcome::NothingFound);
    }

    report.found(units.len());

    let mut result = ValidationResult::default();

    for unit in &units {
        debug!(unit = %unit.name, "compiling");

        match compiler.compile_check(unit) {
            CheckOutcome::Unresolvable { reason } => {
                debug!(unit = %unit.name, %reason, "unresolvable");
                report.unloadable(&unit.name);
                result.record_failure(&unit.name);
            }
            CheckOutcome::Checked(diagnostics) if diagnostics.is_empty() => {
                report.passed(&unit.name);
                result.record_pass();
            }
            CheckOutcome::Checked(diagnostics) => {
                for diagnostic in &diagnostics {
                    report.diagnostic(&unit.name, diagnostic);
                }
                report.failed(&unit.name);
                result.record_failure(&unit.name);
            }
        }
    }

    debug_assert_eq!(result.passed() + result.failed(), result.total());
    debug_assert_eq!(result.total(), units.len());

    report.summary(&result);

    Ok(RunOutcome::Completed(result))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        report::{Stream, Transcript},
        shader::{CompilationUnit, Diagnostic},
    };

    /// Serves a fixed list of units regardless of the roots.
    struct FixedIndex(Vec<&'static str>);

    impl ResourceIndex for FixedIndex {
        fn discover(&self, _roots: &[PathBuf]) -> anyhow::Result<Vec<CompilationUnit>> {
            Ok(self.0.iter().copied().map(CompilationUnit::new).collect())
        }
    }

    struct BrokenIndex;

    impl ResourceIndex for BrokenIndex {
        fn discover(&self, _roots: &[PathBuf]) -> anyhow::Result<Vec<CompilationUnit>> {
            Err(anyhow::format_err!("permission denied"))
        }
    }

    /// Units not listed compile cleanly.
    #[derive(Default)]
    struct ScriptedCompiler(HashMap<&'static str, CheckOutcome>);

    impl ScriptedCompiler {
        fn with(mut self, name: &'static str, outcome: CheckOutcome) -> Self {
            self.0.insert(name, outcome);
            self
        }
    }

    impl Compiler for ScriptedCompiler {
        fn compile_check(&self, unit: &CompilationUnit) -> CheckOutcome {
            self.0
                .get(unit.name.as_str())
                .cloned()
                .unwrap_or(CheckOutcome::Checked(vec![]))
        }
    }

    fn roots() -> Vec<PathBuf> {
        vec![PathBuf::from("Assets/Shaders")]
    }

    fn validate(
        index: &FixedIndex,
        compiler: &ScriptedCompiler,
    ) -> (RunOutcome, Transcript) {
        let mut transcript = Transcript::default();
        let outcome = run(index, compiler, &roots(), &mut transcript).unwrap();
        (outcome, transcript)
    }

    fn completed(outcome: &RunOutcome) -> &ValidationResult {
        match outcome {
            RunOutcome::Completed(result) => result,
            RunOutcome::NothingFound => panic!("expected a completed run"),
        }
    }

    #[test]
    fn all_clean_units_pass() {
        let index = FixedIndex(vec!["a.wgsl", "b.wgsl", "c.wgsl"]);
        let (outcome, transcript) = validate(&index, &ScriptedCompiler::default());

        let result = completed(&outcome);
        assert_eq!((result.passed(), result.failed(), result.total()), (3, 0, 3));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            transcript.text(),
            [
                "=== Shader Validation Started ===",
                "Found 3 shader(s) to validate.",
                "PASS: a.wgsl",
                "PASS: b.wgsl",
                "PASS: c.wgsl",
                "=== Shader Validation Summary ===",
                "  Passed: 3",
                "  Failed: 0",
                "  Total:  3",
                "=== All Shaders Passed ===",
            ]
        );
        assert!(transcript.errors().is_empty());
    }

    #[test]
    fn error_fails_only_its_unit() {
        let index = FixedIndex(vec!["A", "B"]);
        let compiler = ScriptedCompiler::default().with(
            "A",
            CheckOutcome::Checked(vec![Diagnostic::error("unexpected token", "webgpu")]),
        );
        let (outcome, transcript) = validate(&index, &compiler);

        let result = completed(&outcome);
        assert_eq!((result.passed(), result.failed(), result.total()), (1, 1, 2));
        assert_eq!(result.failed_units(), ["A"]);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(
            transcript.text(),
            [
                "=== Shader Validation Started ===",
                "Found 2 shader(s) to validate.",
                "  ERROR in A: unexpected token (platform: webgpu)",
                "FAIL: A",
                "PASS: B",
                "=== Shader Validation Summary ===",
                "  Passed: 1",
                "  Failed: 1",
                "  Total:  2",
                "Failed shaders:",
                "  - A",
                "=== Shader Validation FAILED ===",
            ]
        );
    }

    #[test]
    fn warning_alone_fails_the_unit() {
        let index = FixedIndex(vec!["only.wgsl"]);
        let compiler = ScriptedCompiler::default().with(
            "only.wgsl",
            CheckOutcome::Checked(vec![Diagnostic::warning("implicit truncation", "native")]),
        );
        let (outcome, transcript) = validate(&index, &compiler);

        let result = completed(&outcome);
        assert_eq!((result.passed(), result.failed()), (0, 1));
        assert_eq!(outcome.exit_code(), 1);
        assert!(transcript.errors().contains(
            &"  WARNING (treated as error) in only.wgsl: implicit truncation (platform: native)"
        ));
        assert!(transcript.errors().contains(&"FAIL: only.wgsl"));
        assert!(!transcript.text().contains(&"PASS: only.wgsl"));
    }

    #[test]
    fn empty_discovery_is_fatal() {
        let (outcome, transcript) = validate(&FixedIndex(vec![]), &ScriptedCompiler::default());

        assert_eq!(outcome, RunOutcome::NothingFound);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(
            transcript.lines,
            [
                (Stream::Info, "=== Shader Validation Started ===".to_owned()),
                (
                    Stream::Error,
                    "No shaders found in Assets/Shaders. Check that shader files are present."
                        .to_owned()
                ),
            ]
        );
    }

    #[test]
    fn unloadable_unit_counts_as_failure() {
        let index = FixedIndex(vec!["ok.wgsl", "missing.wgsl"]);
        let compiler = ScriptedCompiler::default().with(
            "missing.wgsl",
            CheckOutcome::Unresolvable {
                reason: "No such file or directory".to_owned(),
            },
        );
        let (outcome, transcript) = validate(&index, &compiler);

        let result = completed(&outcome);
        assert_eq!((result.passed(), result.failed(), result.total()), (1, 1, 2));
        assert_eq!(result.failed_units(), ["missing.wgsl"]);
        assert_eq!(outcome.exit_code(), 1);
        assert!(transcript
            .errors()
            .contains(&"FAIL: Could not load shader at missing.wgsl"));
        // the load failure is the only line for that unit
        assert!(!transcript.text().contains(&"FAIL: missing.wgsl"));
    }

    #[test]
    fn failed_list_keeps_discovery_order() {
        let index = FixedIndex(vec!["zeta", "alpha", "mid", "beta"]);
        let failing = || CheckOutcome::Checked(vec![Diagnostic::error("boom", "all")]);
        let compiler = ScriptedCompiler::default()
            .with("zeta", failing())
            .with("beta", failing())
            .with("alpha", CheckOutcome::Unresolvable { reason: String::new() });
        let (outcome, transcript) = validate(&index, &compiler);

        assert_eq!(completed(&outcome).failed_units(), ["zeta", "alpha", "beta"]);

        let listed: Vec<_> = transcript
            .text()
            .into_iter()
            .filter(|line| line.starts_with("  - "))
            .collect();
        assert_eq!(listed, ["  - zeta", "  - alpha", "  - beta"]);
    }

    #[test]
    fn every_diagnostic_gets_a_line() {
        let index = FixedIndex(vec!["multi.wgsl"]);
        let compiler = ScriptedCompiler::default().with(
            "multi.wgsl",
            CheckOutcome::Checked(vec![
                Diagnostic::error("bad binding", "webgpu"),
                Diagnostic::error("bad binding", "native"),
                Diagnostic::warning("no entry points", "all"),
            ]),
        );
        let (_, transcript) = validate(&index, &compiler);

        let diagnostic_lines = transcript
            .errors()
            .into_iter()
            .filter(|line| line.contains(" in multi.wgsl: "))
            .count();
        assert_eq!(diagnostic_lines, 3);
    }

    #[test]
    fn totals_add_up_and_exit_code_follows_failures() {
        let names = ["u0", "u1", "u2", "u3", "u4", "u5", "u6", "u7"];

        // every subset of failing units over the first three names
        for mask in 0u8..8 {
            let mut compiler = ScriptedCompiler::default();
            for (bit, name) in names.iter().take(3).enumerate() {
                if mask & (1 << bit) != 0 {
                    compiler = compiler.with(
                        *name,
                        CheckOutcome::Checked(vec![Diagnostic::warning("w", "all")]),
                    );
                }
            }

            let (outcome, _) = validate(&FixedIndex(names.to_vec()), &compiler);
            let result = completed(&outcome);

            assert_eq!(result.passed() + result.failed(), result.total());
            assert_eq!(result.total(), names.len());
            assert_eq!(result.failed(), mask.count_ones() as usize);
            assert_eq!(outcome.exit_code() == 0, result.failed() == 0);
        }
    }

    #[test]
    fn discovery_errors_propagate() {
        let mut transcript = Transcript::default();
        let result = run(&BrokenIndex, &ScriptedCompiler::default(), &roots(), &mut transcript);

        assert!(result.is_err());
        assert_eq!(transcript.text(), ["=== Shader Validation Started ==="]);
    }
}
