//! Fixture loading for the `tests/programs/<case>/` directories.
//!
//! Each case holds a `program.tc` source and a `case.yaml` manifest saying how
//! the program should end: final globals on stdout, or an error on stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    /// Runs to `HALT`; stdout holds the non-zero globals.
    RuntimeSuccess,
    /// Rejected by the lexer or parser before any backend runs.
    FrontendError,
    /// Parses, then fails during code generation or execution.
    BackendRuntimeError,
}

impl CaseClass {
    pub fn fails(self) -> bool {
        self != CaseClass::RuntimeSuccess
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExpectedOutcome {
    /// Exit status of the `tinyc` binary.
    pub exit_code: i32,
    pub stdout_file: Option<String>,
    pub stderr_contains_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseManifest {
    pub class: CaseClass,
    /// Every supported backend must leave identical globals.
    pub parity: bool,
    #[serde(default)]
    pub unsupported_backends: Vec<String>,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub manifest: CaseManifest,
}

impl Case {
    pub fn class(&self) -> CaseClass {
        self.manifest.class
    }

    pub fn exit_code(&self) -> i32 {
        self.manifest.expected.exit_code
    }

    pub fn supports(&self, backend: &str) -> bool {
        !self
            .manifest
            .unsupported_backends
            .iter()
            .any(|name| name == backend)
    }

    /// First backend from `known` that this case runs on.
    pub fn first_supported<'a>(&self, known: &[&'a str]) -> Option<&'a str> {
        known.iter().copied().find(|backend| self.supports(backend))
    }

    pub fn source(&self) -> Result<String> {
        fs::read_to_string(&self.program_path)
            .with_context(|| format!("Reading program for {}", self.name))
    }

    /// Expected globals listing, normalized.
    pub fn expected_stdout(&self) -> Result<String> {
        let file = self
            .manifest
            .expected
            .stdout_file
            .as_deref()
            .with_context(|| format!("Missing stdout_file in {}", self.name))?;
        Ok(normalize_output(&self.read_text(file)?))
    }

    /// Text the error message must contain.
    pub fn expected_error(&self) -> Result<String> {
        let file = self
            .manifest
            .expected
            .stderr_contains_file
            .as_deref()
            .with_context(|| format!("Missing stderr_contains_file in {}", self.name))?;
        Ok(self.read_text(file)?.trim().to_string())
    }

    /// Rejects manifests naming unknown backends and exit codes that
    /// contradict the class.
    pub fn validate(&self, known_backends: &[&str]) -> Result<()> {
        for backend in &self.manifest.unsupported_backends {
            ensure!(
                known_backends.contains(&backend.as_str()),
                "Case {} lists unknown backend '{backend}'",
                self.name
            );
        }
        let expected_code = if self.class().fails() { 1 } else { 0 };
        ensure!(
            self.exit_code() == expected_code,
            "Case {} expects exit code {} but its class implies {expected_code}",
            self.name,
            self.exit_code()
        );
        Ok(())
    }

    fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {relative_path}", self.name))
    }
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let dir = entry?.path();
        let manifest_path = dir.join("case.yaml");
        if !dir.is_dir() || !manifest_path.exists() {
            continue;
        }

        let program_path = dir.join("program.tc");
        ensure!(
            program_path.exists(),
            "Missing program.tc for case {}",
            dir.display()
        );

        let name = dir
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", dir.display()))?;
        let raw = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Reading {}", manifest_path.display()))?;
        let manifest: CaseManifest = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing {}", manifest_path.display()))?;

        cases.push(Case {
            name,
            dir,
            program_path,
            manifest,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}
