//! Local toolchain code execution.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use super::process_runner::{RunFailure, find_on_path, run_captured};
use crate::ports::{Capability, CodeExecutor, ExecutionOutcome};

static JAVA_PUBLIC_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"public\s+(?:final\s+|abstract\s+)*class\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("java class pattern is valid")
});

/// Languages this executor understands, after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    C,
    Cpp,
    Python,
    Java,
    JavaScript,
}

impl Language {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "c" => Some(Self::C),
            "cpp" | "c++" | "cc" | "cxx" => Some(Self::Cpp),
            "python" | "python3" | "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            "javascript" | "js" | "node" => Some(Self::JavaScript),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Java => "java",
            Self::JavaScript => "javascript",
        }
    }

    const ALL: [Language; 5] =
        [Self::C, Self::Cpp, Self::Python, Self::Java, Self::JavaScript];
}

/// Tool paths discovered on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    pub c_compiler: Option<PathBuf>,
    pub cpp_compiler: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub javac: Option<PathBuf>,
    pub java: Option<PathBuf>,
    pub node: Option<PathBuf>,
}

impl Toolchain {
    pub fn detect() -> Self {
        let first = |names: &[&str]| names.iter().find_map(|name| find_on_path(name));
        let toolchain = Self {
            c_compiler: first(&["gcc", "clang", "cc"]),
            cpp_compiler: first(&["g++", "clang++", "c++"]),
            python: first(&["python3", "python"]),
            javac: find_on_path("javac"),
            java: find_on_path("java"),
            node: find_on_path("node"),
        };
        debug!(?toolchain, "detected toolchain");
        toolchain
    }

    fn supports(&self, language: Language) -> bool {
        match language {
            Language::C => self.c_compiler.is_some(),
            Language::Cpp => self.cpp_compiler.is_some(),
            Language::Python => self.python.is_some(),
            Language::Java => self.javac.is_some() && self.java.is_some(),
            Language::JavaScript => self.node.is_some(),
        }
    }
}

/// Writes sources into a workspace directory, compiles them when needed and
/// runs them under a wall-clock limit.
#[derive(Debug)]
pub struct ProcessCodeExecutor {
    workspace: PathBuf,
    timeout: Duration,
    toolchain: Toolchain,
    runs: AtomicUsize,
}

impl ProcessCodeExecutor {
    pub fn new(workspace: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_toolchain(workspace, timeout, Toolchain::detect())
    }

    pub fn with_toolchain(
        workspace: impl Into<PathBuf>,
        timeout: Duration,
        toolchain: Toolchain,
    ) -> Self {
        Self { workspace: workspace.into(), timeout, toolchain, runs: AtomicUsize::new(0) }
    }

    fn run_dir(&self) -> std::io::Result<PathBuf> {
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let dir = self.workspace.join(format!("run_{n}"));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn limit_secs(&self) -> u64 {
        self.timeout.as_secs().max(1)
    }

    fn compile(&self, compiler: &Path, source: &Path, binary: &Path, dir: &Path) -> Result<(), String> {
        let mut command = Command::new(compiler);
        command.arg(source).arg("-o").arg(binary).current_dir(dir);
        self.compile_with(&mut command)
    }

    fn compile_with(&self, command: &mut Command) -> Result<(), String> {
        match run_captured(command, None, self.timeout) {
            Ok(captured) if captured.status.success() => Ok(()),
            Ok(captured) => Err(format!("Compilation failed:\n{}", captured.stderr)),
            Err(RunFailure::TimedOut) => {
                Err(format!("Compilation timed out ({}s limit)", self.limit_secs()))
            }
            Err(RunFailure::Spawn(err)) => Err(format!("Compilation failed:\n{}", err)),
        }
    }

    fn run(&self, command: &mut Command, input: Option<&str>) -> ExecutionOutcome {
        match run_captured(command, input, self.timeout) {
            Ok(captured) => ExecutionOutcome {
                success: captured.status.success(),
                output: captured.combined(),
            },
            Err(RunFailure::TimedOut) => ExecutionOutcome::failure(format!(
                "Execution timed out ({}s limit)",
                self.limit_secs()
            )),
            Err(RunFailure::Spawn(err)) => {
                ExecutionOutcome::failure(format!("Failed to start program: {}", err))
            }
        }
    }

    fn execute_language(
        &self,
        language: Language,
        source: &str,
        input: Option<&str>,
        dir: &Path,
    ) -> Result<ExecutionOutcome, String> {
        let write = |name: &str| -> Result<PathBuf, String> {
            let path = dir.join(name);
            fs::write(&path, source).map_err(|e| format!("Failed to write source: {}", e))?;
            Ok(path)
        };
        let tool = |tool: &Option<PathBuf>| {
            tool.clone().ok_or_else(|| format!("{} toolchain not found", language.label()))
        };

        match language {
            Language::C | Language::Cpp => {
                let (file, compiler) = if language == Language::C {
                    ("code.c", tool(&self.toolchain.c_compiler)?)
                } else {
                    ("code.cpp", tool(&self.toolchain.cpp_compiler)?)
                };
                let src = write(file)?;
                let binary = dir.join(if cfg!(windows) { "program.exe" } else { "program" });
                self.compile(&compiler, &src, &binary, dir)?;
                let mut command = Command::new(&binary);
                command.current_dir(dir);
                let outcome = self.run(&mut command, input);
                Ok(compiled(outcome))
            }
            Language::Java => {
                let class = java_class_name(source);
                let src = write(&format!("{class}.java"))?;
                let mut javac = Command::new(tool(&self.toolchain.javac)?);
                javac.arg(&src).current_dir(dir);
                self.compile_with(&mut javac)?;
                let mut command = Command::new(tool(&self.toolchain.java)?);
                command.arg("-cp").arg(dir).arg(&class).current_dir(dir);
                Ok(compiled(self.run(&mut command, input)))
            }
            Language::Python => {
                let src = write("code.py")?;
                let mut command = Command::new(tool(&self.toolchain.python)?);
                command.arg(&src).current_dir(dir);
                Ok(self.run(&mut command, input))
            }
            Language::JavaScript => {
                let src = write("code.js")?;
                let mut command = Command::new(tool(&self.toolchain.node)?);
                command.arg(&src).current_dir(dir);
                Ok(self.run(&mut command, input))
            }
        }
    }
}

fn compiled(outcome: ExecutionOutcome) -> ExecutionOutcome {
    if outcome.success {
        ExecutionOutcome::success(format!(
            "Compilation successful.\n\nExecution output:\n{}",
            outcome.output
        ))
    } else {
        outcome
    }
}

fn java_class_name(source: &str) -> String {
    JAVA_PUBLIC_CLASS
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "Main".to_string(), |m| m.as_str().to_string())
}

impl CodeExecutor for ProcessCodeExecutor {
    fn can_execute(&self, language: &str) -> Capability {
        match Language::parse(language) {
            None => Capability::unavailable(format!("unsupported language: {}", language)),
            Some(lang) if self.toolchain.supports(lang) => {
                Capability::available(format!("{} toolchain found", lang.label()))
            }
            Some(lang) => {
                Capability::unavailable(format!("{} toolchain not found", lang.label()))
            }
        }
    }

    fn execute(&self, language: &str, source: &str, input: Option<&str>) -> ExecutionOutcome {
        let capability = self.can_execute(language);
        let Some(lang) = Language::parse(language).filter(|_| capability.available) else {
            return ExecutionOutcome::failure(capability.reason);
        };

        let dir = match self.run_dir() {
            Ok(dir) => dir,
            Err(err) => {
                warn!(error = %err, workspace = %self.workspace.display(), "cannot prepare workspace");
                return ExecutionOutcome::failure(format!("Failed to prepare workspace: {}", err));
            }
        };
        debug!(language = lang.label(), dir = %dir.display(), "executing generated code");

        self.execute_language(lang, source, input, &dir)
            .unwrap_or_else(ExecutionOutcome::failure)
    }

    fn available_languages(&self) -> Vec<String> {
        Language::ALL
            .into_iter()
            .filter(|lang| self.toolchain.supports(*lang))
            .map(|lang| lang.label().to_string())
            .collect()
    }
}
