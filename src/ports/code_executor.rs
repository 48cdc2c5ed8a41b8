//! Code-execution port definition.

/// Whether a language can be run, and why not when it cannot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub available: bool,
    pub reason: String,
}

impl Capability {
    pub fn available(reason: impl Into<String>) -> Self {
        Self { available: true, reason: reason.into() }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { available: false, reason: reason.into() }
    }
}

/// Result of one compile-and-run cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub success: bool,
    /// Combined stdout/stderr text, or the failure reason.
    pub output: String,
}

impl ExecutionOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self { success: true, output: output.into() }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self { success: false, output: output.into() }
    }
}

/// Port for sandboxed, time-bounded code execution.
pub trait CodeExecutor {
    fn can_execute(&self, language: &str) -> Capability;

    /// Run `source`, feeding `input` to stdin when given.
    fn execute(&self, language: &str, source: &str, input: Option<&str>) -> ExecutionOutcome;

    /// Languages whose toolchains are present, for prompt hints.
    fn available_languages(&self) -> Vec<String>;
}

/// Executor that never runs anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCodeExecutor;

impl CodeExecutor for DisabledCodeExecutor {
    fn can_execute(&self, _language: &str) -> Capability {
        Capability::unavailable("code execution is disabled")
    }

    fn execute(&self, _language: &str, _source: &str, _input: Option<&str>) -> ExecutionOutcome {
        ExecutionOutcome::failure("code execution is disabled")
    }

    fn available_languages(&self) -> Vec<String> {
        Vec::new()
    }
}
