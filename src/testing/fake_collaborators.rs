use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::ports::{Capability, ChartRenderer, CodeExecutor, ExecutionOutcome, TextGenerator};

/// Generator that replays canned responses in order, then returns `""`.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())),
            prompts: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionCall {
    pub language: String,
    pub source: String,
}

/// Executor that supports a fixed set of languages and returns a fixed outcome.
#[derive(Clone)]
pub struct RecordingExecutor {
    languages: Vec<String>,
    outcome: ExecutionOutcome,
    pub calls: Arc<Mutex<Vec<ExecutionCall>>>,
}

impl RecordingExecutor {
    pub fn new(languages: &[&str], outcome: ExecutionOutcome) -> Self {
        Self {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            outcome,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn get_calls(&self) -> Vec<ExecutionCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CodeExecutor for RecordingExecutor {
    fn can_execute(&self, language: &str) -> Capability {
        if self.languages.iter().any(|l| l == language) {
            Capability::available(format!("{language} ready"))
        } else {
            Capability::unavailable(format!("{language} not supported"))
        }
    }

    fn execute(&self, language: &str, source: &str, _input: Option<&str>) -> ExecutionOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(ExecutionCall { language: language.to_string(), source: source.to_string() });
        self.outcome.clone()
    }

    fn available_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

/// Renderer that always answers with the same path (or nothing).
#[derive(Clone, Default)]
pub struct FixedChartRenderer {
    path: Option<PathBuf>,
    pub sources: Arc<Mutex<Vec<String>>>,
}

impl FixedChartRenderer {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, sources: Arc::new(Mutex::new(vec![])) }
    }

    pub fn get_sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

impl ChartRenderer for FixedChartRenderer {
    fn render(&self, source: &str) -> Option<PathBuf> {
        self.sources.lock().unwrap().push(source.to_string());
        self.path.clone()
    }
}
