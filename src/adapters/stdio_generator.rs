//! Interactive generator: shows each prompt and reads the answer from a stream.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

use crate::ports::TextGenerator;

/// Line that terminates a typed answer.
pub const END_MARKER: &str = "===END===";

/// Prints prompts to a writer and collects answers typed on a reader.
///
/// Used by `--test-mode` to fill documents without a model endpoint.
pub struct StdioGenerator {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl StdioGenerator {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input: Mutex::new(input), output: Mutex::new(output) }
    }

    /// Prompts on stderr, answers from stdin.
    pub fn stdio() -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), Box::new(io::stderr()))
    }

    fn show(&self, prompt: &str) -> io::Result<()> {
        let mut out = self.output.lock().map_err(|_| io::Error::other("output lock poisoned"))?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "{}", prompt)?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "Type the answer, then a line containing {} (or EOF):", END_MARKER)?;
        out.flush()
    }

    fn read_answer(&self) -> io::Result<String> {
        let mut input = self.input.lock().map_err(|_| io::Error::other("input lock poisoned"))?;
        let mut lines = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.trim() == END_MARKER {
                break;
            }
            lines.push(trimmed.to_string());
        }
        Ok(lines.join("\n"))
    }
}

impl TextGenerator for StdioGenerator {
    fn generate(&self, prompt: &str) -> String {
        let result = self.show(prompt).and_then(|()| self.read_answer());
        result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read answer");
            String::new()
        })
    }
}
