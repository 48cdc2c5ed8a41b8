use tracing::{debug, info, warn};

use super::ContentBlock;
use super::markdown::{self, Fence};
use crate::domain::AppError;
use crate::domain::document::normalize_rows;
use crate::ports::{ChartRenderer, CodeExecutor};

/// Description terms that ask for code to be run and its output reported.
pub const DEFAULT_EXECUTION_KEYWORDS: &[&str] =
    &["代码", "程序", "实现", "code", "program", "implement"];

/// Width in inches given to rendered charts.
pub const DEFAULT_IMAGE_WIDTH: f64 = 5.0;

const EXECUTION_SUCCEEDED: &str = "程序执行结果";
const EXECUTION_FAILED: &str = "程序执行失败";

/// Converts raw model output into ordered content blocks, routing code
/// through the execution and chart collaborators.
pub struct ContentParser<'a> {
    executor: &'a dyn CodeExecutor,
    charts: &'a dyn ChartRenderer,
    keywords: Vec<String>,
    image_width: f64,
}

impl<'a> ContentParser<'a> {
    pub fn new(executor: &'a dyn CodeExecutor, charts: &'a dyn ChartRenderer) -> Self {
        Self {
            executor,
            charts,
            keywords: DEFAULT_EXECUTION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            image_width: DEFAULT_IMAGE_WIDTH,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_image_width(mut self, width_inches: f64) -> Self {
        self.image_width = width_inches;
        self
    }

    /// Parse `response` generated for a point described by `description`.
    ///
    /// Empty or whitespace-only input yields no blocks.
    pub fn parse(&self, response: &str, description: &str) -> Vec<ContentBlock> {
        if response.trim().is_empty() {
            return Vec::new();
        }

        let (text, fences) = markdown::extract_fences(response);
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut blocks = Vec::new();
        let mut paragraph: Vec<String> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];

            if let Some(index) = markdown::placeholder_index(line) {
                flush_paragraph(&mut paragraph, &mut blocks);
                if let Some(fence) = fences.get(index) {
                    blocks.extend(self.code_blocks(fence, description));
                }
                i += 1;
                continue;
            }

            if markdown::is_table_row(line)
                && lines.get(i + 1).is_some_and(|next| markdown::is_separator_row(next))
            {
                flush_paragraph(&mut paragraph, &mut blocks);
                let headers = markdown::split_row(line);
                i += 2;
                let mut rows = Vec::new();
                while i < lines.len() && markdown::is_table_row(lines[i]) {
                    rows.push(markdown::split_row(lines[i]));
                    i += 1;
                }
                let rows = normalize_rows(&rows, headers.len());
                blocks.push(ContentBlock::Table { headers: Some(headers), rows });
                continue;
            }

            if line.is_empty() {
                flush_paragraph(&mut paragraph, &mut blocks);
            } else if let Some(heading) = markdown::heading_text(line) {
                flush_paragraph(&mut paragraph, &mut blocks);
                let heading = markdown::strip_emphasis(heading);
                if !heading.is_empty() {
                    blocks.push(ContentBlock::text(heading));
                }
            } else {
                paragraph.push(markdown::strip_emphasis(line));
            }
            i += 1;
        }
        flush_paragraph(&mut paragraph, &mut blocks);

        blocks
    }

    fn code_blocks(&self, fence: &Fence, description: &str) -> Vec<ContentBlock> {
        let code = ContentBlock::code(&fence.language, &fence.body);

        if is_plotting_code(&fence.language, &fence.body) {
            return match self.charts.render(&fence.body) {
                Some(path) => {
                    info!(path = %path.display(), "rendered chart");
                    vec![ContentBlock::Image { path, width_hint: self.image_width }, code]
                }
                None => {
                    let err = AppError::Render("no image produced".into());
                    warn!(error = %err, "keeping the code only");
                    vec![code]
                }
            };
        }

        let mut blocks = vec![code];
        if self.needs_execution(description) {
            let capability = self.executor.can_execute(&fence.language);
            if capability.available {
                info!(language = %fence.language, "executing generated code");
                let outcome = self.executor.execute(&fence.language, &fence.body, None);
                if !outcome.success {
                    warn!(error = %AppError::Execution(outcome.output.clone()), "generated code failed");
                }
                let label = if outcome.success { EXECUTION_SUCCEEDED } else { EXECUTION_FAILED };
                blocks.push(ContentBlock::text(format!("{label}：\n{}", outcome.output)));
            } else {
                debug!(language = %fence.language, reason = %capability.reason, "not executing");
            }
        }
        blocks
    }

    fn needs_execution(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        self.keywords.iter().any(|keyword| description.contains(&keyword.to_lowercase()))
    }
}

/// Python code that draws with matplotlib.
pub fn is_plotting_code(language: &str, body: &str) -> bool {
    matches!(language, "python" | "py" | "python3")
        && (body.contains("plt.") || body.contains("matplotlib"))
}

fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<ContentBlock>) {
    if !paragraph.is_empty() {
        blocks.push(ContentBlock::text(paragraph.join(" ")));
        paragraph.clear();
    }
}
