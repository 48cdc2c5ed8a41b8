//! Renders matplotlib code to PNG with a headless Python interpreter.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use super::process_runner::{RunFailure, find_on_path, run_captured};
use crate::domain::configuration::ChartConfig;
use crate::ports::ChartRenderer;

#[derive(Debug)]
pub struct PythonChartRenderer {
    config: ChartConfig,
    workspace: PathBuf,
    timeout: Duration,
    python: Option<PathBuf>,
    charts: AtomicUsize,
}

impl PythonChartRenderer {
    pub fn new(config: ChartConfig, workspace: impl Into<PathBuf>, timeout: Duration) -> Self {
        let python = find_on_path("python3").or_else(|| find_on_path("python"));
        Self::with_interpreter(config, workspace, timeout, python)
    }

    pub fn with_interpreter(
        config: ChartConfig,
        workspace: impl Into<PathBuf>,
        timeout: Duration,
        python: Option<PathBuf>,
    ) -> Self {
        Self { config, workspace: workspace.into(), timeout, python, charts: AtomicUsize::new(0) }
    }

    fn next_chart(&self) -> usize {
        self.charts.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Wrap `source` with a headless backend, the configured fonts and a
/// trailing `savefig` when the code never saves the figure itself.
pub fn chart_script(config: &ChartConfig, output_path: &Path, source: &str) -> String {
    let fonts = serde_json::to_string(&config.fonts).unwrap_or_else(|_| "[]".to_string());
    let output = serde_json::to_string(&output_path.to_string_lossy())
        .unwrap_or_else(|_| "\"chart.png\"".to_string());

    let mut script = format!(
        "import matplotlib\n\
         matplotlib.use('Agg')\n\
         import matplotlib.pyplot as plt\n\
         import numpy as np\n\
         plt.rcParams['font.sans-serif'] = {fonts}\n\
         plt.rcParams['axes.unicode_minus'] = False\n\
         output_path = {output}\n\n\
         {source}\n"
    );
    if !source.contains("savefig") {
        script.push_str(&format!(
            "\nplt.savefig(output_path, dpi={}, bbox_inches='tight')\n",
            config.dpi
        ));
    }
    script
}

impl ChartRenderer for PythonChartRenderer {
    fn render(&self, source: &str) -> Option<PathBuf> {
        if !self.config.enabled {
            return None;
        }
        let Some(python) = &self.python else {
            warn!("python interpreter not found; chart skipped");
            return None;
        };

        if let Err(err) = fs::create_dir_all(&self.workspace) {
            warn!(error = %err, "cannot create chart workspace");
            return None;
        }
        let workspace = fs::canonicalize(&self.workspace).unwrap_or_else(|_| self.workspace.clone());
        let n = self.next_chart();
        let script_path = workspace.join(format!("chart_{n}.py"));
        let png_path = workspace.join(format!("chart_{n}.png"));

        if let Err(err) = fs::write(&script_path, chart_script(&self.config, &png_path, source)) {
            warn!(error = %err, "cannot write chart script");
            return None;
        }

        let mut command = Command::new(python);
        command.arg(&script_path).current_dir(&workspace);
        match run_captured(&mut command, None, self.timeout) {
            Ok(captured) if captured.status.success() => {}
            Ok(captured) => {
                warn!(stderr = %captured.stderr.trim(), "chart script failed");
                return None;
            }
            Err(RunFailure::TimedOut) => {
                warn!(timeout_secs = self.timeout.as_secs(), "chart script timed out");
                return None;
            }
            Err(RunFailure::Spawn(err)) => {
                warn!(error = %err, "cannot start python");
                return None;
            }
        }

        if png_path.is_file() {
            debug!(path = %png_path.display(), "chart rendered");
            Some(png_path)
        } else {
            warn!("chart script finished without writing an image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChartConfig {
        ChartConfig {
            fonts: vec!["Noto Sans CJK SC".to_string(), "DejaVu Sans".to_string()],
            ..ChartConfig::default()
        }
    }

    #[test]
    fn script_carries_fonts_and_saves_once() {
        let script = chart_script(&config(), Path::new("/tmp/out/chart_1.png"), "plt.plot([1, 2])");

        assert!(script.starts_with("import matplotlib\nmatplotlib.use('Agg')\n"));
        assert!(script.contains(r#"plt.rcParams['font.sans-serif'] = ["Noto Sans CJK SC","DejaVu Sans"]"#));
        assert!(script.contains("plt.rcParams['axes.unicode_minus'] = False"));
        assert!(script.contains(r#"output_path = "/tmp/out/chart_1.png""#));
        assert!(script.contains("plt.plot([1, 2])\n"));
        assert!(script.ends_with("plt.savefig(output_path, dpi=150, bbox_inches='tight')\n"));
    }

    #[test]
    fn existing_savefig_is_left_alone() {
        let script = chart_script(&config(), Path::new("out.png"), "plt.savefig(output_path)");
        assert_eq!(script.matches("savefig").count(), 1);
    }

    #[test]
    fn quotes_in_paths_are_escaped() {
        let script = chart_script(&config(), Path::new("dir\"x/chart.png"), "plt.plot([1])");
        assert!(script.contains(r#"output_path = "dir\"x/chart.png""#));
    }

    #[test]
    fn disabled_or_missing_interpreter_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let disabled = PythonChartRenderer::with_interpreter(
            ChartConfig { enabled: false, ..config() },
            dir.path(),
            Duration::from_secs(5),
            Some(PathBuf::from("python3")),
        );
        assert_eq!(disabled.render("plt.plot([1])"), None);

        let missing =
            PythonChartRenderer::with_interpreter(config(), dir.path(), Duration::from_secs(5), None);
        assert_eq!(missing.render("plt.plot([1])"), None);
    }

    #[test]
    fn failing_script_renders_nothing() {
        let Some(python) = find_on_path("python3").or_else(|| find_on_path("python")) else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let renderer =
            PythonChartRenderer::with_interpreter(config(), dir.path(), Duration::from_secs(10), Some(python));
        assert_eq!(renderer.render("raise SystemExit(2)"), None);
    }
}
