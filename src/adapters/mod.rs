pub mod chat_completion_http;
pub mod process_executor;
mod process_runner;
pub mod python_chart_renderer;
pub mod stdio_generator;

pub use chat_completion_http::ChatCompletionClient;
pub use process_executor::{ProcessCodeExecutor, Toolchain};
pub use python_chart_renderer::PythonChartRenderer;
pub use stdio_generator::StdioGenerator;
