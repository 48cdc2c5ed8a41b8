mod chart_renderer;
mod code_executor;
mod text_generator;

pub use chart_renderer::{ChartRenderer, DisabledChartRenderer};
pub use code_executor::{Capability, CodeExecutor, DisabledCodeExecutor, ExecutionOutcome};
pub use text_generator::TextGenerator;
