use crate::ports::{ChartRenderer, CodeExecutor, TextGenerator};

/// Application context holding the collaborators a fill run talks to.
pub struct AppContext {
    generator: Box<dyn TextGenerator>,
    executor: Box<dyn CodeExecutor>,
    charts: Box<dyn ChartRenderer>,
}

impl AppContext {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        executor: Box<dyn CodeExecutor>,
        charts: Box<dyn ChartRenderer>,
    ) -> Self {
        Self { generator, executor, charts }
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    pub fn executor(&self) -> &dyn CodeExecutor {
        self.executor.as_ref()
    }

    pub fn charts(&self) -> &dyn ChartRenderer {
        self.charts.as_ref()
    }
}
