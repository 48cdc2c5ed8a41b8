pub mod docx_fixture;
mod fake_collaborators;

#[allow(unused_imports)]
pub use fake_collaborators::ExecutionCall;
#[allow(unused_imports)]
pub use fake_collaborators::FixedChartRenderer;
#[allow(unused_imports)]
pub use fake_collaborators::RecordingExecutor;
#[allow(unused_imports)]
pub use fake_collaborators::ScriptedGenerator;
