pub mod capture;
pub mod context;
pub mod cucumber_adapter;
pub mod lifecycle;

pub use capture::ScenarioOutcome;
pub use context::RunContext;
pub use lifecycle::{Lifecycle, ScenarioInfo};
