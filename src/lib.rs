pub mod driver;
pub mod pages;
pub mod report;
pub mod runner;
pub mod utils;
pub mod wait;

// Re-export common items
pub use driver::{BrowserSession, Locator};
pub use report::generate_report;
pub use runner::{Lifecycle, RunContext};
pub use wait::WaitEngine;
