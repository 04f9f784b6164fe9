pub mod config;
pub mod interrupt;
pub mod poll;
pub mod time;

pub use config::HarnessConfig;
pub use interrupt::Interrupt;
