pub mod traits;
pub mod web;

#[cfg(test)]
pub mod fake;

pub use traits::{BrowserSession, DriverError, ElementRef, Locator, Transient};
