//! Page objects of the storefront
//!
//! Each page object borrows a [`Toolkit`] for waits, report logging and
//! screenshots; none of them touch the browser outside of it.

pub mod cart;
pub mod home;
pub mod search_results;
pub mod toolkit;

pub use cart::CartPage;
pub use home::HomePage;
pub use search_results::SearchResultsPage;
pub use toolkit::Toolkit;

use std::time::Duration;

/// Default budget for an element a page action needs
pub const ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);
