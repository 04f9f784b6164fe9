pub mod driver;

pub use driver::{DeviceProfile, WebSession};
