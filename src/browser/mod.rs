//! Browser driver layer: the fallible primitives the pipeline drives.

pub mod chrome;
pub mod config;
pub mod driver;

pub use chrome::ChromeDriver;
pub use config::LaunchOptions;
pub use driver::BrowserDriver;
