//! API request handlers

mod devices;
mod health;
mod pages;
mod system;

pub use devices::*;
pub use health::*;
pub use pages::*;
pub use system::*;
