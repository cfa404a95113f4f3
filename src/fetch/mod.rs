pub mod cache;
pub mod client;
pub mod pages;
pub mod skip_log;

pub use cache::*;
pub use client::*;
pub use pages::*;
pub use skip_log::*;
