pub mod http;
pub mod services;

pub use http::RestTimelineSource;
pub use services::{BrowserTimeProvider, ConsoleLogger};
