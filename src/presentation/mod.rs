pub mod aria;
pub mod component;
pub mod keyboard;
pub mod runtime;
pub mod wasm_api;

pub use component::TimelineViewport;
pub use keyboard::KeyCommand;
pub use runtime::TimelineRuntime;
pub use wasm_api::TimelineHandle;
