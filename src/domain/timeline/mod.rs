//! Timeline aggregate: buckets, bounds and every pure viewport transition.

pub mod calendar;
pub mod entities;
pub mod gesture;
pub mod minimap;
pub mod value_objects;
pub mod viewport;
pub mod zoom;

pub use calendar::*;
pub use entities::*;
pub use gesture::*;
pub use minimap::*;
pub use value_objects::*;
pub use viewport::ViewportLimits;
pub use zoom::ZoomDirection;
