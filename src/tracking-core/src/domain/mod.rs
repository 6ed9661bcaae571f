mod bounds;
mod fetch;
mod position;
mod vessel;

pub use bounds::*;
pub use fetch::*;
pub use position::*;
pub use vessel::*;
