pub mod aircraft;
pub mod status;

pub use aircraft::*;
pub use status::*;
