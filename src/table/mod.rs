pub mod builder;
pub mod frame;
pub mod value;

pub use builder::*;
pub use frame::*;
pub use value::*;
