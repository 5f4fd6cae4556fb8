mod map;
mod value;
mod vec;

pub use map::{StateMap, StateMapError};
pub use value::{StateValue, StateValueError};
pub use vec::{StateVec, StateVecError};
