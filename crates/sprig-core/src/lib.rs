pub mod env;
pub mod error;
pub mod heap;
pub mod printer;
pub mod value;

pub use error::{Span, SprigError};
pub use heap::{Heap, ObjId};
pub use value::{intern, resolve, truthiness, with_resolved, NativeDef, Object, Spur};
