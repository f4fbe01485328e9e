pub mod closure;

pub use closure::{ClosureWalker, MissingTarget, Step, WalkScope};
