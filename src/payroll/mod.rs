pub mod outcome;
pub mod processor;
pub mod store;
pub mod types;

pub use outcome::*;
pub use processor::*;
pub use store::*;
pub use types::*;
