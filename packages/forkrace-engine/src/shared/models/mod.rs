pub mod access;
pub mod call_stack;
pub mod ids;
pub mod source;

pub use access::*;
pub use call_stack::*;
pub use ids::*;
pub use source::*;
