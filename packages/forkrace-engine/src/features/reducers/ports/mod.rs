//! Reducer capability ports
//!
//! The engine never touches the instrumented program's memory itself. View
//! storage and the identity/reduce operations are supplied by the embedder.

use crate::shared::models::Address;

/// Identity and reduce operations of one accumulator type
pub trait ReducerOps: Send + Sync {
    /// Initialize the view at `view` to the identity element
    fn identity(&self, view: Address, size: usize);

    /// Fold `right` into `left`; `left` precedes `right` in program order
    fn reduce(&self, left: Address, right: Address, size: usize);
}

/// Storage for private views
pub trait ViewAllocator: Send {
    /// Allocate `size` bytes, or `None` if out of memory
    fn allocate(&mut self, size: usize) -> Option<Address>;

    /// Release a view previously returned by `allocate`
    fn release(&mut self, addr: Address, size: usize);
}
