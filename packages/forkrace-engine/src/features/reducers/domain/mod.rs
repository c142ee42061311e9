pub mod view_table;

pub use view_table::*;
