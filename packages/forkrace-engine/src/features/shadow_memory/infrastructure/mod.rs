pub mod heap_map;
pub mod line_table;
pub mod shadow;

pub use heap_map::HeapMap;
pub use line_table::{LineTable, LINE_SIZE};
pub use shadow::ShadowMemory;
