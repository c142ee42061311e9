pub mod bag_forest;

pub use bag_forest::BagForest;
