pub mod analysis;
pub mod charts;
pub mod loader;
pub mod report;
