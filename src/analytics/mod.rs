pub mod insights;
pub mod stats;
