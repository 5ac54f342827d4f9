pub mod coach;
pub mod scoring;
pub mod talk;
