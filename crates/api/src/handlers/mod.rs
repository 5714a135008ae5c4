pub mod curriculum;
pub mod lifecycle;
pub mod stats;
