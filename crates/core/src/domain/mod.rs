pub mod disclosure;
pub mod features;
pub mod ranking;
