pub mod startup;
pub mod status;
pub mod task;
pub mod workflow;
