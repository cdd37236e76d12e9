pub mod category;
pub mod frequency;
pub mod location;
pub mod observation_batch;
