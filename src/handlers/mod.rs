pub mod predict;

pub use predict::{ApiError, PredictHandler};
