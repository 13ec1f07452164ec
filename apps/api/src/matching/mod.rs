pub mod batch;
pub mod handlers;
pub mod history;
pub mod models;
pub mod normalize;
pub mod throttle;
