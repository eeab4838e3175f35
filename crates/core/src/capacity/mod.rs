pub mod capacity_estimator;
pub mod occupancy;
