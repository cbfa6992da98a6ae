pub mod drone;

pub use drone::DroneApproach;
