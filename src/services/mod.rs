pub mod export;
pub mod probe;
pub mod round;
pub mod scheduler;
