pub mod basket;
pub mod signal;
