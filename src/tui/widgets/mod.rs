pub mod practice;
pub mod quick_learn;
