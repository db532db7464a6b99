pub mod agents;
pub mod doctor;
pub mod generate;
pub mod serve;
pub mod styles;
