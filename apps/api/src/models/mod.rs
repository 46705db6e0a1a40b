pub mod gap;
pub mod plan;
pub mod profile;
pub mod rows;
pub mod wire;
