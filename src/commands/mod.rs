pub mod check;
pub mod params;
pub mod stage;
