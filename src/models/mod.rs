pub mod chart;
pub mod style;
