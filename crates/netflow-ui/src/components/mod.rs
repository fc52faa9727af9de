pub mod date_range;
pub mod header;
pub mod slider;
