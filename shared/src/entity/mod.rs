pub mod robots;
pub mod trades;
