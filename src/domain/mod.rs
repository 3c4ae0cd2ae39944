// Domain layer - Graph data, ranges and display settings
pub mod render_options;
pub mod series;
pub mod time_range;
pub mod units;
