// Application layer - Grapher widget and the collaborators it drives
pub mod data_endpoint;
pub mod grapher;
pub mod plot_renderer;

#[cfg(test)]
pub mod testing;
