// Application state for HTTP handlers
use crate::presentation::page::GraphPage;

pub struct AppState {
    pub page: GraphPage,
}
