use crate::engine::ResumeEngine;
use crate::input::manager::InputManager;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handler state. The engine is behind a mutex because generation
/// mutates model caches; requests are served one at a time, which also keeps
/// memory bounded on small machines.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<ResumeEngine>>,
    pub input: Arc<InputManager>,
}

impl AppState {
    pub fn new(engine: ResumeEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            input: Arc::new(InputManager::new()),
        }
    }
}
