use galang_core::Platform;
use std::sync::Arc;

use crate::config::Config;

pub struct AppState {
    pub platform: Platform,
    pub config: Config,
}

impl AppState {
    pub fn new(platform: Platform, config: Config) -> Arc<Self> {
        Arc::new(Self { platform, config })
    }
}
