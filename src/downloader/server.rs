//! REST API spawning.

use std::sync::Arc;

use crate::error::Result;

use super::TaskManager;

impl TaskManager {
    /// Spawn the REST API server in a background task
    ///
    /// The server listens on `server.bind_address` and stops accepting
    /// connections once shutdown begins.
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let manager = Arc::new(self.clone());
        let config = self.get_config();
        let shutdown = self.shutdown_token();

        tokio::spawn(async move {
            crate::api::start_api_server(manager, config, shutdown.cancelled_owned()).await
        })
    }
}
