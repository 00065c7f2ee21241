use std::net::SocketAddr;
use std::sync::Arc;

use log::info;

use crate::storage::store::StoryStore;
use crate::web::routes::api;

/// Web server for the story board HTTP API
pub struct WebServer {
    store: Arc<dyn StoryStore>,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Start the web server on the given address
    pub async fn start(&self, addr: SocketAddr) {
        let routes = api(self.store.clone());
        info!("Serving stories on http://{}", addr);
        // Start server (warp 0.4)
        warp::serve(routes).run(addr).await;
    }
}
