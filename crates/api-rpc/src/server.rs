//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP on localhost.

use crate::handler::RpcHandler;
use crate::types::{ClearRequest, EnqueueRequest, NotificationsRequest, UpdateSettingRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use sendq_core::application::QueueService;
use sendq_core::port::NotificationFeed;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9531;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        service: Arc<QueueService>,
        feed: Arc<dyn NotificationFeed>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service, feed)),
        }
    }

    /// Start the JSON-RPC server. Returns the bound address (useful with port 0).
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.build_module()?;

        info!(addr = %local_addr, "JSON-RPC server listening");
        Ok((local_addr, server.start(module)))
    }

    fn build_module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("queue.snapshot.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.snapshot().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.enqueue.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: EnqueueRequest = params.one()?;
                    handler.enqueue(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.submit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: EnqueueRequest = params.one()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.pause.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { Ok::<_, ErrorObjectOwned>(handler.toggle_pause()) }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.clear.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ClearRequest = params.one()?;
                    handler.clear(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("settings.get.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { Ok::<_, ErrorObjectOwned>(handler.settings().await) }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("settings.update.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: UpdateSettingRequest = params.one()?;
                    handler.update_setting(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("notifications.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<NotificationsRequest> = params.sequence().optional_next()?;
                    Ok::<_, ErrorObjectOwned>(handler.notifications(req.unwrap_or_default()))
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { Ok::<_, ErrorObjectOwned>(handler.stats().await) }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }
}
