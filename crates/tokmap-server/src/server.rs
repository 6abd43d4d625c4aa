use std::sync::Arc;

use tokio::net::TcpListener;
use tokmap_store::{
    BindingStore, IdentifierResolver, InMemoryBindingStore, JournalBindingStore, JournalOptions,
};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// tokmap HTTP server.
pub struct TokmapServer {
    config: ServerConfig,
    resolver: IdentifierResolver,
}

impl TokmapServer {
    /// Validate `config` and open the store it names.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let resolver = open_resolver(&config)?;
        Ok(Self { config, resolver })
    }

    /// Serve an externally constructed resolver.
    pub fn with_resolver(config: ServerConfig, resolver: IdentifierResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &IdentifierResolver {
        &self.resolver
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        build_router(self.resolver.clone(), &self.config)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            durable = self.config.journal_path.is_some(),
            "tokmap server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// Build the resolver described by `config`: journaled when a journal path
/// is set, in-memory otherwise.
pub fn open_resolver(config: &ServerConfig) -> ServerResult<IdentifierResolver> {
    let store: Arc<dyn BindingStore> = match &config.journal_path {
        Some(path) => Arc::new(JournalBindingStore::open_with(
            path,
            JournalOptions {
                sync_each_append: config.sync_journal,
            },
        )?),
        None => {
            tracing::warn!("no journal configured; bindings are lost on restart");
            Arc::new(InMemoryBindingStore::new())
        }
    };
    Ok(IdentifierResolver::new(store).with_max_mint_attempts(config.max_mint_attempts))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = TokmapServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert!(server.resolver().is_empty().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = TokmapServer::new(ServerConfig::default()).unwrap();
        assert!(server.router().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ServerConfig {
            max_mint_attempts: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(TokmapServer::new(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn journal_config_opens_durable_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            journal_path: Some(dir.path().join("bindings.jsonl")),
            ..ServerConfig::default()
        };

        let token = {
            let server = TokmapServer::new(config.clone()).unwrap();
            server.resolver().issue("series", "one-piece").unwrap().binding.token
        };

        let server = TokmapServer::new(config).unwrap();
        let key = server.resolver().resolve(token.as_str()).unwrap().unwrap();
        assert_eq!(key.slug.as_str(), "one-piece");
    }
}
