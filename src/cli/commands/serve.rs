use clap::Args;

use crate::config::{config, AppConfig, StoreBackend};
use crate::server;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides MOCK_API_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Route prefix for the mock endpoints, e.g. /api")]
    pub prefix: Option<String>,

    #[arg(long, value_enum, help = "Record store backend")]
    pub store: Option<StoreBackend>,

    #[arg(long, help = "PostgreSQL URL for the postgres backend")]
    pub database_url: Option<String>,
}

impl ServeArgs {
    /// Global config with command line overrides applied
    fn apply(self, base: &AppConfig) -> AppConfig {
        let mut config = base.clone();
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(prefix) = self.prefix {
            config.server.route_prefix = prefix;
        }
        if let Some(store) = self.store {
            config.store.backend = store;
        }
        if let Some(url) = self.database_url {
            config.store.database_url = Some(url);
        }
        config
    }
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.apply(config());
    tracing::info!(
        "Starting mock bill API in {:?} mode with {:?} store",
        config.environment,
        config.store.backend
    );
    server::serve(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let base = AppConfig::development();
        let args = ServeArgs {
            port: Some(4000),
            prefix: None,
            store: Some(StoreBackend::Postgres),
            database_url: Some("postgres://localhost/mock".into()),
        };

        let config = args.apply(&base);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.route_prefix, base.server.route_prefix);
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.database_url.as_deref(), Some("postgres://localhost/mock"));
    }
}
