use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tessera_core::AppError;
use tracing_subscriber::EnvFilter;

/// Backing store for grants, directory and resource registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantStoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory {
        seed_file: String,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub grant_store: GrantStoreConfig,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let grant_store = match lookup("GRANT_STORE")
            .unwrap_or_else(|| "postgres".to_owned())
            .as_str()
        {
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
                let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
                    .map(|value| {
                        value.parse::<u32>().map_err(|error| {
                            AppError::Validation(format!(
                                "invalid DATABASE_MAX_CONNECTIONS: {error}"
                            ))
                        })
                    })
                    .transpose()?
                    .unwrap_or(10);

                GrantStoreConfig::Postgres {
                    database_url,
                    max_connections,
                }
            }
            "memory" => GrantStoreConfig::Memory {
                seed_file: lookup("MEMORY_SEED_FILE")
                    .filter(|value| !value.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(
                            "MEMORY_SEED_FILE is required when GRANT_STORE=memory".to_owned(),
                        )
                    })?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "GRANT_STORE must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && matches!(grant_store, GrantStoreConfig::Memory { .. }) {
            return Err(AppError::Validation(
                "migrate requires GRANT_STORE=postgres".to_owned(),
            ));
        }

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url = lookup("FRONTEND_URL").filter(|value| !value.trim().is_empty());

        Ok(Self {
            migrate_only,
            grant_store,
            api_host,
            api_port,
            frontend_url,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tessera_core::AppError;

    use super::{ApiConfig, GrantStoreConfig};

    fn load(values: &[(&str, &str)], migrate_only: bool) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(migrate_only, |name| values.get(name).cloned())
    }

    #[test]
    fn postgres_store_requires_database_url() {
        let missing = load(&[], false);
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let config = load(
            &[
                ("DATABASE_URL", "postgres://localhost/tessera"),
                ("DATABASE_MAX_CONNECTIONS", "4"),
            ],
            false,
        );
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());
        assert_eq!(
            config.grant_store,
            GrantStoreConfig::Postgres {
                database_url: "postgres://localhost/tessera".to_owned(),
                max_connections: 4,
            }
        );
        assert_eq!(config.api_port, 3001);
    }

    #[test]
    fn memory_store_needs_a_seed_file_but_no_database() {
        let missing_seed = load(&[("GRANT_STORE", "memory")], false);
        assert!(matches!(missing_seed, Err(AppError::Validation(_))));

        let config = load(
            &[
                ("GRANT_STORE", "memory"),
                ("MEMORY_SEED_FILE", "seed.json"),
                ("API_PORT", "8080"),
            ],
            false,
        );
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());

        assert_eq!(
            config.grant_store,
            GrantStoreConfig::Memory {
                seed_file: "seed.json".to_owned(),
            }
        );
        assert_eq!(
            config.socket_address().ok().map(|address| address.port()),
            Some(8080)
        );
    }

    #[test]
    fn rejects_unknown_store_and_memory_migrations() {
        assert!(load(&[("GRANT_STORE", "redis")], false).is_err());
        assert!(
            load(
                &[("GRANT_STORE", "memory"), ("MEMORY_SEED_FILE", "seed.json")],
                true
            )
            .is_err()
        );
    }
}
