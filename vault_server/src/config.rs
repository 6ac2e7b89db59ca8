use std::{env, io::Write};

use chrono::Duration;
use log::*;
use rand::{thread_rng, RngCore};
use serde_json::json;
use tempfile::NamedTempFile;
use vault_common::{parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_VAULT_HOST: &str = "127.0.0.1";
const DEFAULT_VAULT_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/vault_store.db";
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
/// The shortest HMAC key we accept for signing access tokens, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the embedded migrations are applied to the database before the server starts accepting requests.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VAULT_HOST.to_string(),
            port: DEFAULT_VAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("VAULT_HOST").ok().unwrap_or_else(|| DEFAULT_VAULT_HOST.into());
        let port = env::var("VAULT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for VAULT_PORT. {e} Using the default, {DEFAULT_VAULT_PORT}, \
                         instead."
                    );
                    DEFAULT_VAULT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_VAULT_PORT);
        let database_url = env::var("VAULT_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ VAULT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let run_migrations = parse_boolean_flag(env::var("VAULT_RUN_MIGRATIONS").ok(), true);
        Self { host, port, database_url, auth, run_migrations }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HMAC key that access tokens are signed with. The identity provider must hold the same key.
    pub secret: Secret<Vec<u8>>,
    /// How long freshly issued access tokens stay valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The access token secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every token will be invalidated on restart. 🚨️🚨️🚨️"
        );
        let mut key = vec![0u8; MIN_SECRET_LENGTH];
        thread_rng().fill_bytes(&mut key);
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "vault_auth_secret": base64::encode_config(&key, base64::URL_SAFE_NO_PAD) });
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The access token secret for this session was written to {}. If this is a \
                         production instance, you are doing it wrong! Set the VAULT_AUTH_SECRET environment variable \
                         instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the access token secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the access token secret.");
            },
        }
        Self { secret: Secret::new(key), token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS) }
    }
}

impl AuthConfig {
    pub fn new(secret: &[u8], token_lifetime: Duration) -> Result<Self, ServerError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "The access token secret must be at least {MIN_SECRET_LENGTH} bytes long"
            )));
        }
        Ok(Self { secret: Secret::new(secret.to_vec()), token_lifetime })
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("VAULT_AUTH_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [VAULT_AUTH_SECRET]")))?;
        let token_lifetime = env::var("VAULT_TOKEN_LIFETIME")
            .map_err(|_| {
                info!(
                    "🪛️ VAULT_TOKEN_LIFETIME is not set. Using the default value of {} hrs.",
                    DEFAULT_TOKEN_LIFETIME_HOURS
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .ok()
                    .filter(|h| *h > 0)
                    .map(Duration::hours)
                    .ok_or_else(|| warn!("🪛️ Invalid configuration value for VAULT_TOKEN_LIFETIME: {s}"))
            })
            .unwrap_or_else(|_| Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS));
        Self::new(secret.as_bytes(), token_lifetime)
    }
}
