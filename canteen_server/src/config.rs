use std::{env, io::Write, time::Duration};

use canteen_common::{parse_boolean_flag, Secret};
use canteen_engine::{
    canteen_api::{DEFAULT_GATEWAY_TIMEOUT, DEFAULT_STORE_TIMEOUT},
    ApiTimeouts,
};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use razorpay_tools::RazorpayConfig;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_CANTEEN_HOST: &str = "127.0.0.1";
const DEFAULT_CANTEEN_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.db";
const MIN_JWT_SECRET_LENGTH: usize = 16;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub razorpay: RazorpayConfig,
    /// Upper bound on every database call made while serving a request.
    pub store_timeout: Duration,
    /// Upper bound on every call to the payment gateway.
    pub gateway_timeout: Duration,
    /// If true, admins may mark `Pending` orders as delivered. Delivered orders can never be re-delivered.
    pub allow_unpaid_delivery: bool,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CANTEEN_HOST.to_string(),
            port: DEFAULT_CANTEEN_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            razorpay: RazorpayConfig::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            allow_unpaid_delivery: false,
            use_x_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANTEEN_HOST").ok().unwrap_or_else(|| DEFAULT_CANTEEN_HOST.into());
        let port = env::var("CANTEEN_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CANTEEN_PORT. {e} Using the default, {DEFAULT_CANTEEN_PORT}, \
                         instead."
                    );
                    DEFAULT_CANTEEN_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CANTEEN_PORT);
        let database_url = env::var("CANTEEN_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CANTEEN_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let store_timeout = timeout_from_env("CANTEEN_STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT);
        let gateway_timeout = timeout_from_env("CANTEEN_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT);
        let razorpay = RazorpayConfig::new_from_env_or_default().with_timeout(gateway_timeout);
        let allow_unpaid_delivery = parse_boolean_flag(env::var("CANTEEN_ALLOW_UNPAID_DELIVERY").ok(), false);
        if allow_unpaid_delivery {
            warn!("🪛️ CANTEEN_ALLOW_UNPAID_DELIVERY is set. Admins can mark unpaid orders as delivered.");
        }
        let use_x_forwarded_for = parse_boolean_flag(env::var("CANTEEN_USE_X_FORWARDED_FOR").ok(), false);
        Self {
            host,
            port,
            database_url,
            auth,
            razorpay,
            store_timeout,
            gateway_timeout,
            allow_unpaid_delivery,
            use_x_forwarded_for,
        }
    }

    pub fn timeouts(&self) -> ApiTimeouts {
        ApiTimeouts { store: self.store_timeout, gateway: self.gateway_timeout }
    }
}

fn timeout_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs()))
        .and_then(|s| match s.parse::<u64>() {
            Ok(0) => {
                warn!("🪛️ {name} cannot be zero. Using the default value of {}s.", default.as_secs());
                Err(())
            },
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => {
                warn!("🪛️ Invalid configuration value for {name}. {e}");
                Err(())
            },
        })
        .unwrap_or(default)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity provider, which signs the bearer tokens this server accepts.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Tokens issued by the \
             identity provider will NOT be accepted. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the CANTEEN_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(secret: &str) -> Result<Self, ServerError> {
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "The JWT secret must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self { jwt_secret: Secret::new(secret.to_string()) })
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CANTEEN_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CANTEEN_JWT_SECRET]")))?;
        Self::new(secret.trim())
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the server configuration that route handlers need. Secrets are excluded.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for }
    }
}
