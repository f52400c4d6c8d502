//! Shop configuration.
//!
//! Two YAML files feed a run: `config.yaml` (servers and customers, required)
//! and `job.yaml` (time limit and seed, optional). Raw documents are parsed
//! with loose types and then validated into a [`ShopConfig`]; the simulation
//! itself never re-checks these values.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use des::Time;

use crate::server::Server;

pub const DEFAULT_TIME_LIMIT: Time = 100.0;

#[derive(Debug)]
pub enum ConfigError {
    /// The required configuration file does not exist
    MissingFile(PathBuf),
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Parse {
        origin: String,
        source: serde_yaml::Error,
    },
    /// The document parsed but a value is missing or unusable
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile(path) => {
                write!(f, "Missing required config file: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "Can't read {}: {}", path.display(), source),
            Self::Parse { origin, source } => write!(f, "Can't parse YAML from {}: {}", origin, source),
            Self::Invalid(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[derive(Debug, Default, Deserialize)]
struct RawShopConfig {
    servers: Option<Vec<RawServer>>,
    customers: Option<RawCustomers>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    name: Option<Value>,
    #[serde(rename = "service-time")]
    service_time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCustomers {
    #[serde(rename = "interarrival-time")]
    interarrival_time: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawJob {
    #[serde(rename = "time-limit")]
    time_limit: Option<Value>,
    #[serde(rename = "random-seed")]
    random_seed: Option<Value>,
}

/// One configured server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSpec {
    pub name: String,
    pub service_time: Time,
}

impl ServerSpec {
    pub fn new(name: impl Into<String>, service_time: Time) -> Self {
        ServerSpec {
            name: name.into(),
            service_time,
        }
    }
}

/// Validated inputs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopConfig {
    /// Dispatch tie-break order
    pub servers: Vec<ServerSpec>,
    pub interarrival_time: Time,
    pub time_limit: Time,
    /// Accepted for compatibility; the model is deterministic and ignores it
    pub random_seed: Option<i64>,
}

impl ShopConfig {
    pub fn new(
        servers: Vec<ServerSpec>,
        interarrival_time: Time,
        time_limit: Time,
    ) -> Result<Self, ConfigError> {
        let config = ShopConfig {
            servers,
            interarrival_time,
            time_limit,
            random_seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `config_path` (required) and `job_path` (used only if it exists).
    pub fn from_files(
        config_path: impl AsRef<Path>,
        job_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Err(ConfigError::MissingFile(config_path.to_path_buf()));
        }
        let config = read(config_path)?;

        let job_path = job_path.as_ref();
        let job = if job_path.exists() {
            Some(read(job_path)?)
        } else {
            log::debug!("{} not found, using job defaults", job_path.display());
            None
        };

        Self::parse(
            &config,
            &config_path.display().to_string(),
            job.as_deref(),
            &job_path.display().to_string(),
        )
    }

    pub fn from_yaml_str(config: &str, job: Option<&str>) -> Result<Self, ConfigError> {
        Self::parse(config, "config.yaml", job, "job.yaml")
    }

    fn parse(
        config: &str,
        config_origin: &str,
        job: Option<&str>,
        job_origin: &str,
    ) -> Result<Self, ConfigError> {
        let raw: RawShopConfig = parse_document(config, config_origin)?;
        let raw_job: RawJob = match job {
            Some(job) => parse_document(job, job_origin)?,
            None => RawJob::default(),
        };

        let raw_servers = match raw.servers {
            Some(servers) if !servers.is_empty() => servers,
            _ => return Err(invalid("config.yaml must contain a non-empty 'servers' array.")),
        };
        let mut servers = Vec::with_capacity(raw_servers.len());
        for entry in raw_servers {
            let (Some(name), Some(service_time)) = (entry.name, entry.service_time) else {
                return Err(invalid("Each server must have 'name' and 'service-time'."));
            };
            let name = server_name(&name)?;
            let service_time = numeric(&service_time)
                .ok_or_else(|| invalid(format!("service-time for server '{}' must be numeric.", name)))?;
            servers.push(ServerSpec::new(name, service_time));
        }

        let interarrival_time = raw
            .customers
            .and_then(|customers| customers.interarrival_time)
            .ok_or_else(|| invalid("config.yaml must contain 'customers.interarrival-time'."))?;
        let interarrival_time = numeric(&interarrival_time)
            .ok_or_else(|| invalid("customers.interarrival-time must be numeric."))?;

        let time_limit = match raw_job.time_limit {
            Some(value) => numeric(&value).ok_or_else(|| invalid("time-limit must be numeric."))?,
            None => DEFAULT_TIME_LIMIT,
        };
        let random_seed = raw_job.random_seed.as_ref().and_then(integer);
        if let Some(seed) = random_seed {
            log::info!("random-seed {} accepted; arrivals and services are deterministic", seed);
        }

        let config = ShopConfig {
            servers,
            interarrival_time,
            time_limit,
            random_seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject inputs that would stall or corrupt a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(invalid("At least one server is required."));
        }
        let mut names = HashSet::new();
        for server in &self.servers {
            if !names.insert(server.name.as_str()) {
                return Err(invalid(format!("Duplicate server name '{}'.", server.name)));
            }
            if !(server.service_time.is_finite() && server.service_time > 0.0) {
                return Err(invalid(format!(
                    "service-time for server '{}' must be a positive number, got {}.",
                    server.name, server.service_time
                )));
            }
        }
        if !(self.interarrival_time.is_finite() && self.interarrival_time > 0.0) {
            return Err(invalid(format!(
                "customers.interarrival-time must be a positive number, got {}.",
                self.interarrival_time
            )));
        }
        if !(self.time_limit.is_finite() && self.time_limit >= 0.0) {
            return Err(invalid(format!(
                "time-limit must be a non-negative number, got {}.",
                self.time_limit
            )));
        }
        Ok(())
    }

    /// Same shop with a different interarrival time.
    pub fn with_interarrival_time(&self, interarrival_time: Time) -> Result<Self, ConfigError> {
        let config = ShopConfig {
            interarrival_time,
            ..self.clone()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn build_servers(&self) -> Vec<Server> {
        self.servers
            .iter()
            .map(|spec| Server::new(spec.name.clone(), spec.service_time))
            .collect()
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document<T>(contents: &str, origin: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    // an empty document behaves like an empty mapping
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn server_name(value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid("Server 'name' must be a string.")),
    }
}
