//! TOML layout of the configuration file.
//!
//! Scalars are read leniently: a value of the wrong type or an unparsable
//! string falls back to the field's default rather than rejecting the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use toml::Value;

use super::{LoadedConfig, SupervisorConfig};
use crate::policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
use crate::workers::WorkerDefinition;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(super) struct ConfigFile {
    #[serde(deserialize_with = "lenient_bool")]
    restart_automatically: bool,
    #[serde(deserialize_with = "lenient_millis")]
    restart_delay: Option<Duration>,
    #[serde(deserialize_with = "lenient_millis")]
    launch_stagger: Option<Duration>,
    #[serde(deserialize_with = "lenient_millis")]
    probe_interval: Option<Duration>,
    #[serde(deserialize_with = "lenient_u32")]
    max_restart_attempts: Option<u32>,
    restart_backoff: Option<BackoffSection>,
    workers: Vec<WorkerEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BackoffSection {
    #[serde(deserialize_with = "lenient_millis")]
    first: Option<Duration>,
    #[serde(deserialize_with = "lenient_millis")]
    max: Option<Duration>,
    #[serde(deserialize_with = "lenient_f64")]
    factor: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    jitter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct WorkerEntry {
    #[serde(deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    app_path: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    app_params: Option<String>,
}

impl ConfigFile {
    pub(super) fn into_loaded(self, base: &Path) -> LoadedConfig {
        let defaults = SupervisorConfig::default();
        let retry = self
            .restart_backoff
            .map(BackoffSection::into_policy)
            .unwrap_or(defaults.retry);

        let supervisor = SupervisorConfig {
            stagger: self.launch_stagger.unwrap_or(defaults.stagger),
            probe_interval: self.probe_interval.unwrap_or(defaults.probe_interval),
            restart: RestartPolicy {
                automatic: self.restart_automatically,
                delay: self.restart_delay.unwrap_or(Duration::ZERO),
            },
            retry,
            max_restart_attempts: self
                .max_restart_attempts
                .unwrap_or(defaults.max_restart_attempts),
            bus_capacity: defaults.bus_capacity,
        };

        let workers = self
            .workers
            .into_iter()
            .map(|w| w.into_definition(base))
            .collect();

        LoadedConfig { supervisor, workers }
    }
}

impl BackoffSection {
    fn into_policy(self) -> BackoffPolicy {
        let defaults = BackoffPolicy::default();
        let jitter = match self.jitter.as_deref().map(str::parse::<JitterPolicy>) {
            Some(Ok(j)) => j,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring restart-backoff.jitter");
                defaults.jitter
            }
            None => defaults.jitter,
        };
        BackoffPolicy {
            first: self.first.unwrap_or(defaults.first),
            max: self.max.unwrap_or(defaults.max),
            factor: self
                .factor
                .filter(|f| f.is_finite() && *f > 0.0)
                .unwrap_or(defaults.factor),
            jitter,
        }
    }
}

impl WorkerEntry {
    fn into_definition(self, base: &Path) -> WorkerDefinition {
        let mut def = match self.app_path {
            Some(p) => WorkerDefinition::new(resolve_against(base, &p)),
            None => WorkerDefinition::without_path(),
        };
        if let Some(name) = self.name {
            def = def.with_name(name);
        }
        if let Some(description) = self.description {
            def = def.with_description(description);
        }
        if let Some(params) = self.app_params {
            def = def.with_params(params);
        }
        def
    }
}

fn resolve_against(base: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if raw.is_empty() || path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Boolean(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_u64(value: Option<Value>) -> Option<u64> {
    match value? {
        Value::Integer(i) => u64::try_from(i).ok(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn lenient_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    Ok(lenient_u64(Option::<Value>::deserialize(d)?).map(Duration::from_millis))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_u64(Option::<Value>::deserialize(d)?).map(|n| u32::try_from(n).unwrap_or(u32::MAX)))
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Float(f)) => Some(f),
        Some(Value::Integer(i)) => Some(i as f64),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Integer(i)) => Some(i.to_string()),
        Some(Value::Float(f)) => Some(f.to_string()),
        Some(Value::Boolean(b)) => Some(b.to_string()),
        _ => None,
    })
}
