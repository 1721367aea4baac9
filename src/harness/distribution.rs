//! Parameter distributions

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};
use crate::params::ParamValue;

/// Domain a single parameter is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Distribution {
    /// Continuous range [low, high], optionally log-scaled
    Float {
        low: f64,
        high: f64,
        #[serde(default)]
        log: bool,
    },
    /// Integer range [low, high], optionally log-scaled
    Int {
        low: i64,
        high: i64,
        #[serde(default)]
        log: bool,
    },
    /// Categorical choices
    Categorical { choices: Vec<ParamValue> },
}

impl Distribution {
    pub fn float(low: f64, high: f64) -> Self {
        Distribution::Float {
            low,
            high,
            log: false,
        }
    }

    pub fn log_float(low: f64, high: f64) -> Self {
        Distribution::Float {
            low,
            high,
            log: true,
        }
    }

    pub fn int(low: i64, high: i64) -> Self {
        Distribution::Int {
            low,
            high,
            log: false,
        }
    }

    pub fn categorical(choices: impl IntoIterator<Item = impl Into<ParamValue>>) -> Self {
        Distribution::Categorical {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Check bounds and emptiness
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Distribution::Float { low, high, log } => {
                if !(low.is_finite() && high.is_finite()) || low > high {
                    return Err(format!("invalid range [{}, {}]", low, high));
                }
                if *log && *low <= 0.0 {
                    return Err("log scale requires low > 0".to_string());
                }
            }
            Distribution::Int { low, high, log } => {
                if low > high {
                    return Err(format!("invalid range [{}, {}]", low, high));
                }
                if *log && *low < 1 {
                    return Err("log scale requires low >= 1".to_string());
                }
            }
            Distribution::Categorical { choices } => {
                if choices.is_empty() {
                    return Err("categorical distribution needs at least one choice".to_string());
                }
            }
        }
        Ok(())
    }

    /// Draw a value uniformly (log-uniformly when `log` is set).
    /// Assumes a distribution that passed [`validate`](Self::validate).
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ParamValue {
        match self {
            Distribution::Float { low, high, log } => {
                let value = if *log {
                    let log_low = low.ln();
                    let log_high = high.ln();
                    (log_low + rng.random::<f64>() * (log_high - log_low)).exp()
                } else {
                    low + rng.random::<f64>() * (high - low)
                };
                ParamValue::Float(value.clamp(*low, *high))
            }
            Distribution::Int { low, high, log } => {
                let value = if *log {
                    let log_low = (*low as f64 - 0.5).max(0.5).ln();
                    let log_high = (*high as f64 + 0.5).ln();
                    (log_low + rng.random::<f64>() * (log_high - log_low))
                        .exp()
                        .round() as i64
                } else {
                    rng.random_range(*low..=*high)
                };
                ParamValue::Int(value.clamp(*low, *high))
            }
            Distribution::Categorical { choices } => {
                let idx = rng.random_range(0..choices.len());
                choices[idx].clone()
            }
        }
    }

    /// Whether a value lies inside this domain
    pub fn contains(&self, value: &ParamValue) -> bool {
        match self {
            Distribution::Float { low, high, .. } => value
                .as_f64()
                .is_some_and(|v| v >= *low && v <= *high),
            Distribution::Int { low, high, .. } => value
                .as_i64()
                .is_some_and(|v| v >= *low && v <= *high),
            Distribution::Categorical { choices } => choices.iter().any(|c| c.matches(value)),
        }
    }

    /// Convert a proposed value to this distribution's type.
    ///
    /// Only the type is checked; out-of-range numbers pass through.
    pub fn coerce(&self, name: &str, value: &ParamValue) -> Result<ParamValue> {
        let invalid = |reason: String| TunerError::InvalidValue {
            name: name.to_string(),
            reason,
        };
        match self {
            Distribution::Float { .. } => value
                .as_f64()
                .map(ParamValue::Float)
                .ok_or_else(|| invalid(format!("expected a number, got {}", value))),
            Distribution::Int { .. } => value
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| invalid(format!("expected an integer, got {}", value))),
            Distribution::Categorical { choices } => choices
                .iter()
                .find(|c| c.matches(value))
                .cloned()
                .ok_or_else(|| invalid(format!("{} is not one of the choices", value))),
        }
    }

    /// A representative value, used to show the model the expected shape
    pub fn representative(&self) -> Option<ParamValue> {
        match self {
            Distribution::Float { low, high, log } => {
                if *log {
                    let mid = ((low.ln() + high.ln()) / 2.0).exp();
                    Some(ParamValue::Float(mid.clamp(*low, *high)))
                } else {
                    Some(ParamValue::Float(low / 2.0 + high / 2.0))
                }
            }
            Distribution::Int { low, high, .. } => {
                let mid = (i128::from(*low) + i128::from(*high)) / 2;
                Some(ParamValue::Int(mid as i64))
            }
            Distribution::Categorical { choices } => choices.first().cloned(),
        }
    }

    /// Human-readable description for prompts
    pub fn describe(&self) -> String {
        match self {
            Distribution::Float { low, high, log } => {
                let scale = if *log { " (log scale)" } else { "" };
                format!("float in [{}, {}]{}", low, high, scale)
            }
            Distribution::Int { low, high, log } => {
                let scale = if *log { " (log scale)" } else { "" };
                format!("integer in [{}, {}]{}", low, high, scale)
            }
            Distribution::Categorical { choices } => {
                let rendered: Vec<String> = choices
                    .iter()
                    .map(|c| serde_json::to_string(c).unwrap_or_else(|_| c.to_string()))
                    .collect();
                format!("one of [{}]", rendered.join(", "))
            }
        }
    }
}
