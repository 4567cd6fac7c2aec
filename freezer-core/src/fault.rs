//! Simulated write failures for exercising rollback paths.
//!
//! A [`FaultPolicy`] is handed to each repository and consulted before every
//! create, update and delete. It never touches storage itself; it only
//! decides whether the write is allowed to proceed and, if not, how long the
//! caller waits before the failure is reported.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Inclusive upper bound of the failure roll.
pub const ROLL_SIDES: u8 = 10;

/// The mode the application runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("unknown environment: {}", s)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Serializable fault settings, as read from a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub simulate: bool,
    /// A roll in `1..=10` at or below this value fails.
    pub failure_threshold: u8,
    pub delay_ms: u64,
    pub test_delay_ms: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            simulate: true,
            failure_threshold: 1,
            delay_ms: 1000,
            test_delay_ms: 10,
        }
    }
}

/// Outcome of consulting the policy before a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    Proceed,
    /// Wait `delay`, then report a simulated failure.
    Fail { delay: Duration },
}

type Roll = Box<dyn Fn() -> u8 + Send + Sync>;

/// Decides, before each write, whether to simulate a failure.
pub struct FaultPolicy {
    environment: Environment,
    simulate: bool,
    threshold: u8,
    delay: Duration,
    test_delay: Duration,
    guarantee_failure: AtomicBool,
    roll: Roll,
}

impl FaultPolicy {
    pub fn new(environment: Environment, config: &FaultConfig) -> Self {
        Self {
            environment,
            simulate: config.simulate,
            threshold: config.failure_threshold.min(ROLL_SIDES),
            delay: Duration::from_millis(config.delay_ms),
            test_delay: Duration::from_millis(config.test_delay_ms),
            guarantee_failure: AtomicBool::new(false),
            roll: Box::new(|| rand::thread_rng().gen_range(1..=ROLL_SIDES)),
        }
    }

    /// A policy that never fails.
    pub fn disabled() -> Self {
        Self::new(
            Environment::Production,
            &FaultConfig {
                simulate: false,
                ..FaultConfig::default()
            },
        )
    }

    /// A test-mode policy; failures only happen once guaranteed failure is set.
    pub fn for_tests() -> Self {
        Self::new(Environment::Test, &FaultConfig::default())
    }

    /// Replaces the dice, e.g. with a scripted sequence.
    pub fn with_roll(mut self, roll: impl Fn() -> u8 + Send + Sync + 'static) -> Self {
        self.roll = Box::new(roll);
        self
    }

    /// Forces every write to fail while in test mode.
    pub fn set_guaranteed_failure(&self, guarantee: bool) {
        self.guarantee_failure.store(guarantee, Ordering::SeqCst);
    }

    pub fn guaranteed_failure(&self) -> bool {
        self.guarantee_failure.load(Ordering::SeqCst)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn decide(&self) -> FaultDecision {
        if self.environment == Environment::Test && self.guaranteed_failure() {
            return FaultDecision::Fail {
                delay: self.test_delay,
            };
        }

        if self.environment != Environment::Development || !self.simulate {
            return FaultDecision::Proceed;
        }

        let roll = (self.roll)();
        if roll <= self.threshold {
            FaultDecision::Fail { delay: self.delay }
        } else {
            FaultDecision::Proceed
        }
    }
}

impl fmt::Debug for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultPolicy")
            .field("environment", &self.environment)
            .field("simulate", &self.simulate)
            .field("threshold", &self.threshold)
            .field("delay", &self.delay)
            .field("test_delay", &self.test_delay)
            .field("guarantee_failure", &self.guaranteed_failure())
            .finish_non_exhaustive()
    }
}
