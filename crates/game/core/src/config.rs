/// Simulation constants and tunable combat parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Fixed simulation rate of a room.
    pub tick_hz: u32,
    /// Largest simulated step in milliseconds. Longer frames are clamped.
    pub max_step_ms: u64,
    /// Step length used when walking knockback and pull displacement.
    pub knockback_step: f64,
    /// Dedup records of sessions older than this are evicted even if the
    /// session was never ended.
    pub session_ttl_ms: u64,
    /// Edge length of one walkability tile.
    pub tile_size: f64,
    /// Hit/collision radius given to actors whose kit does not override it.
    pub default_radius: f64,
    /// Base locomotion speed in units per second.
    pub default_speed: f64,
}

impl CombatConfig {
    // ===== compile-time limits =====
    pub const MAX_SLOTS: usize = 3;
    pub const MAX_SLOWS: usize = 8;
    pub const MAX_ACTORS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TICK_HZ: u32 = 60;
    /// 1/30 s.
    pub const DEFAULT_MAX_STEP_MS: u64 = 33;
    pub const DEFAULT_KNOCKBACK_STEP: f64 = 2.0;
    pub const DEFAULT_SESSION_TTL_MS: u64 = 10_000;
    pub const DEFAULT_TILE_SIZE: f64 = 16.0;
    pub const DEFAULT_RADIUS: f64 = 6.0;
    pub const DEFAULT_SPEED: f64 = 150.0;

    pub fn new() -> Self {
        Self {
            tick_hz: Self::DEFAULT_TICK_HZ,
            max_step_ms: Self::DEFAULT_MAX_STEP_MS,
            knockback_step: Self::DEFAULT_KNOCKBACK_STEP,
            session_ttl_ms: Self::DEFAULT_SESSION_TTL_MS,
            tile_size: Self::DEFAULT_TILE_SIZE,
            default_radius: Self::DEFAULT_RADIUS,
            default_speed: Self::DEFAULT_SPEED,
        }
    }

    /// Nominal length of one tick in milliseconds.
    pub fn tick_ms(&self) -> u64 {
        (1000 / u64::from(self.tick_hz.max(1))).max(1)
    }

    /// Clamps a measured frame length to the maximum simulated step.
    pub fn clamp_step(&self, dt_ms: u64) -> u64 {
        dt_ms.min(self.max_step_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 || self.tick_hz > 1000 {
            return Err(ConfigError::TickRate(self.tick_hz));
        }
        if self.max_step_ms == 0 {
            return Err(ConfigError::MaxStep);
        }
        for (field, value) in [
            ("knockback_step", self.knockback_step),
            ("tile_size", self.tile_size),
            ("default_radius", self.default_radius),
            ("default_speed", self.default_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejected combat configuration values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick rate must be within 1..=1000 Hz, got {0}")]
    TickRate(u32),

    #[error("max step must be at least one millisecond")]
    MaxStep,

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

impl crate::error::GameError for ConfigError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TickRate(_) => "CONFIG_TICK_RATE",
            Self::MaxStep => "CONFIG_MAX_STEP",
            Self::NonPositive { .. } => "CONFIG_NON_POSITIVE",
        }
    }
}
