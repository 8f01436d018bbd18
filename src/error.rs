use bevy_math::Vec2;

/// A tunable or collider shape that cannot drive a [`CharacterController`](crate::CharacterController).
///
/// These are only produced while deriving a [`ControllerSetup`](crate::ControllerSetup).
/// A character whose setup failed is never moved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be finite")]
    NotFinite { name: &'static str },
    #[error("min jump height {min} exceeds max jump height {max}")]
    MinJumpAboveMax { min: f32, max: f32 },
    #[error("fall multiplier must be at least 1, got {0}")]
    FallMultiplierBelowOne(f32),
    #[error("max slope angle must lie in [0, 90) degrees, got {0} rad")]
    InvalidSlopeAngle(f32),
    #[error("collider bounds {size} are too small for a skin width of {skin_width}")]
    DegenerateBounds { size: Vec2, skin_width: f32 },
}

pub(crate) fn positive(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(value)
}

pub(crate) fn non_negative(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(value)
}
