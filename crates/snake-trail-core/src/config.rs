use serde::{Deserialize, Serialize};
use snake_trail_platform::Rgba;

use crate::ConfigError;

/// `#RRGGBB` colour as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub Rgba);

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Rgba::opaque(r, g, b))
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(text.to_string());
        let digits = text.trim().strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn rgba(&self) -> Rgba {
        self.0
    }

    pub fn alpha(&self, a: f64) -> Rgba {
        self.0.with_alpha(a)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        let Rgba { r, g, b, .. } = color.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub accent: HexColor,
    pub eye: HexColor,
    pub eye_base: HexColor,
    pub belly: HexColor,
    pub spot: HexColor,
    /// Lighter ellipse inside each body spot and the head spots.
    pub spot_center: HexColor,
    pub tongue: HexColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: HexColor::rgb(0xD4, 0xA5, 0x74),
            secondary: HexColor::rgb(0xB8, 0x95, 0x6A),
            accent: HexColor::rgb(0x8B, 0x69, 0x14),
            eye: HexColor::rgb(0xFF, 0xD7, 0x00),
            eye_base: HexColor::rgb(0x2F, 0x4F, 0x2F),
            belly: HexColor::rgb(0xF5, 0xDE, 0xB3),
            spot: HexColor::rgb(0x8B, 0x45, 0x13),
            spot_center: HexColor::rgb(0xA0, 0x52, 0x2D),
            tongue: HexColor::rgb(0xCD, 0x85, 0x3F),
        }
    }
}

/// Tunables for the follower chain. Any subset may be given in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub length: usize,
    pub segment_size: f64,
    /// Fraction of the remaining gap closed per tick.
    pub follow_speed: f64,
    pub head_boost: f64,
    pub tail_lag_base: f64,
    pub tail_lag_per_index: f64,
    /// Lower bound of the tail lag factor, so long chains never stall.
    pub tail_lag_floor: f64,
    pub slack_ratio: f64,
    pub undulation_ratio: f64,
    pub undulation_time_scale: f64,
    pub undulation_index_phase: f64,
    pub wander_radius: f64,
    /// Radians added to the wander angle per idle tick.
    pub wander_speed: f64,
    pub idle_threshold_ms: f64,
    pub glow_intensity: f64,
    pub breathing_step: f64,
    pub pattern_step: f64,
    pub breathing_amplitude: f64,
    pub breathing_index_phase: f64,
    pub head_size_multiplier: f64,
    pub head_section_len: usize,
    pub size_falloff: f64,
    /// Smallest size multiplier reached by the taper.
    pub min_size_ratio: f64,
    pub opacity_falloff: f64,
    pub min_opacity: f64,
    pub jitter_seed: Option<u64>,
    pub palette: Palette,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            length: 7,
            segment_size: 25.0,
            follow_speed: 0.03,
            head_boost: 2.5,
            tail_lag_base: 1.2,
            tail_lag_per_index: 0.01,
            tail_lag_floor: 0.5,
            slack_ratio: 0.6,
            undulation_ratio: 0.2,
            undulation_time_scale: 0.01,
            undulation_index_phase: 0.3,
            wander_radius: 40.0,
            wander_speed: 0.01,
            idle_threshold_ms: 500.0,
            glow_intensity: 15.0,
            breathing_step: 0.05,
            pattern_step: 0.02,
            breathing_amplitude: 0.1,
            breathing_index_phase: 0.1,
            head_size_multiplier: 1.2,
            head_section_len: 5,
            size_falloff: 0.015,
            min_size_ratio: 0.2,
            opacity_falloff: 0.02,
            min_opacity: 0.3,
            jitter_seed: None,
            palette: Palette::default(),
        }
    }
}

impl TrailConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 {
            return Err(ConfigError::Invalid("length must be at least 1".into()));
        }
        if !(self.follow_speed > 0.0 && self.follow_speed <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "follow_speed {} is outside (0, 1]",
                self.follow_speed
            )));
        }
        if !(self.head_boost > 0.0 && self.follow_speed * self.head_boost <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "follow_speed x head_boost ({} x {}) must be in (0, 1]",
                self.follow_speed, self.head_boost
            )));
        }
        let positive = [
            ("tail_lag_floor", self.tail_lag_floor),
            ("min_size_ratio", self.min_size_ratio),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be finite and > 0, got {value}")));
            }
        }
        let non_negative = [
            ("segment_size", self.segment_size),
            ("wander_radius", self.wander_radius),
            ("idle_threshold_ms", self.idle_threshold_ms),
            ("glow_intensity", self.glow_intensity),
            ("slack_ratio", self.slack_ratio),
            ("min_opacity", self.min_opacity),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be finite and >= 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Base radius of segment `index`: a larger head section, then a slow taper.
    pub fn segment_size_at(&self, index: usize) -> f64 {
        let multiplier = if index < self.head_section_len {
            self.head_size_multiplier
        } else {
            (1.0 - index as f64 * self.size_falloff).max(self.min_size_ratio)
        };
        (self.segment_size * multiplier).max(0.0)
    }

    pub fn segment_opacity_at(&self, index: usize) -> f64 {
        (1.0 - index as f64 * self.opacity_falloff)
            .max(self.min_opacity)
            .clamp(0.0, 1.0)
    }

    /// Per-tick follow fraction for trailing segment `index`. Shrinks with the
    /// index but never below `follow_speed × tail_lag_floor`.
    pub fn tail_follow_at(&self, index: usize) -> f64 {
        let lag = self.tail_lag_base - index as f64 * self.tail_lag_per_index;
        self.follow_speed * lag.max(self.tail_lag_floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_parses_and_formats() {
        let color = HexColor::parse("#d4a574").unwrap();
        assert_eq!(color.rgba(), Rgba::opaque(212, 165, 116));
        assert_eq!(String::from(color), "#D4A574");
        assert!(HexColor::parse("d4a574").is_err());
        assert!(HexColor::parse("#d4a57").is_err());
        assert!(HexColor::parse("#zzzzzz").is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TrailConfig::from_toml_str(
            r##"
            length = 12
            follow_speed = 0.05

            [palette]
            eye = "#00FF00"
            "##,
        )
        .unwrap();
        assert_eq!(config.length, 12);
        assert_eq!(config.follow_speed, 0.05);
        assert_eq!(config.segment_size, 25.0);
        assert_eq!(config.palette.eye, HexColor::rgb(0, 255, 0));
        assert_eq!(config.palette.primary, Palette::default().primary);
    }

    #[test]
    fn json_config_parses() {
        let config = TrailConfig::from_json_str(r#"{"wander_radius": 60, "jitter_seed": 7}"#).unwrap();
        assert_eq!(config.wander_radius, 60.0);
        assert_eq!(config.jitter_seed, Some(7));
    }

    #[test]
    fn bad_color_in_config_is_rejected() {
        let err = TrailConfig::from_toml_str("[palette]\nprimary = \"gold\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut config = TrailConfig {
            length: 0,
            ..TrailConfig::default()
        };
        assert!(config.validate().is_err());
        config.length = 3;
        config.follow_speed = 0.5;
        assert!(config.validate().is_err(), "0.5 x 2.5 overshoots");
        config.follow_speed = 0.03;
        config.segment_size = f64::NAN;
        assert!(config.validate().is_err());
        config.segment_size = 25.0;
        assert!(config.validate().is_ok());
        config.tail_lag_floor = 0.0;
        assert!(config.validate().is_err(), "a zero floor can stall the tail");
        config.tail_lag_floor = 0.5;
        config.min_size_ratio = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sizes_and_opacity_fall_off_toward_tail() {
        let config = TrailConfig {
            length: 40,
            ..TrailConfig::default()
        };
        assert_eq!(config.segment_size_at(0), 30.0);
        assert_eq!(config.segment_size_at(4), 30.0);
        assert!(config.segment_size_at(5) < config.segment_size_at(4));
        assert!(config.segment_size_at(20) < config.segment_size_at(10));
        assert_eq!(config.segment_opacity_at(0), 1.0);
        assert!(config.segment_opacity_at(5) < 1.0);
        assert_eq!(config.segment_opacity_at(39), 0.3);
    }

    #[test]
    fn long_chains_keep_a_positive_follow_fraction_and_size() {
        let config = TrailConfig {
            length: 300,
            ..TrailConfig::default()
        };
        assert!(config.tail_follow_at(1) > config.tail_follow_at(50));
        for index in 1..config.length {
            assert!(config.tail_follow_at(index) >= 0.03 * 0.5 - 1e-12, "index {index}");
            assert!(config.segment_size_at(index) >= 25.0 * 0.2 - 1e-12, "index {index}");
        }
        assert_eq!(config.tail_follow_at(120), config.tail_follow_at(299));
    }

    #[test]
    fn default_spot_center_is_sienna() {
        assert_eq!(Palette::default().spot_center, HexColor::rgb(160, 82, 45));
    }

    #[test]
    fn round_trip_through_toml_preserves_palette() {
        let config = TrailConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(TrailConfig::from_toml_str(&text).unwrap(), config);
    }
}
