//! Gameplay tunables, read from `assets/config/gameplay.json` when the game starts.
//!
//! Every field has a default, so the file may list only the values it overrides. A missing or
//! malformed file leaves the defaults in place.

use std::{fs, path::Path};

use bevy::{prelude::*, reflect::FromReflect};
use serde::Deserialize;
use thiserror::Error;

use crate::plugins::{
    lerp::{LERP_DURATION, LERP_STEPS},
    physics::{DEFAULT_ANGULAR_STIFFNESS, DEFAULT_LINEAR_STIFFNESS},
};

pub const CONFIG_PATH: &str = "assets/config/gameplay.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read gameplay config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse gameplay config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Resource, Deserialize, Reflect, FromReflect)]
#[reflect(Resource)]
#[serde(default)]
pub struct GameplayConfig {
    pub portal: PortalConfig,
    pub grab: GrabConfig,
    pub camera: CameraConfig,
    pub lerp: LerpConfig,
}

#[derive(Debug, Clone, Deserialize, Reflect, FromReflect)]
#[serde(default)]
pub struct PortalConfig {
    /// How far portals can be shot.
    pub trace_distance: f32,
    /// Sound played when portal A is placed, relative to the assets folder.
    pub sound_a: Option<String>,
    pub sound_b: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            trace_distance: 10_000.,
            sound_a: Some("sounds/portal_a.ogg".to_string()),
            sound_b: Some("sounds/portal_b.ogg".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Reflect, FromReflect)]
#[serde(default)]
pub struct GrabConfig {
    /// Reach of the grab trace.
    pub trace_distance: f32,
    /// Distance in front of the eye held objects are kept at.
    pub hold_distance: f32,
    /// Distance in front of the eye generic props are brought to when picked up.
    pub approach_distance: f32,
    /// Distance in front of the eye laser cubes are brought to when picked up.
    pub reflective_approach_distance: f32,
    /// How far below the eye line laser cubes are brought to.
    pub reflective_drop: f32,
    /// Held objects farther than this from the player are let go.
    pub tether_distance: f32,
    pub linear_stiffness: f32,
    pub angular_stiffness: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        GrabConfig {
            trace_distance: 200.,
            hold_distance: 130.,
            approach_distance: 180.,
            reflective_approach_distance: 130.,
            reflective_drop: 10.,
            tether_distance: 200.,
            linear_stiffness: DEFAULT_LINEAR_STIFFNESS,
            angular_stiffness: DEFAULT_ANGULAR_STIFFNESS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Reflect, FromReflect)]
#[serde(default)]
pub struct CameraConfig {
    pub default_fov_degrees: f32,
    pub zoom_fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            default_fov_degrees: 90.,
            zoom_fov_degrees: 50.,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Reflect, FromReflect)]
#[serde(default)]
/// Timing shared by the field of view and grab animations.
pub struct LerpConfig {
    pub duration: f32,
    pub steps: u32,
}

impl Default for LerpConfig {
    fn default() -> Self {
        LerpConfig {
            duration: LERP_DURATION,
            steps: LERP_STEPS,
        }
    }
}

impl GameplayConfig {
    pub fn from_json(json: &str) -> Result<GameplayConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<GameplayConfig, ConfigError> {
        let json = fs::read_to_string(path)?;
        GameplayConfig::from_json(&json)
    }

    /// Load the config at `path`, falling back to the defaults on failure.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> GameplayConfig {
        match GameplayConfig::load(&path) {
            Ok(config) => {
                info!("Loaded gameplay config from {}", path.as_ref().display());
                config
            }
            Err(err) => {
                warn!("{}, using defaults", err);
                GameplayConfig::default()
            }
        }
    }
}

#[derive(Debug)]
pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<GameplayConfig>()
            .insert_resource(GameplayConfig::load_or_default(CONFIG_PATH));
    }
}
