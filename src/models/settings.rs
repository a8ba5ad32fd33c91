use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::{error::Error, fs};

pub const SETTINGS_PATH: &str = "assets/settings.ron";

pub fn plugin(app: &mut App) {
    let settings = Settings::load();
    app.insert_resource(settings);
}

#[derive(Resource, Deserialize, Serialize, Debug, Clone)]
pub struct Settings {
    pub movement: MovementTuning,
    pub combat: CombatTuning,
    pub presenter: PresenterTuning,
    pub sound: SoundPreset,
}

impl Settings {
    /// Effective sfx volume.
    pub fn sfx(&self) -> f32 {
        self.sound.general * self.sound.sfx
    }

    pub fn load() -> Self {
        match fs::read_to_string(SETTINGS_PATH) {
            Ok(content) => match ron::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from '{SETTINGS_PATH}'");
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse '{SETTINGS_PATH}', using defaults: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = std::path::Path::new(SETTINGS_PATH).parent() {
            fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(self, Default::default())?;
        fs::write(SETTINGS_PATH, content)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement: MovementTuning::default(),
            combat: CombatTuning::default(),
            presenter: PresenterTuning::default(),
            sound: SoundPreset::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MovementTuning {
    /// Tiles per second.
    pub speed: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self { speed: 4.0 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CombatTuning {
    pub swing_duration: f32,
    pub hit_duration: f32,
    pub death_duration: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            swing_duration: 0.42,
            hit_duration: 0.3,
            death_duration: 0.9,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PresenterTuning {
    /// Idle-loop frames per second.
    pub frame_rate: f32,
    /// Fraction of the swing at which the impact frame fires.
    pub impact_fraction: f32,
}

impl Default for PresenterTuning {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            impact_fraction: 0.4,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SoundPreset {
    pub general: f32,
    pub sfx: f32,
    pub muted: bool,
}

impl Default for SoundPreset {
    fn default() -> Self {
        Self {
            general: 1.0,
            sfx: 0.8,
            muted: false,
        }
    }
}
