//! Vision tunables and their two-tier resolution
//!
//! Every key has a world-level default. A scene may override any scene-scoped
//! key; a missing, `null` or unreadable override falls back to the world value,
//! and a missing world value falls back to the system baseline. Resolution
//! never fails.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FOG_COMMIT_THRESHOLD;
use crate::error::Result;

/// Value type a key expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Number,
    Bool,
}

/// Tunable keys, spelled as the host stores them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingKey {
    RayDensity,
    RayDedupTolerance,
    MaxRadius,
    ExactVisionThreshold,
    FixAggressiveWallCulling,
    FowOnlyPlayerVisible,
    FixFowMemoryLeak,
    FogCommitThreshold,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::RayDensity,
        SettingKey::RayDedupTolerance,
        SettingKey::MaxRadius,
        SettingKey::ExactVisionThreshold,
        SettingKey::FixAggressiveWallCulling,
        SettingKey::FowOnlyPlayerVisible,
        SettingKey::FixFowMemoryLeak,
        SettingKey::FogCommitThreshold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::RayDensity => "ray-density",
            SettingKey::RayDedupTolerance => "ray-dedup-tolerance",
            SettingKey::MaxRadius => "max-radius",
            SettingKey::ExactVisionThreshold => "exact-vision-threshold",
            SettingKey::FixAggressiveWallCulling => "fix-aggressive-wall-culling",
            SettingKey::FowOnlyPlayerVisible => "fow-only-player-visible",
            SettingKey::FixFowMemoryLeak => "fix-fow-memory-leak",
            SettingKey::FogCommitThreshold => "fog-commit-threshold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn kind(&self) -> SettingKind {
        match self {
            SettingKey::FixAggressiveWallCulling
            | SettingKey::FowOnlyPlayerVisible
            | SettingKey::FixFowMemoryLeak => SettingKind::Bool,
            _ => SettingKind::Number,
        }
    }

    /// Whether a scene may override this key (wall culling is world-only)
    pub fn scene_scoped(&self) -> bool {
        !matches!(self, SettingKey::FixAggressiveWallCulling)
    }

    /// Value used when neither tier provides one
    pub fn baseline(&self) -> SettingValue {
        match self {
            SettingKey::FogCommitThreshold => SettingValue::Number(DEFAULT_FOG_COMMIT_THRESHOLD as f64),
            k if k.kind() == SettingKind::Bool => SettingValue::Bool(false),
            _ => SettingValue::Number(0.0),
        }
    }
}

/// A resolved tunable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
}

impl SettingValue {
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            SettingValue::Number(n) if n.is_finite() => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            SettingValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::Number(_) => SettingKind::Number,
        }
    }

    /// Interpret a raw stored value for `key`. Form fields arrive as text, and
    /// the literal string "null" clears an override.
    fn parse(key: SettingKey, raw: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        let value = match (key.kind(), raw) {
            (_, Value::Null) => None,
            (SettingKind::Number, Value::Number(n)) => n.as_f64().map(SettingValue::Number),
            (SettingKind::Bool, Value::Bool(b)) => Some(SettingValue::Bool(*b)),
            (_, Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() || s == "null" {
                    return None;
                }
                match key.kind() {
                    SettingKind::Number => s.parse::<f64>().ok().map(SettingValue::Number),
                    SettingKind::Bool => s.parse::<bool>().ok().map(SettingValue::Bool),
                }
            }
            _ => None,
        };
        value.filter(|v| v.kind() != SettingKind::Number || v.as_number().is_some())
    }
}

/// World-level defaults for every key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WorldSettings {
    /// Degrees between guaranteed fill rays (0 = host baseline)
    pub ray_density: f64,
    /// Dedup bucket scale (0 = no dedup)
    pub ray_dedup_tolerance: f64,
    /// Vision cap in grid units (0 = uncapped)
    pub max_radius: f64,
    /// Wall count at which vision turns approximate (0 = host default)
    pub exact_vision_threshold: f64,
    pub fix_aggressive_wall_culling: bool,
    /// Only commit fog for sources some player can observe
    pub fow_only_player_visible: bool,
    /// Force a fog commit once pending geometry grows past `fog_commit_threshold`
    pub fix_fow_memory_leak: bool,
    pub fog_commit_threshold: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            ray_density: 0.0,
            ray_dedup_tolerance: 0.0,
            max_radius: 0.0,
            exact_vision_threshold: 0.0,
            fix_aggressive_wall_culling: false,
            fow_only_player_visible: false,
            fix_fow_memory_leak: false,
            fog_commit_threshold: DEFAULT_FOG_COMMIT_THRESHOLD as f64,
        }
    }
}

impl WorldSettings {
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::RayDensity => SettingValue::Number(self.ray_density),
            SettingKey::RayDedupTolerance => SettingValue::Number(self.ray_dedup_tolerance),
            SettingKey::MaxRadius => SettingValue::Number(self.max_radius),
            SettingKey::ExactVisionThreshold => SettingValue::Number(self.exact_vision_threshold),
            SettingKey::FixAggressiveWallCulling => SettingValue::Bool(self.fix_aggressive_wall_culling),
            SettingKey::FowOnlyPlayerVisible => SettingValue::Bool(self.fow_only_player_visible),
            SettingKey::FixFowMemoryLeak => SettingValue::Bool(self.fix_fow_memory_leak),
            SettingKey::FogCommitThreshold => SettingValue::Number(self.fog_commit_threshold),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load world settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded world settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No world settings at {}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

/// Per-scene overrides, stored as loosely typed flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneFlags {
    flags: BTreeMap<String, serde_json::Value>,
}

impl SceneFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<serde_json::Value>) {
        self.flags.insert(key.as_str().to_string(), value.into());
    }

    pub fn unset(&mut self, key: SettingKey) {
        self.flags.remove(key.as_str());
    }

    /// The override for `key`, if one is present and readable
    pub fn get(&self, key: SettingKey) -> Option<SettingValue> {
        if !key.scene_scoped() {
            return None;
        }
        let raw = self.flags.get(key.as_str())?;
        let value = SettingValue::parse(key, raw);
        if value.is_none() && !raw.is_null() {
            log::warn!("Ignoring unreadable scene override {} = {}", key.as_str(), raw);
        }
        value
    }
}

/// Source of effective tunables
pub trait SettingsProvider {
    /// Resolve `key` to a definite value; never fails
    fn get_effective(&self, key: SettingKey) -> SettingValue;

    fn number(&self, key: SettingKey) -> f64 {
        self.get_effective(key)
            .as_number()
            .or_else(|| key.baseline().as_number())
            .unwrap_or(0.0)
    }

    fn flag(&self, key: SettingKey) -> bool {
        self.get_effective(key).as_bool().unwrap_or(false)
    }
}

/// Scene flags over world defaults over baseline
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredSettings<'a> {
    pub scene: Option<&'a SceneFlags>,
    pub world: Option<&'a WorldSettings>,
}

impl<'a> LayeredSettings<'a> {
    pub fn new(scene: Option<&'a SceneFlags>, world: Option<&'a WorldSettings>) -> Self {
        Self { scene, world }
    }
}

impl SettingsProvider for LayeredSettings<'_> {
    fn get_effective(&self, key: SettingKey) -> SettingValue {
        if let Some(v) = self.scene.and_then(|s| s.get(key)) {
            return v;
        }
        match self.world.map(|w| w.get(key)) {
            Some(v) if v.kind() == SettingKind::Bool || v.as_number().is_some() => v,
            Some(v) => {
                log::warn!("World setting {} is not finite ({:?}); using baseline", key.as_str(), v);
                key.baseline()
            }
            None => key.baseline(),
        }
    }
}

impl SettingsProvider for WorldSettings {
    fn get_effective(&self, key: SettingKey) -> SettingValue {
        LayeredSettings::new(None, Some(self)).get_effective(key)
    }
}

/// Scene grid geometry used to turn grid units into pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDimensions {
    /// Pixels per grid cell
    pub size: f64,
    /// Distance units per grid cell
    pub distance: f64,
}

impl Default for SceneDimensions {
    fn default() -> Self {
        Self {
            size: 100.0,
            distance: 5.0,
        }
    }
}

impl SceneDimensions {
    /// Convert distance units to pixels; degenerate grids yield 0 (no cap)
    pub fn units_to_pixels(&self, units: f64) -> f64 {
        if !(self.distance > 0.0) || !self.size.is_finite() || !units.is_finite() {
            return 0.0;
        }
        units * self.size / self.distance
    }
}
