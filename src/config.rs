use crate::color::HexColor;
use crate::ecs::PropCategory;
use crate::tween::Ease;
use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Dusk Diorama".to_string(), width: 1280, height: 720, vsync: true, fullscreen: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoverConfig {
    #[serde(default = "HoverConfig::default_highlight_color")]
    pub highlight_color: HexColor,
    #[serde(default = "HoverConfig::default_duration")]
    pub duration: f32,
    #[serde(default)]
    pub ease: Ease,
}

impl HoverConfig {
    fn default_highlight_color() -> HexColor {
        HexColor::from_hex(0xff0000)
    }

    const fn default_duration() -> f32 {
        0.25
    }
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            highlight_color: Self::default_highlight_color(),
            duration: Self::default_duration(),
            ease: Ease::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelocationConfig {
    #[serde(default = "RelocationConfig::default_duration")]
    pub duration: f32,
    #[serde(default = "RelocationConfig::default_ease")]
    pub ease: Ease,
    /// Pile anchor per category on the ground plane, as `[x, z]`.
    #[serde(default = "RelocationConfig::default_anchors")]
    pub anchors: BTreeMap<PropCategory, [f32; 2]>,
}

impl RelocationConfig {
    const fn default_duration() -> f32 {
        1.0
    }

    fn default_ease() -> Ease {
        Ease::Power3Out
    }

    fn default_anchors() -> BTreeMap<PropCategory, [f32; 2]> {
        BTreeMap::from([
            (PropCategory::Log, [0.0, 9.5]),
            (PropCategory::Gypsum, [2.0, 9.5]),
            (PropCategory::Brick, [-2.0, 9.5]),
        ])
    }

    pub fn anchor(&self, category: PropCategory) -> Option<Vec2> {
        self.anchors.get(&category).map(|[x, z]| Vec2::new(*x, *z))
    }
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            duration: Self::default_duration(),
            ease: Self::default_ease(),
            anchors: Self::default_anchors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FireflyConfig {
    pub count: usize,
    pub angle: f32,
    pub radius_step: f32,
    pub speed: f32,
    pub height: f32,
    pub color: HexColor,
    pub intensity: f32,
    pub range: f32,
}

impl Default for FireflyConfig {
    fn default() -> Self {
        Self {
            count: 2,
            angle: PI * 0.3,
            radius_step: 3.0,
            speed: 0.125,
            height: 0.5,
            color: HexColor::from_hex(0x00ff00),
            intensity: 0.4,
            range: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DoorLightConfig {
    pub target_intensity: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
}

impl Default for DoorLightConfig {
    fn default() -> Self {
        Self { target_intensity: 12.0, duration: 275.0, delay: 12.0, ease: Ease::Power3Out }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraIntroConfig {
    pub enabled: bool,
    pub from: [f32; 3],
    pub duration: f32,
    pub ease: Ease,
}

impl Default for CameraIntroConfig {
    fn default() -> Self {
        Self { enabled: true, from: [0.0, 8.0, 7.0], duration: 1.3, ease: Ease::Power3Out }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub countdown_total: f32,
    pub day_color: HexColor,
    pub dusk_color: HexColor,
    pub fade_duration: f32,
    pub fade_ease: Ease,
    pub ambient_intensity: f32,
    pub moon_intensity: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub door_light: DoorLightConfig,
    pub camera_intro: CameraIntroConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            countdown_total: 100.0,
            day_color: HexColor::from_hex(0x95a7b9),
            dusk_color: HexColor::from_hex(0x383d47),
            fade_duration: 100.0,
            fade_ease: Ease::Power1Out,
            ambient_intensity: 1.5,
            moon_intensity: 1.5,
            fog_near: 8.0,
            fog_far: 16.0,
            door_light: DoorLightConfig::default(),
            camera_intro: CameraIntroConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl CameraConfig {
    pub fn eye(&self) -> Vec3 {
        Vec3::from_array(self.eye)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            eye: [0.0, 2.0, 12.0],
            target: [0.0, 0.0, 0.0],
            min_polar: FRAC_PI_4,
            max_polar: FRAC_PI_2 - 0.1,
            min_distance: 5.0,
            max_distance: 16.0,
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Fixed seed for reproducible layouts; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub props_per_category: usize,
    pub ring_inner_radius: f32,
    pub ring_width: f32,
    pub pile_bricks: usize,
    pub pile_logs: usize,
    pub pile_gypsum: usize,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            seed: None,
            props_per_category: 10,
            ring_inner_radius: 5.5,
            ring_width: 3.0,
            pile_bricks: 20,
            pile_logs: 12,
            pile_gypsum: 42,
        }
    }
}

impl ScatterConfig {
    pub fn pile_count(&self, category: PropCategory) -> usize {
        match category {
            PropCategory::Log => self.pile_logs,
            PropCategory::Gypsum => self.pile_gypsum,
            PropCategory::Brick => self.pile_bricks,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub hover: HoverConfig,
    #[serde(default)]
    pub relocation: RelocationConfig,
    #[serde(default)]
    pub fireflies: FireflyConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scatter: ScatterConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
        if let Some(seed) = overrides.seed {
            self.scatter.seed = Some(seed);
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.vsync.is_none() && self.seed.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.vsync.is_some() {
            fields.push("vsync");
        }
        if self.seed.is_some() {
            fields.push("seed");
        }
        fields
    }
}
