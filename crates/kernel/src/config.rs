use crate::arena::ArenaBounds;
use crate::control::ControlMode;
use glam::Vec3;
use physlab_physics::ContactMaterial;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors from loading or validating a lab configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown lab {0:?}, expected barrier-course or vehicle-arena")]
    UnknownLab(String),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which of the two labs to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabKind {
    /// Force-driven cube on a floor that may be fenced by barrier walls.
    BarrierCourse,
    /// Position-nudged car and a ball inside clampable arena limits.
    VehicleArena,
}

impl LabKind {
    pub const ALL: [LabKind; 2] = [LabKind::BarrierCourse, LabKind::VehicleArena];

    pub fn name(&self) -> &'static str {
        match self {
            LabKind::BarrierCourse => "barrier-course",
            LabKind::VehicleArena => "vehicle-arena",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            LabKind::BarrierCourse => "Barrier Course",
            LabKind::VehicleArena => "Vehicle Arena",
        }
    }
}

impl fmt::Display for LabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LabKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownLab(s.to_string()))
    }
}

/// How real frame time turns into physics steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// Exactly one step of `fixed_dt` per tick, whatever the frame time.
    Fixed,
    /// Accumulate frame time, run up to `max_substeps` steps of `fixed_dt`.
    Accumulated { max_substeps: u32 },
}

/// Every tunable of one lab. Defaults reproduce the original demos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    pub kind: LabKind,
    pub gravity: Vec3,
    pub fixed_dt: f32,
    pub step_mode: StepMode,
    pub material: ContactMaterial,
    pub control: ControlMode,
    /// Bounds for the arena policy. Labs without an arena ignore it.
    pub arena: ArenaBounds,
    /// Initial state of the barriers/limits flag.
    pub limits_enabled: bool,
    /// One-shot sound for the sound button, if the lab has one.
    pub sound: Option<PathBuf>,
}

impl LabConfig {
    pub fn barrier_course() -> Self {
        Self {
            kind: LabKind::BarrierCourse,
            gravity: Vec3::new(0.0, -9.82, 0.0),
            fixed_dt: 1.0 / 60.0,
            step_mode: StepMode::Fixed,
            material: ContactMaterial {
                friction: 0.1,
                restitution: 0.6,
            },
            control: ControlMode::Force {
                magnitude: 100.0,
                damping: 0.45,
            },
            arena: ArenaBounds::default(),
            limits_enabled: true,
            sound: None,
        }
    }

    pub fn vehicle_arena() -> Self {
        Self {
            kind: LabKind::VehicleArena,
            gravity: Vec3::new(0.0, -9.82, 0.0),
            fixed_dt: 1.0 / 60.0,
            step_mode: StepMode::Accumulated { max_substeps: 3 },
            material: ContactMaterial::default(),
            control: ControlMode::Nudge { step: 0.1 },
            arena: ArenaBounds::new(5.0, 3.0, 5.0),
            limits_enabled: true,
            sound: Some(PathBuf::from("assets/collision.mp3")),
        }
    }

    pub fn for_kind(kind: LabKind) -> Self {
        match kind {
            LabKind::BarrierCourse => Self::barrier_course(),
            LabKind::VehicleArena => Self::vehicle_arena(),
        }
    }

    /// Parse a YAML overlay: `kind` picks the defaults, every other key
    /// present overrides them.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let overlay: ConfigOverlay = serde_yaml::from_str(yaml)?;
        let config = overlay.apply();
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), lab = %config.kind, "loaded lab config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite"));
        }
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(invalid("fixed_dt", format!("must be positive, got {}", self.fixed_dt)));
        }
        if let StepMode::Accumulated { max_substeps: 0 } = self.step_mode {
            return Err(invalid("step_mode.max_substeps", "must be at least 1"));
        }
        let m = self.material;
        if !(m.friction.is_finite() && m.friction >= 0.0 && m.restitution.is_finite() && m.restitution >= 0.0) {
            return Err(invalid("material", "friction and restitution must be non-negative"));
        }
        if !self.control.is_valid() {
            return Err(invalid(
                "control",
                "force damping must be in [0, 1) and magnitudes finite",
            ));
        }
        if !self.arena.is_valid() {
            return Err(invalid("arena", "half-extents must be positive"));
        }
        Ok(())
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self::barrier_course()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// On-disk form: everything optional except the lab kind.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    kind: LabKind,
    gravity: Option<Vec3>,
    fixed_dt: Option<f32>,
    step_mode: Option<StepMode>,
    material: Option<ContactMaterial>,
    control: Option<ControlMode>,
    arena: Option<ArenaBounds>,
    limits_enabled: Option<bool>,
    sound: Option<PathBuf>,
}

impl ConfigOverlay {
    fn apply(self) -> LabConfig {
        let mut c = LabConfig::for_kind(self.kind);
        if let Some(v) = self.gravity {
            c.gravity = v;
        }
        if let Some(v) = self.fixed_dt {
            c.fixed_dt = v;
        }
        if let Some(v) = self.step_mode {
            c.step_mode = v;
        }
        if let Some(v) = self.material {
            c.material = v;
        }
        if let Some(v) = self.control {
            c.control = v;
        }
        if let Some(v) = self.arena {
            c.arena = v;
        }
        if let Some(v) = self.limits_enabled {
            c.limits_enabled = v;
        }
        if self.sound.is_some() {
            c.sound = self.sound;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        for kind in LabKind::ALL {
            let config = LabConfig::for_kind(kind);
            assert_eq!(config.kind, kind);
            config.validate().unwrap();
        }
    }

    #[test]
    fn lab_names_parse() {
        for kind in LabKind::ALL {
            assert_eq!(kind.name().parse::<LabKind>().unwrap(), kind);
        }
        assert!(matches!(
            "lab-5".parse::<LabKind>(),
            Err(ConfigError::UnknownLab(_))
        ));
    }

    #[test]
    fn overlay_keeps_unlisted_defaults() {
        let yaml = "kind: vehicle-arena\ncontrol:\n  mode: force\n  magnitude: 40.0\n  damping: 0.5\nlimits_enabled: false\n";
        let config = LabConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.control,
            ControlMode::Force {
                magnitude: 40.0,
                damping: 0.5
            }
        );
        assert!(!config.limits_enabled);
        assert_eq!(config.step_mode, StepMode::Accumulated { max_substeps: 3 });
        assert_eq!(config.arena, ArenaBounds::new(5.0, 3.0, 5.0));
    }

    #[test]
    fn full_config_round_trips() {
        let original = LabConfig::vehicle_arena();
        let yaml = original.to_yaml().unwrap();
        assert_eq!(LabConfig::from_yaml_str(&yaml).unwrap(), original);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = LabConfig::from_yaml_str("kind: barrier-course\nfixed_dt: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "fixed_dt", .. }));

        let err = LabConfig::from_yaml_str(
            "kind: barrier-course\ncontrol:\n  mode: force\n  magnitude: 100.0\n  damping: 1.5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "control", .. }));

        let err = LabConfig::from_yaml_str(
            "kind: vehicle-arena\nstep_mode:\n  mode: accumulated\n  max_substeps: 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = LabConfig::from_yaml_str("kind: barrier-course\nspeed: 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "kind: barrier-course\nlimits_enabled: false").unwrap();
        let config = LabConfig::load(file.path()).unwrap();
        assert_eq!(config.kind, LabKind::BarrierCourse);
        assert!(!config.limits_enabled);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LabConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
