//! Описание уровня для spawn manager (JSON)
//!
//! Spawn точки помечены тегом (Light/Medium/Heavy/Door). Префаб может нести
//! собственные дочерние точки (локальные координаты), они раскрываются
//! после спавна префаба.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{PhysicsProfile, ProbeShape, WeightClass};
use crate::config::ConfigError;

/// Spawn точка
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPointDef {
    pub name: String,
    pub tag: String,
    pub position: [f32; 3],
    /// Поворот вокруг Y (градусы)
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub children: Vec<SpawnPointDef>,
}

impl SpawnPointDef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            position: position.to_array(),
            yaw: 0.0,
            active: true,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SpawnPointDef>) -> Self {
        self.children = children;
        self
    }

    pub fn class(&self) -> Option<WeightClass> {
        WeightClass::from_tag(&self.tag)
    }

    /// Transform точки относительно родителя
    pub fn local_transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.position))
            .with_rotation(Quat::from_rotation_y(self.yaw.to_radians()))
    }
}

/// Форма коллайдера префаба
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeDef {
    Sphere { radius: f32 },
    Cuboid { half_extents: [f32; 3] },
}

impl From<ShapeDef> for ProbeShape {
    fn from(shape: ShapeDef) -> Self {
        match shape {
            ShapeDef::Sphere { radius } => ProbeShape::Sphere { radius },
            ShapeDef::Cuboid { half_extents } => ProbeShape::Cuboid {
                half_extents: Vec3::from_array(half_extents),
            },
        }
    }
}

/// Префаб интерактивного объекта
///
/// `body`/`shape` = None → префаб неполный, спавн пропускается с warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabDef {
    pub name: String,
    pub tag: String,
    #[serde(default = "default_health")]
    pub health: i32,
    #[serde(default = "default_multiplier")]
    pub score_multiplier: f32,
    #[serde(default)]
    pub body: Option<PhysicsProfile>,
    #[serde(default)]
    pub shape: Option<ShapeDef>,
    /// Door: hinge мотор вместо ручного угла
    #[serde(default)]
    pub hinge: bool,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPointDef>,
}

impl PrefabDef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, body: PhysicsProfile, shape: ShapeDef) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            health: default_health(),
            score_multiplier: default_multiplier(),
            body: Some(body),
            shape: Some(shape),
            hinge: false,
            spawn_points: Vec::new(),
        }
    }

    pub fn with_spawn_points(mut self, points: Vec<SpawnPointDef>) -> Self {
        self.spawn_points = points;
        self
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}

/// Уровень: root точки + список префабов
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnLayout {
    pub root_points: Vec<SpawnPointDef>,
    pub prefabs: Vec<PrefabDef>,
}

impl SpawnLayout {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

fn default_active() -> bool {
    true
}

fn default_health() -> i32 {
    100
}

fn default_multiplier() -> f32 {
    1.0
}
