// catalog.rs — 场景表：场景记录、热点描述、导览文件

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, TourError};
use crate::hotspot::HotspotStyle;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Horizontal/vertical look angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewAngles {
    pub yaw: f32,
    pub pitch: f32,
}

impl ViewAngles {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Angles that point the camera (at the origin) straight at `point`.
    pub fn toward(point: Vec3) -> Self {
        let dir = point.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Self::default();
        }
        // 与 OrientationModel::look_direction 的球坐标互逆
        let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = dir.z.atan2(dir.x).to_degrees();
        Self { yaw, pitch }
    }
}

/// One navigable edge: (owning scene) --label--> target.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotDescriptor {
    pub target: SceneId,
    pub position: Vec3,
    pub label: String,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub id: SceneId,
    pub display_name: String,
    pub image_ref: PathBuf,
    pub initial_view: ViewAngles,
    pub hotspots: Vec<HotspotDescriptor>,
}

/// Immutable registry of every scene in a tour.
#[derive(Debug, Clone, Default)]
pub struct SceneCatalog {
    scenes: Vec<SceneRecord>,
    index: HashMap<SceneId, usize>,
}

impl SceneCatalog {
    /// Builds a catalog and checks that every hotspot target exists.
    pub fn new(scenes: Vec<SceneRecord>) -> Result<Self, ConfigurationError> {
        if scenes.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }

        let mut index = HashMap::with_capacity(scenes.len());
        for (i, scene) in scenes.iter().enumerate() {
            if index.insert(scene.id.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateScene(scene.id.clone()));
            }
        }

        for scene in &scenes {
            for hotspot in &scene.hotspots {
                if !index.contains_key(&hotspot.target) {
                    return Err(ConfigurationError::DanglingHotspot {
                        scene: scene.id.clone(),
                        target: hotspot.target.clone(),
                    });
                }
            }
        }

        Ok(Self { scenes, index })
    }

    pub fn get(&self, id: &SceneId) -> Option<&SceneRecord> {
        self.index.get(id).map(|&i| &self.scenes[i])
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scenes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneRecord> {
        self.scenes.iter()
    }
}

/// A catalog plus the entry points the viewer chrome needs.
#[derive(Debug, Clone)]
pub struct Tour {
    pub catalog: SceneCatalog,
    pub start: SceneId,
    pub lobby: Option<SceneId>,
    pub quick_switch: Option<(SceneId, SceneId)>,
    pub hotspot_style: HotspotStyle,
}

impl Tour {
    pub fn from_json_str(text: &str) -> Result<Self, TourError> {
        let file: TourFile = serde_json::from_str(text)?;
        Ok(file.into_tour()?)
    }

    pub fn load(path: &Path) -> Result<Self, TourError> {
        let text = std::fs::read_to_string(path).map_err(|source| TourError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Replaces the start scene, rejecting ids the catalog does not know.
    pub fn with_start(mut self, start: SceneId) -> Result<Self, ConfigurationError> {
        if !self.catalog.contains(&start) {
            return Err(ConfigurationError::UnknownStartScene(start));
        }
        self.start = start;
        Ok(self)
    }

    /// The scene the quick-switch button goes to from `current`.
    pub fn quick_switch_target(&self, current: Option<&SceneId>) -> Option<&SceneId> {
        let (a, b) = self.quick_switch.as_ref()?;
        if current == Some(a) {
            Some(b)
        } else {
            Some(a)
        }
    }

    /// The tour this viewer ships with.
    pub fn builtin() -> Self {
        fn hs(target: &str, [x, y, z]: [f32; 3], label: &str) -> HotspotDescriptor {
            HotspotDescriptor {
                target: target.into(),
                position: Vec3::new(x, y, z),
                label: label.to_string(),
                size: 30.0,
            }
        }
        fn scene(
            id: &str,
            name: &str,
            view: (f32, f32),
            hotspots: Vec<HotspotDescriptor>,
        ) -> SceneRecord {
            SceneRecord {
                id: id.into(),
                display_name: name.to_string(),
                image_ref: PathBuf::from(format!("images/{id}.png")),
                initial_view: ViewAngles::new(view.0, view.1),
                hotspots,
            }
        }

        let scenes = vec![
            scene("lobby", "大廳", (180.0, 0.0), vec![hs("lobby2", [-200.0, -20.0, 0.0], "梯廳")]),
            scene("ktv", "房間1", (180.0, 0.0), vec![hs("ktv2", [-200.0, 25.0, -35.0], "房間2")]),
            scene("ktv2", "房間2", (-140.0, -4.0), vec![hs("ktv", [-200.0, 5.0, -10.0], "房間1")]),
            scene(
                "lobby2",
                "梯廳",
                (180.0, 0.0),
                vec![
                    hs("ktv", [-100.0, -20.0, -250.0], "房間1"),
                    hs("lobby", [200.0, -20.0, 0.0], "回大廳"),
                    hs("aisle", [-100.0, -20.0, 10.0], "廊道1"),
                ],
            ),
            scene(
                "aisle",
                "廊道1",
                (180.0, 0.0),
                vec![
                    hs("lobby2", [0.0, -20.0, 100.0], "梯廳"),
                    hs("functionRoom", [-200.0, -50.0, -150.0], "多功能聽"),
                    hs("aisle2", [-100.0, -10.0, 0.0], "廊道2"),
                ],
            ),
            scene(
                "aisle2",
                "廊道2",
                (180.0, 0.0),
                vec![
                    hs("lounge", [-160.0, 0.0, 0.0], "交誼廳"),
                    hs("aisle", [-60.0, -10.0, -100.0], "廊道1"),
                ],
            ),
            scene(
                "lounge",
                "交誼廳",
                (180.0, 0.0),
                vec![
                    hs("aisle", [-120.0, 0.0, -150.0], "廊道1"),
                    hs("aisle2", [120.0, 0.0, -150.0], "廊道2"),
                ],
            ),
            scene(
                "functionRoom",
                "多功能聽",
                (-115.0, -10.0),
                vec![
                    hs("aisle", [50.0, 0.0, -50.0], "廊道1"),
                    hs("aisle2", [50.0, 0.0, 50.0], "廊道2"),
                ],
            ),
        ];

        // 内置数据在编译期固定，引用关系由 builtin_tour_is_consistent 测试保证
        let catalog = match SceneCatalog::new(scenes) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("built-in tour is inconsistent: {err}");
                SceneCatalog::default()
            }
        };

        Self {
            catalog,
            start: "ktv".into(),
            lobby: Some("lobby".into()),
            quick_switch: Some(("ktv".into(), "ktv2".into())),
            hotspot_style: HotspotStyle::LabeledPlane,
        }
    }
}

// ---------------- 导览文件格式 ----------------

#[derive(Debug, Deserialize)]
struct TourFile {
    start: Option<SceneId>,
    lobby: Option<SceneId>,
    quick_switch: Option<(SceneId, SceneId)>,
    #[serde(default)]
    hotspot_style: HotspotStyle,
    scenes: Vec<SceneEntry>,
}

#[derive(Debug, Deserialize)]
struct SceneEntry {
    id: SceneId,
    name: String,
    image: PathBuf,
    #[serde(default)]
    initial_view: ViewAngles,
    #[serde(default)]
    hotspots: Vec<HotspotEntry>,
}

#[derive(Debug, Deserialize)]
struct HotspotEntry {
    target: SceneId,
    position: [f32; 3],
    label: String,
    #[serde(default = "default_hotspot_size")]
    size: f32,
}

fn default_hotspot_size() -> f32 {
    30.0
}

impl TourFile {
    fn into_tour(self) -> Result<Tour, ConfigurationError> {
        let first = self.scenes.first().map(|s| s.id.clone());
        let scenes = self
            .scenes
            .into_iter()
            .map(|entry| SceneRecord {
                id: entry.id,
                display_name: entry.name,
                image_ref: entry.image,
                initial_view: entry.initial_view,
                hotspots: entry
                    .hotspots
                    .into_iter()
                    .map(|h| HotspotDescriptor {
                        target: h.target,
                        position: Vec3::from_array(h.position),
                        label: h.label,
                        size: h.size,
                    })
                    .collect(),
            })
            .collect();
        let catalog = SceneCatalog::new(scenes)?;

        let start = match self.start.or(first) {
            Some(start) => start,
            None => return Err(ConfigurationError::EmptyCatalog),
        };
        if !catalog.contains(&start) {
            return Err(ConfigurationError::UnknownStartScene(start));
        }
        for id in self
            .lobby
            .iter()
            .chain(self.quick_switch.iter().flat_map(|(a, b)| [a, b]))
        {
            if !catalog.contains(id) {
                return Err(ConfigurationError::UnknownScene(id.clone()));
            }
        }

        Ok(Tour {
            catalog,
            start,
            lobby: self.lobby,
            quick_switch: self.quick_switch,
            hotspot_style: self.hotspot_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, targets: &[&str]) -> SceneRecord {
        SceneRecord {
            id: id.into(),
            display_name: id.to_uppercase(),
            image_ref: PathBuf::from(format!("{id}.png")),
            initial_view: ViewAngles::default(),
            hotspots: targets
                .iter()
                .map(|t| HotspotDescriptor {
                    target: (*t).into(),
                    position: Vec3::new(-200.0, 0.0, 0.0),
                    label: t.to_string(),
                    size: 30.0,
                })
                .collect(),
        }
    }

    #[test]
    fn builtin_tour_is_consistent() {
        let tour = Tour::builtin();
        assert_eq!(tour.catalog.len(), 8);
        assert!(tour.catalog.contains(&tour.start));
        let lobby2 = tour.catalog.get(&"lobby2".into()).unwrap();
        assert_eq!(lobby2.hotspots.len(), 3);
        assert_eq!(lobby2.hotspots[1].label, "回大廳");
    }

    #[test]
    fn dangling_target_is_rejected() {
        let err = SceneCatalog::new(vec![record("a", &["b"])]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DanglingHotspot {
                scene: "a".into(),
                target: "b".into()
            }
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = SceneCatalog::new(vec![record("a", &[]), record("a", &[])]).unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateScene("a".into()));
    }

    #[test]
    fn cycles_are_allowed() {
        let catalog = SceneCatalog::new(vec![record("a", &["b"]), record("b", &["a"])]).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn toward_inverts_look_direction() {
        let angles = ViewAngles::toward(Vec3::new(-200.0, 0.0, 0.0));
        assert!((angles.yaw.abs() - 180.0).abs() < 1e-3);
        assert!(angles.pitch.abs() < 1e-3);

        let up = ViewAngles::toward(Vec3::new(0.0, 10.0, 10.0));
        assert!((up.pitch - 45.0).abs() < 1e-3);
        assert!((up.yaw - 90.0).abs() < 1e-3);
    }

    #[test]
    fn tour_file_defaults_start_to_first_scene() {
        let tour = Tour::from_json_str(
            r#"{ "scenes": [
                { "id": "a", "name": "A", "image": "a.png",
                  "hotspots": [ { "target": "b", "position": [1, 0, 0], "label": "to b" } ] },
                { "id": "b", "name": "B", "image": "b.png",
                  "initial_view": { "yaw": 90, "pitch": -4 } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(tour.start, SceneId::from("a"));
        assert_eq!(tour.hotspot_style, HotspotStyle::LabeledPlane);
        let a = tour.catalog.get(&"a".into()).unwrap();
        assert_eq!(a.hotspots[0].size, 30.0);
        let b = tour.catalog.get(&"b".into()).unwrap();
        assert_eq!(b.initial_view, ViewAngles::new(90.0, -4.0));
    }

    #[test]
    fn tour_file_rejects_unknown_lobby() {
        let err = Tour::from_json_str(
            r#"{ "lobby": "nowhere",
                 "scenes": [ { "id": "a", "name": "A", "image": "a.png" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TourError::Invalid(ConfigurationError::UnknownScene(id)) if id.as_str() == "nowhere"
        ));
    }

    #[test]
    fn quick_switch_toggles_between_pair() {
        let tour = Tour::builtin();
        let ktv = SceneId::from("ktv");
        let ktv2 = SceneId::from("ktv2");
        assert_eq!(tour.quick_switch_target(Some(&ktv)), Some(&ktv2));
        assert_eq!(tour.quick_switch_target(Some(&ktv2)), Some(&ktv));
        assert_eq!(tour.quick_switch_target(Some(&"aisle".into())), Some(&ktv));
        assert_eq!(tour.quick_switch_target(None), Some(&ktv));
    }
}
