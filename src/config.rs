// config.rs — 命令行参数与运行时设置

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::catalog::{SceneId, Tour};
use crate::error::TourError;
use crate::hotspot::HotspotStyle;
use crate::navigation::ControllerSettings;

#[derive(Parser, Debug, Clone)]
#[command(about = "360° panorama tour viewer", version)]
pub struct Args {
    /// Tour JSON describing scenes and hotspots; the built-in tour when omitted
    #[arg(long)]
    pub tour: Option<PathBuf>,

    /// Directory that scene image paths are resolved against
    #[arg(long, default_value = ".")]
    pub assets: PathBuf,

    /// Scene to open first instead of the tour's start scene
    #[arg(long)]
    pub start: Option<String>,

    /// Hotspot look, overriding the tour file
    #[arg(long, value_enum)]
    pub hotspot_style: Option<HotspotStyle>,

    /// Start with auto-rotate enabled
    #[arg(long)]
    pub auto_rotate: bool,

    /// Give up on an image that has not arrived after this many seconds
    #[arg(long)]
    pub load_timeout: Option<f32>,

    /// UI language (zh-Hant, en)
    #[arg(long, env = "PANORAMA_LANG", default_value = crate::i18n::DEFAULT_LANG)]
    pub lang: String,
}

impl Args {
    /// Reads the tour file (or the built-in tour) and applies `--start`.
    pub fn resolve_tour(&self) -> Result<Tour, TourError> {
        let tour = match &self.tour {
            Some(path) => Tour::load(path)?,
            None => Tour::builtin(),
        };
        match &self.start {
            Some(start) => Ok(tour.with_start(SceneId::new(start.as_str()))?),
            None => Ok(tour),
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            auto_rotate: self.auto_rotate,
            load_timeout: self.load_timeout.and_then(load_timeout),
            hotspot_style: self.hotspot_style,
        }
    }
}

// 非正数、非有限值或超出 Duration 范围的值都视为不设超时
fn load_timeout(secs: f32) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    match Duration::try_from_secs_f32(secs) {
        Ok(timeout) => Some(timeout),
        Err(err) => {
            log::warn!("ignoring --load-timeout {secs}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigurationError;

    #[test]
    fn defaults_use_builtin_tour() {
        let args = Args::parse_from(["tour_viewer"]);
        assert_eq!(args.assets, PathBuf::from("."));
        let tour = args.resolve_tour().unwrap();
        assert_eq!(tour.start.as_str(), "ktv");
        let settings = args.controller_settings();
        assert!(!settings.auto_rotate);
        assert!(settings.load_timeout.is_none());
        assert!(settings.hotspot_style.is_none());
    }

    #[test]
    fn flags_are_parsed() {
        let args = Args::parse_from([
            "tour_viewer",
            "--start",
            "lounge",
            "--hotspot-style",
            "pulsing-marker",
            "--auto-rotate",
            "--load-timeout",
            "2.5",
            "--lang",
            "en",
        ]);
        assert_eq!(args.resolve_tour().unwrap().start.as_str(), "lounge");
        let settings = args.controller_settings();
        assert!(settings.auto_rotate);
        assert_eq!(settings.load_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(settings.hotspot_style, Some(HotspotStyle::PulsingMarker));
        assert_eq!(args.lang, "en");
    }

    #[test]
    fn out_of_range_timeouts_are_ignored() {
        for value in ["1e30", "0", "-3", "NaN", "inf"] {
            let args = Args::parse_from(["tour_viewer", "--load-timeout", value]);
            assert!(args.controller_settings().load_timeout.is_none(), "{value}");
        }
    }

    #[test]
    fn unknown_start_is_a_configuration_error() {
        let args = Args::parse_from(["tour_viewer", "--start", "attic"]);
        assert!(matches!(
            args.resolve_tour(),
            Err(TourError::Invalid(ConfigurationError::UnknownStartScene(_)))
        ));
    }

    #[test]
    fn tour_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tour.json");
        std::fs::write(
            &path,
            r#"{ "start": "b", "hotspot_style": "pulsing_marker", "scenes": [
                { "id": "a", "name": "A", "image": "a.jpg" },
                { "id": "b", "name": "B", "image": "b.jpg",
                  "hotspots": [ { "target": "a", "position": [0, 0, -100], "label": "A" } ] }
            ] }"#,
        )
        .unwrap();

        let args = Args::parse_from(["tour_viewer", "--tour", path.to_str().unwrap()]);
        let tour = args.resolve_tour().unwrap();
        assert_eq!(tour.start.as_str(), "b");
        assert_eq!(tour.hotspot_style, HotspotStyle::PulsingMarker);
        assert!(tour.lobby.is_none());
    }
}
