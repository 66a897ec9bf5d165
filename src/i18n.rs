// i18n.rs
//
// Lightweight runtime i18n:
// - Strings live in either:
//   A) assets/i18n/<lang>.json
//   B) assets/i18n.json (single file, format: { "<lang>": { "key": "value" } })
// - Load order: selected lang -> built-in table for that lang -> built-in English
// - Lookup: tr("key") / tr_with("key", [("name", "...")]) with {name} placeholders
//
// Language comes from config::Args (--lang / PANORAMA_LANG), default zh-Hant.

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const DEFAULT_LANG: &str = "zh-Hant";
const FALLBACK_LANG: &str = "en";

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

static BUILTIN_EN: &[(&str, &str)] = &[
    ("app.title", "Panorama Tour"),
    ("menu.file", "File"),
    ("menu.open_tour", "Open Tour..."),
    ("menu.exit", "Exit"),
    ("menu.view", "View"),
    ("menu.language", "Language"),
    ("view.reset", "Reset View"),
    ("file.filter.tour", "Tour files"),
    ("button.switch_room", "Switch Room"),
    ("button.auto_rotate", "Auto Rotate"),
    ("button.return_lobby", "Lobby"),
    ("button.fullscreen", "Fullscreen"),
    ("button.dismiss", "OK"),
    ("status.loading", "Loading..."),
    ("status.load_failed", "Load failed: {err}"),
    ("status.check_path", "Please check the image path"),
    ("status.hotspots", "{count} hotspots"),
    ("status.hover", "Go to: {label}"),
    ("log.loading_image_bg", "loading image in background: {path}"),
    ("log.image_loaded_size", "image decoded: {w}x{h}"),
    ("log.scene_requested", "scene {scene} requested (generation {generation})"),
    ("log.stale_completion", "dropping stale load of {scene} (generation {generation})"),
    ("log.scene_loaded", "scene loaded: {name}, {count} hotspots ({released} released)"),
    ("log.click_was_drag", "pointer moved past threshold, click ignored"),
    ("log.hotspot_clicked", "hotspot clicked, going to {scene}"),
    ("log.auto_rotate", "auto-rotate {state}"),
    ("log.tour_opened", "tour opened: {path} ({count} scenes)"),
    ("error.scene_not_found", "scene not found: {scene}"),
    ("error.scene_load_failed", "failed to load scene {scene}: {err}"),
    ("error.send_to_main_failed", "failed to hand decoded image to the viewer"),
    ("error.tour_load_failed", "failed to open tour: {err}"),
    ("font.not_found", "no CJK-capable UI font found, labels may render as boxes"),
    ("font.using", "using UI font: {path}"),
    (
        "gpu.image_too_large_scaled",
        "image {src_w}x{src_h} exceeds GPU limit {max}, scaled to {new_w}x{new_h}",
    ),
];

static BUILTIN_ZH_HANT: &[(&str, &str)] = &[
    ("app.title", "全景導覽"),
    ("menu.file", "檔案"),
    ("menu.open_tour", "開啟導覽..."),
    ("menu.exit", "離開"),
    ("menu.view", "檢視"),
    ("menu.language", "語言"),
    ("view.reset", "重設視角"),
    ("file.filter.tour", "導覽檔"),
    ("button.switch_room", "切換房間"),
    ("button.auto_rotate", "自動旋轉"),
    ("button.return_lobby", "回大廳"),
    ("button.fullscreen", "全螢幕"),
    ("button.dismiss", "確定"),
    ("status.loading", "載入中..."),
    ("status.load_failed", "載入失敗：{err}"),
    ("status.check_path", "請確認圖片路徑正確"),
    ("status.hotspots", "{count} 個熱點"),
    ("status.hover", "前往：{label}"),
];

static BUILTIN: Lazy<HashMap<&'static str, HashMap<String, String>>> = Lazy::new(|| {
    let table = |entries: &[(&str, &str)]| {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    };
    HashMap::from([("en", table(BUILTIN_EN)), ("zh-Hant", table(BUILTIN_ZH_HANT))])
});

/// Languages offered in the UI menu.
pub const LANGUAGES: [(&str, &str); 2] = [("zh-Hant", "繁體中文"), ("en", "English")];

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn load_multi_lang_json(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: HashMap<String, HashMap<String, String>> = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

/// Looks for `relative` under `<exe_dir>/assets`, then `./assets`.
fn find_asset(relative: &Path) -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    exe_dir
        .into_iter()
        .chain(std::iter::once(PathBuf::new()))
        .map(|dir| dir.join("assets").join(relative))
        .find(|p| p.exists())
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    let mut map = BUILTIN.get(lang).cloned().unwrap_or_default();

    let from_disk = find_asset(&PathBuf::from("i18n").join(format!("{lang}.json")))
        .and_then(|p| load_json_map(&p))
        .or_else(|| find_asset(Path::new("i18n.json")).and_then(|p| load_multi_lang_json(&p, lang)));
    if let Some(overrides) = from_disk {
        map.extend(overrides);
    }
    map
}

/// Initialize global i18n. Safe to call multiple times; later calls overwrite current lang maps.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let i = I18n {
        map: load_lang(&lang),
        lang,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|i| i.lang.clone()))
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Get localized text by key. Falls back to built-in English, then to the key itself.
pub fn tr(key: &str) -> String {
    let selected = I18N
        .get()
        .and_then(|l| l.read().ok())
        .and_then(|i| i.map.get(key).cloned());
    if let Some(v) = selected {
        return v;
    }
    BUILTIN
        .get(FALLBACK_LANG)
        .and_then(|m| m.get(key).cloned())
        .unwrap_or_else(|| key.to_string())
}

/// Get localized text and substitute `{name}` placeholders.
/// Any placeholder not provided is kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}
