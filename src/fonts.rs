// fonts.rs — 为 egui 选择可显示繁体中文标签的字体
//
// 热点标签与场景名多为中文，egui 自带字体不含 CJK 字形。
// 运行时依次尝试：系统字体目录 → exe 同目录 ./assets → 工作目录 ./assets。
// ab_glyph 对 .ttc 支持不稳定，因此每个候选先解析一次，失败就跳过。

use std::path::{Path, PathBuf};

const WINDOWS_FONTS: &[&str] = &[
    "msjh.ttc",   // Microsoft JhengHei (繁中)
    "msjh.ttf",
    "mingliu.ttc",
    "msyh.ttf",   // Microsoft YaHei
    "simhei.ttf",
    "arialuni.ttf",
];

const MACOS_FONTS: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "/Library/Fonts/NotoSansTC-Regular.otf",
    "/Library/Fonts/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
];

const LINUX_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-zenhei/wqy-zenhei.ttc",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
];

const ASSET_FONTS: &[&str] = &[
    "NotoSansTC-Regular.otf",
    "NotoSansTC-Regular.ttf",
    "NotoSansCJK-Regular.ttc",
];

fn candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let dir = PathBuf::from(r"C:\Windows\Fonts");
        out.extend(WINDOWS_FONTS.iter().map(|f| dir.join(f)));
    } else if cfg!(target_os = "macos") {
        out.extend(MACOS_FONTS.iter().map(PathBuf::from));
    } else {
        out.extend(LINUX_FONTS.iter().map(PathBuf::from));
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            out.push(home.join(".local/share/fonts/NotoSansTC-Regular.otf"));
            out.push(home.join(".fonts/NotoSansTC-Regular.otf"));
        }
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        out.extend(ASSET_FONTS.iter().map(|f| dir.join("assets").join(f)));
    }
    out.extend(ASSET_FONTS.iter().map(|f| PathBuf::from("assets").join(f)));
    out
}

fn try_load_font(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
    Some(bytes)
}

pub fn install_ui_fonts(ctx: &egui::Context) {
    let Some((font_path, font_bytes)) = candidates()
        .into_iter()
        .find_map(|p| try_load_font(&p).map(|bytes| (p, bytes)))
    else {
        log::warn!("{}", tour_viewer::i18n::tr("font.not_found"));
        return;
    };

    log::info!(
        "{}",
        tour_viewer::i18n::tr_with("font.using", &[("path", font_path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.insert(0, "ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_dir_assets_are_always_candidates() {
        let list = candidates();
        assert!(list.contains(&PathBuf::from("assets").join("NotoSansTC-Regular.otf")));
    }

    #[test]
    fn non_font_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(try_load_font(&path).is_none());
        assert!(try_load_font(&dir.path().join("missing.ttf")).is_none());
    }
}
