use eframe::egui;
use std::sync::Arc;

pub const ICON_FAMILY: &str = "lucide";

fn read_first_existing(paths: &[&str]) -> Option<(String, Vec<u8>)> {
    paths
        .iter()
        .find_map(|p| std::fs::read(p).ok().map(|data| (p.to_string(), data)))
}

// Prefer fonts covering Traditional Chinese first; zh-TW is the default target.
#[cfg(target_os = "macos")]
const CJK_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/opt/homebrew/share/fonts/NotoSansCJK-Regular.ttc",
    "/usr/local/share/fonts/NotoSansCJK-Regular.ttc",
];

#[cfg(target_os = "windows")]
const CJK_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\msjh.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\YuGothR.ttc",
    "C:\\Windows\\Fonts\\malgun.ttf",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\mingliub.ttc",
];

#[cfg(all(not(target_os = "macos"), not(target_os = "windows")))]
const CJK_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/arphic/uming.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/unfonts-core/UnDotum.ttf",
];

/// Register the icon font and a system CJK fallback so Chinese, Japanese and
/// Korean output renders instead of tofu.
pub fn setup_custom_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    fonts.font_data.insert(
        ICON_FAMILY.to_owned(),
        Arc::new(egui::FontData::from_static(
            lucide_icons::lucide_font_bytes(),
        )),
    );
    // Lucide glyphs live in the private-use area, so appending to
    // Proportional lets "{icon} {label}" strings render in one run.
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .push(ICON_FAMILY.to_owned());
    fonts
        .families
        .entry(egui::FontFamily::Name(ICON_FAMILY.into()))
        .or_default()
        .insert(0, ICON_FAMILY.to_owned());

    match read_first_existing(CJK_CANDIDATES) {
        Some((path, cjk)) => {
            tracing::info!("CJK fallback font: {}", path);
            fonts.font_data.insert(
                "cjk_fallback".to_owned(),
                Arc::new(egui::FontData::from_owned(cjk)),
            );
            // After the default Latin fonts: only glyphs they lack come from here
            for fam in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts
                    .families
                    .entry(fam)
                    .or_default()
                    .push("cjk_fallback".to_owned());
            }
        }
        None => tracing::warn!("no CJK font found; translated text may not render"),
    }

    ctx.set_fonts(fonts);
}

/// Icon glyph followed by a label, for buttons and headings.
pub fn icon_label(icon: lucide_icons::Icon, label: &str) -> String {
    format!("{} {}", icon.unicode(), label)
}
