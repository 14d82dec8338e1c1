use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::RwLock;
use unic_langid::LanguageIdentifier;

pub const ENV_UI_LANG: &str = "OPEN_TRANSLATE_UI_LANG";

const FTL_EN: &str = include_str!("../i18n/en/app.ftl");
const FTL_ZH_TW: &str = include_str!("../i18n/zh-TW/app.ftl");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiLang {
    En,
    ZhTw,
}

// Normalize locale strings like "zh_TW.UTF-8" or "zh-Hant-TW" to BCP47-ish form
fn normalize_locale_tag<S: AsRef<str>>(s: S) -> String {
    let mut tag = s.as_ref().trim().to_string();
    if let Some((lang_region, _encoding)) = tag.split_once('.') {
        tag = lang_region.to_string();
    }
    tag.replace('_', "-")
}

fn ui_lang_for_tag(tag: &str) -> Option<UiLang> {
    let norm = normalize_locale_tag(tag);
    let li = norm.parse::<LanguageIdentifier>().ok()?;
    match li.language.as_str() {
        // Only a Traditional Chinese bundle ships; Simplified users get it too.
        "zh" => Some(UiLang::ZhTw),
        "en" => Some(UiLang::En),
        _ => None,
    }
}

fn env_lang() -> Option<UiLang> {
    let s = std::env::var(ENV_UI_LANG).ok()?;
    let s = s.trim();
    if s.is_empty() || s == "auto" {
        return None;
    }
    ui_lang_for_tag(s)
}

fn detect_lang() -> UiLang {
    // 1) OS/UI locale via sys-locale
    if let Some(lang) = sys_locale::get_locale().and_then(|loc| ui_lang_for_tag(&loc)) {
        return lang;
    }

    // 2) Common UNIX envs as a last resort
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Some(lang) = std::env::var(key).ok().and_then(|v| ui_lang_for_tag(&v)) {
            return lang;
        }
    }

    UiLang::En
}

// The env override wins over the saved preference for this run
fn resolve_pref(pref: &str) -> UiLang {
    if let Some(lang) = env_lang() {
        return lang;
    }
    match pref.trim() {
        "" | "auto" => detect_lang(),
        p => ui_lang_for_tag(p).unwrap_or(UiLang::En),
    }
}

fn build_bundle(lang: UiLang) -> FluentBundle<FluentResource> {
    let (tag, ftl) = match lang {
        UiLang::En => ("en-US", FTL_EN),
        UiLang::ZhTw => ("zh-TW", FTL_ZH_TW),
    };
    let langid: LanguageIdentifier = tag.parse().unwrap_or_default();
    let mut bundle = FluentBundle::new(vec![langid]);
    // Translated output is shown verbatim; no bidi isolation marks around arguments.
    bundle.set_use_isolating(false);
    let resource = match FluentResource::try_new(ftl.to_owned()) {
        Ok(res) => res,
        Err((_, errs)) => {
            tracing::warn!("failed to parse FTL for {}: {:?}", tag, errs);
            if lang != UiLang::En {
                return build_bundle(UiLang::En);
            }
            return bundle;
        }
    };
    if let Err(errs) = bundle.add_resource(resource) {
        tracing::warn!("failed to add FTL resource for {}: {:?}", tag, errs);
        if lang != UiLang::En {
            return build_bundle(UiLang::En);
        }
    }
    bundle
}

fn format_with(bundle: &FluentBundle<FluentResource>, id: &str, args: Option<&FluentArgs>) -> String {
    if let Some(pattern) = bundle.get_message(id).and_then(|msg| msg.value()) {
        let mut errors = vec![];
        let value: Cow<str> = bundle.format_pattern(pattern, args, &mut errors);
        return value.into_owned();
    }
    id.to_string()
}

static LANG_PREF: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new(String::from("auto")));

thread_local! {
    // Bundles are not Sync; each thread keeps one for the current preference.
    static BUNDLE: RefCell<Option<(String, FluentBundle<FluentResource>)>> = const { RefCell::new(None) };
}

// Store UI language preference (auto/en/zh-TW); the cached bundle is rebuilt lazily
pub fn set_ui_language_preference(pref: &str) {
    if let Ok(mut g) = LANG_PREF.write() {
        *g = pref.to_string();
    }
}

fn current_pref() -> String {
    LANG_PREF
        .read()
        .map(|g| g.clone())
        .unwrap_or_else(|_| "auto".to_string())
}

fn translate(id: &str, args: Option<&FluentArgs>) -> String {
    let pref = current_pref();
    BUNDLE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let stale = slot.as_ref().map(|(p, _)| *p != pref).unwrap_or(true);
        if stale {
            *slot = Some((pref.clone(), build_bundle(resolve_pref(&pref))));
        }
        match slot.as_ref() {
            Some((_, bundle)) => format_with(bundle, id, args),
            None => id.to_string(),
        }
    })
}

pub fn tr(id: &str) -> String {
    translate(id, None)
}

/// `tr` with `{ $name }` placeholders filled from `args`.
pub fn tr_args(id: &str, args: &[(&str, String)]) -> String {
    let mut fargs = FluentArgs::new();
    for (name, value) in args {
        fargs.set(*name, value.clone());
    }
    translate(id, Some(&fargs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_tags_map_to_bundles() {
        assert_eq!(ui_lang_for_tag("zh_TW.UTF-8"), Some(UiLang::ZhTw));
        assert_eq!(ui_lang_for_tag("zh-Hant-HK"), Some(UiLang::ZhTw));
        assert_eq!(ui_lang_for_tag("en_GB"), Some(UiLang::En));
        assert_eq!(ui_lang_for_tag("fr-FR"), None);
        assert_eq!(resolve_pref("zh-TW"), UiLang::ZhTw);
        assert_eq!(resolve_pref("de"), UiLang::En);
    }

    #[test]
    fn both_bundles_define_the_same_messages() {
        let ids = |ftl: &str| {
            let mut ids: Vec<String> = ftl
                .lines()
                .filter(|l| l.starts_with(|c: char| c.is_ascii_alphabetic()))
                .filter_map(|l| l.split_once(" =").map(|(id, _)| id.trim().to_string()))
                .collect();
            ids.sort();
            ids
        };
        let (en, zh) = (FTL_EN, FTL_ZH_TW);
        assert!(!ids(en).is_empty());
        assert_eq!(ids(en), ids(zh));
    }

    #[test]
    fn arguments_are_substituted_and_unknown_ids_echo() {
        let bundle = build_bundle(UiLang::En);
        let mut args = FluentArgs::new();
        args.set("status", "502");
        args.set("detail", "Bad Gateway");
        let text = format_with(&bundle, "notice-rejected", Some(&args));
        assert!(text.contains("502"), "{}", text);
        assert!(text.contains("Bad Gateway"), "{}", text);
        assert_eq!(format_with(&bundle, "no-such-id", None), "no-such-id");
    }
}
