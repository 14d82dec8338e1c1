use eframe::egui;
use lucide_icons::Icon;
use std::sync::Arc;

use super::fonts::icon_label;
use super::task::BackgroundTask;
use crate::catalog;
use crate::client::{EntryKind, HistoryEntry, HttpBackend, TranslateError, TranslateResult};
use crate::i18n;

const PREVIEW_CHARS: usize = 120;

/// Something the user asked to do with a history row.
pub enum HistoryAction {
    /// Put a text entry back into the editor with its language pair.
    Reuse(HistoryEntry),
}

/// Right-hand panel listing the backend's recent translations.
#[derive(Default)]
pub struct HistoryPanel {
    task: BackgroundTask<TranslateResult<Vec<HistoryEntry>>>,
    entries: Vec<HistoryEntry>,
    error: Option<TranslateError>,
    loaded_once: bool,
}

impl HistoryPanel {
    pub fn refresh(&mut self, ctx: &egui::Context, backend: Arc<HttpBackend>, limit: usize) {
        self.loaded_once = true;
        self.task.start(ctx, "history-fetch", move || backend.history(limit));
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        backend: &Arc<HttpBackend>,
        limit: usize,
    ) -> Option<HistoryAction> {
        if !self.loaded_once {
            self.refresh(ui.ctx(), backend.clone(), limit);
        }
        if let Some(result) = self.task.take() {
            match result {
                Ok(entries) => {
                    tracing::debug!("history: {} entries", entries.len());
                    self.entries = entries;
                    self.error = None;
                }
                Err(e) => {
                    tracing::error!("history fetch failed: {}", e);
                    self.error = Some(e);
                }
            }
        }

        let mut action = None;
        ui.horizontal(|ui| {
            ui.heading(icon_label(Icon::History, &i18n::tr("history-title")));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let refreshing = self.task.is_running();
                if refreshing {
                    ui.spinner();
                }
                let btn = egui::Button::new(icon_label(Icon::RefreshCw, ""));
                if ui
                    .add_enabled(!refreshing, btn)
                    .on_hover_text(i18n::tr("btn-refresh"))
                    .clicked()
                {
                    self.refresh(ui.ctx(), backend.clone(), limit);
                }
            });
        });
        ui.separator();

        if let Some(err) = &self.error {
            ui.colored_label(ui.visuals().error_fg_color, i18n::tr("history-failed"));
            ui.small(err.to_string());
            ui.add_space(6.0);
        }
        if self.entries.is_empty() && self.error.is_none() && !self.task.is_running() {
            ui.weak(i18n::tr("history-empty"));
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in &self.entries {
                    if let Some(a) = entry_card(ui, entry) {
                        action = Some(a);
                    }
                    ui.add_space(4.0);
                }
            });
        action
    }
}

fn entry_card(ui: &mut egui::Ui, entry: &HistoryEntry) -> Option<HistoryAction> {
    let mut action = None;
    egui::Frame::default()
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::symmetric(8, 6))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            let pair = format!(
                "{} → {}",
                catalog::display_name(entry.source_lang.as_deref().unwrap_or("?")),
                catalog::display_name(entry.target_lang.as_deref().unwrap_or("?"))
            );
            ui.horizontal(|ui| {
                let icon = match entry.kind() {
                    EntryKind::Text => Icon::Type,
                    EntryKind::Image => Icon::Image,
                };
                ui.label(icon_label(icon, &pair));
                if let Some(ts) = entry.created_at_display() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(ts);
                    });
                }
            });
            let source = match entry.kind() {
                EntryKind::Text => entry.source_text.clone().unwrap_or_default(),
                EntryKind::Image => entry.image_name.clone().unwrap_or_default(),
            };
            if !source.is_empty() {
                ui.weak(shorten(&source));
            }
            if let Some(out) = entry.translated_text.as_deref() {
                ui.label(shorten(out));
            }
            if entry.kind() == EntryKind::Text
                && entry.source_text.is_some()
                && ui.small_button(i18n::tr("btn-reuse")).clicked()
            {
                action = Some(HistoryAction::Reuse(entry.clone()));
            }
        });
    action
}

fn shorten(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::shorten;

    #[test]
    fn shorten_keeps_short_text_and_cuts_on_char_boundary() {
        assert_eq!(shorten("你好"), "你好");
        let long = "字".repeat(200);
        let cut = shorten(&long);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), 121);
    }
}
