use eframe::egui;

use crate::i18n;
use crate::settings::{Settings, ENV_BACKEND_URL};

const UI_LANGUAGES: &[(&str, &str)] = &[
    ("auto", "option-auto-os"),
    ("en", "option-english"),
    ("zh-TW", "option-traditional-chinese"),
];

/// Settings dialog editing a draft copy; the app applies it on save.
pub struct SettingsWindow {
    open: bool,
    draft: Settings,
    use_custom_timeout: bool,
    timeout_secs: u64,
    save_status_message: Option<String>,
}

impl SettingsWindow {
    pub fn new(current: &Settings) -> Self {
        let mut window = Self {
            open: false,
            draft: current.clone(),
            use_custom_timeout: false,
            timeout_secs: 60,
            save_status_message: None,
        };
        window.reset_from(current);
        window
    }

    pub fn open(&mut self, current: &Settings) {
        self.reset_from(current);
        self.open = true;
    }

    fn reset_from(&mut self, current: &Settings) {
        self.draft = current.clone();
        self.use_custom_timeout = current.timeout().is_some();
        if let Some(secs) = current.timeout_secs.filter(|s| *s > 0) {
            self.timeout_secs = secs;
        }
        self.save_status_message = None;
    }

    pub fn set_status(&mut self, message: String) {
        self.save_status_message = Some(message);
    }

    /// Draw the window. Returns the edited settings when the user saved.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<Settings> {
        if !self.open {
            return None;
        }
        let mut saved = None;
        let mut keep_open = true;
        let mut close_clicked = false;
        egui::Window::new(i18n::tr("settings-title"))
            .open(&mut keep_open)
            .collapsible(false)
            .resizable(false)
            .default_width(420.0)
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label(i18n::tr("label-backend-url"));
                        ui.add(
                            egui::TextEdit::singleline(&mut self.draft.backend_url)
                                .hint_text("http://localhost:8000")
                                .desired_width(260.0),
                        );
                        ui.end_row();

                        ui.label(i18n::tr("label-api-prefix"));
                        ui.add(
                            egui::TextEdit::singleline(&mut self.draft.api_prefix)
                                .hint_text("/api")
                                .desired_width(120.0),
                        );
                        ui.end_row();

                        ui.label(i18n::tr("label-timeout"));
                        ui.horizontal(|ui| {
                            ui.checkbox(&mut self.use_custom_timeout, "");
                            ui.add_enabled(
                                self.use_custom_timeout,
                                egui::DragValue::new(&mut self.timeout_secs)
                                    .range(1..=600)
                                    .suffix(" s"),
                            );
                            if !self.use_custom_timeout {
                                ui.weak(i18n::tr("hint-timeout-default"));
                            }
                        });
                        ui.end_row();

                        ui.label(i18n::tr("label-history-limit"));
                        ui.add(egui::DragValue::new(&mut self.draft.history_limit).range(1..=100));
                        ui.end_row();

                        ui.label(i18n::tr("label-ui-language"));
                        let current = UI_LANGUAGES
                            .iter()
                            .find(|(code, _)| *code == self.draft.ui_language)
                            .map(|(_, id)| i18n::tr(id))
                            .unwrap_or_else(|| self.draft.ui_language.clone());
                        egui::ComboBox::from_id_salt("ui_lang_combo")
                            .selected_text(current)
                            .show_ui(ui, |ui| {
                                for (code, id) in UI_LANGUAGES {
                                    if ui
                                        .selectable_label(self.draft.ui_language == *code, i18n::tr(id))
                                        .clicked()
                                    {
                                        self.draft.ui_language = code.to_string();
                                    }
                                }
                            });
                        ui.end_row();
                    });

                if let Some(url) = self.draft.env_backend_url.as_deref() {
                    ui.add_space(6.0);
                    ui.colored_label(
                        ui.visuals().warn_fg_color,
                        i18n::tr_args(
                            "hint-env-override",
                            &[("var", ENV_BACKEND_URL.to_string()), ("url", url.to_string())],
                        ),
                    );
                }
                ui.add_space(4.0);
                ui.weak(format!(
                    "{} {}",
                    i18n::tr("label-effective-base"),
                    self.draft.api_base()
                ));

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button(i18n::tr("btn-save")).clicked() {
                        self.draft.timeout_secs = if self.use_custom_timeout {
                            Some(self.timeout_secs)
                        } else {
                            None
                        };
                        saved = Some(self.draft.clone());
                    }
                    if ui.button(i18n::tr("btn-close")).clicked() {
                        close_clicked = true;
                    }
                    if let Some(msg) = &self.save_status_message {
                        ui.weak(msg);
                    }
                });
            });
        if !keep_open || close_clicked {
            self.open = false;
        }
        saved
    }
}
