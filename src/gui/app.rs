use eframe::egui::{self, FontFamily};
use lucide_icons::Icon;
use std::sync::Arc;

use super::fonts::{icon_label, ICON_FAMILY};
use super::history::{HistoryAction, HistoryPanel};
use super::settings::SettingsWindow;
use super::task::BackgroundTask;
use crate::catalog::{self, LANGUAGES};
use crate::client::{HealthStatus, HttpBackend, TranslateError, TranslateResult};
use crate::controller::{Action, Notice, Translator};
use crate::i18n;
use crate::preview::{decode_preview, PreviewSlot, SelectedImage};
use crate::settings::Settings;

const APP_TITLE: &str = "Open Translate";
const PREVIEW_MAX_HEIGHT: f32 = 150.0;

enum HealthView {
    Unknown,
    Ready,
    ModelLoading,
    Offline(TranslateError),
}

pub struct TranslateApp {
    settings: Settings,
    backend: Arc<HttpBackend>,
    translator: Translator,
    // Texture for the selected image; dropping it frees the GPU copy
    preview: PreviewSlot<egui::TextureHandle>,
    health_task: BackgroundTask<TranslateResult<HealthStatus>>,
    health: HealthView,
    history: HistoryPanel,
    show_history: bool,
    settings_window: SettingsWindow,
    status_message: Option<String>,
}

impl TranslateApp {
    pub fn new(ctx: &egui::Context, settings: Settings, backend: HttpBackend) -> Self {
        let backend = Arc::new(backend);
        let repaint_ctx = ctx.clone();
        let mut translator = Translator::new(backend.clone())
            .with_repaint(Arc::new(move || repaint_ctx.request_repaint()));
        translator.set_source_lang(settings.source_lang.clone());
        translator.set_target_lang(settings.target_lang.clone());

        let settings_window = SettingsWindow::new(&settings);
        let mut app = Self {
            settings,
            backend,
            translator,
            preview: PreviewSlot::new(),
            health_task: BackgroundTask::default(),
            health: HealthView::Unknown,
            history: HistoryPanel::default(),
            show_history: false,
            settings_window,
            status_message: None,
        };
        app.check_health(ctx);
        app
    }

    fn check_health(&mut self, ctx: &egui::Context) {
        let backend = self.backend.clone();
        self.health_task
            .start(ctx, "health-check", move || backend.health());
    }

    fn apply_settings(&mut self, ctx: &egui::Context, mut new_settings: Settings) {
        // The language pair is owned by the translator while running
        new_settings.source_lang = self.translator.source_lang().to_string();
        new_settings.target_lang = self.translator.target_lang().to_string();
        match HttpBackend::new(&new_settings.api_base(), new_settings.timeout()) {
            Ok(backend) => {
                tracing::info!("backend set to {}", backend.base());
                self.backend = Arc::new(backend);
                self.translator.set_backend(self.backend.clone());
            }
            Err(e) => {
                tracing::error!("keeping previous backend: {}", e);
                self.settings_window.set_status(e.to_string());
                return;
            }
        }
        i18n::set_ui_language_preference(&new_settings.ui_language);
        self.settings = new_settings;
        self.persist_settings();
        self.settings_window.set_status(i18n::tr("msg-settings-saved"));
        self.health = HealthView::Unknown;
        self.check_health(ctx);
        if self.show_history {
            let limit = self.settings.effective_history_limit();
            self.history.refresh(ctx, self.backend.clone(), limit);
        }
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save() {
            tracing::error!("failed to save settings: {:#}", e);
        }
    }

    /// Remember the pair across launches when the user changes it.
    fn sync_language_pair(&mut self) {
        let source = self.translator.source_lang();
        let target = self.translator.target_lang();
        if self.settings.source_lang != source || self.settings.target_lang != target {
            self.settings.source_lang = source.to_string();
            self.settings.target_lang = target.to_string();
            self.persist_settings();
        }
    }

    fn poll_health(&mut self) {
        if let Some(result) = self.health_task.take() {
            self.health = match result {
                Ok(status) if status.is_ok() && status.model_loaded => HealthView::Ready,
                Ok(status) if status.is_ok() => HealthView::ModelLoading,
                Ok(status) => HealthView::Offline(TranslateError::MalformedResponse(format!(
                    "status: {}",
                    status.status
                ))),
                Err(e) => {
                    tracing::warn!("health check failed: {}", e);
                    HealthView::Offline(e)
                }
            };
        }
    }

    fn pick_image(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title(i18n::tr("dialog-pick-image"))
            // Advisory only: whatever comes back is sent as-is
            .add_filter(
                i18n::tr("filter-images"),
                &["png", "jpg", "jpeg", "webp", "gif", "bmp"],
            )
            .add_filter(i18n::tr("filter-all-files"), &["*"])
            .pick_file();
        if let Some(path) = picked {
            self.translator.select_image_file(&path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(file) = dropped.into_iter().next() {
            if let Some(path) = file.path {
                self.translator.select_image_file(&path);
            } else if let Some(bytes) = file.bytes {
                let name = if file.name.is_empty() {
                    "image".to_string()
                } else {
                    file.name
                };
                self.translator.select_image(SelectedImage::new(name, bytes));
            }
        }
    }

    fn sync_preview(&mut self, ctx: &egui::Context) {
        let selection = self
            .translator
            .selected_image()
            .map(|img| (img.selection_id(), img.bytes.clone()));
        let id = selection.as_ref().map(|(id, _)| *id);
        self.preview.sync(id, || {
            let (id, bytes) = selection?;
            let color = decode_preview(&bytes)?;
            Some(ctx.load_texture(
                format!("image_preview_{}", id),
                color,
                egui::TextureOptions::LINEAR,
            ))
        });
    }

    fn header_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let strong = ui.visuals().strong_text_color();
            ui.label(
                egui::RichText::new(Icon::Languages.unicode())
                    .family(FontFamily::Name(ICON_FAMILY.into()))
                    .color(ui.visuals().selection.bg_fill)
                    .size(28.0),
            );
            ui.heading(egui::RichText::new(APP_TITLE).color(strong).size(24.0));
            ui.weak(i18n::tr("tagline"));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(icon_label(Icon::Settings, &i18n::tr("btn-settings")))
                    .clicked()
                {
                    self.settings_window.open(&self.settings);
                }
                if ui
                    .selectable_label(
                        self.show_history,
                        icon_label(Icon::History, &i18n::tr("btn-history")),
                    )
                    .clicked()
                {
                    self.show_history = !self.show_history;
                }
                let checking = self.health_task.is_running();
                if ui
                    .add_enabled(
                        !checking,
                        egui::Button::new(icon_label(Icon::RefreshCw, "")),
                    )
                    .on_hover_text(i18n::tr("btn-check-connection"))
                    .clicked()
                {
                    self.check_health(ui.ctx());
                }
                self.health_badge(ui, checking);
            });
        });
    }

    fn health_badge(&self, ui: &mut egui::Ui, checking: bool) {
        let (text, bg, icon) = if checking {
            (
                i18n::tr("status-checking"),
                egui::Color32::from_rgb(108, 117, 125),
                Icon::Loader,
            )
        } else {
            match &self.health {
                HealthView::Unknown => (
                    i18n::tr("status-unknown"),
                    egui::Color32::from_rgb(108, 117, 125),
                    Icon::Wifi,
                ),
                HealthView::Ready => (
                    i18n::tr("status-ready"),
                    egui::Color32::from_rgb(40, 167, 69),
                    Icon::Wifi,
                ),
                HealthView::ModelLoading => (
                    i18n::tr("status-model-loading"),
                    egui::Color32::from_rgb(255, 193, 7),
                    Icon::Loader,
                ),
                HealthView::Offline(_) => (
                    i18n::tr("status-offline"),
                    egui::Color32::from_rgb(220, 53, 69),
                    Icon::WifiOff,
                ),
            }
        };
        let resp = egui::Frame::default()
            .inner_margin(egui::Margin::symmetric(10, 4))
            .corner_radius(egui::CornerRadius::same(4))
            .fill(bg)
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(icon_label(icon, &text))
                        .color(egui::Color32::WHITE)
                        .strong(),
                );
            })
            .response;
        let hover = match &self.health {
            HealthView::Offline(e) => format!("{}\n{}", self.backend.base(), e),
            _ => self.backend.base().to_string(),
        };
        resp.on_hover_text(hover);
    }

    fn language_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(code) = language_combo(ui, "source_lang_combo", self.translator.source_lang())
            {
                self.translator.set_source_lang(code);
            }
            if ui
                .button(icon_label(Icon::ArrowLeftRight, ""))
                .on_hover_text(i18n::tr("btn-swap"))
                .clicked()
            {
                self.translator.swap_languages();
            }
            if let Some(code) = language_combo(ui, "target_lang_combo", self.translator.target_lang())
            {
                self.translator.set_target_lang(code);
            }
        });
    }

    fn source_ui(&mut self, ui: &mut egui::Ui) {
        ui.strong(i18n::tr("heading-source"));
        ui.add_space(4.0);
        ui.add(
            egui::TextEdit::multiline(self.translator.input_text_mut())
                .hint_text(i18n::tr("hint-enter-text"))
                .desired_rows(10)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui
                .button(icon_label(Icon::Upload, &i18n::tr("btn-upload-image")))
                .clicked()
            {
                self.pick_image();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let busy = self.translator.is_busy(Action::Text);
                let btn = egui::Button::new(i18n::tr("btn-translate")).min_size(egui::vec2(96.0, 28.0));
                if ui.add_enabled(self.translator.can_submit_text(), btn).clicked() {
                    self.translator.submit_text();
                }
                if busy {
                    ui.spinner();
                }
            });
        });

        let selected = self
            .translator
            .selected_image()
            .map(|img| (img.file_name.clone(), img.len()));
        if let Some((name, len)) = selected {
            ui.add_space(8.0);
            egui::Frame::default()
                .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                .corner_radius(egui::CornerRadius::same(6))
                .inner_margin(egui::Margin::same(8))
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        match self.preview.get() {
                            Some(tex) => {
                                ui.add(
                                    egui::Image::new(egui::load::SizedTexture::from_handle(tex))
                                        .max_height(PREVIEW_MAX_HEIGHT)
                                        .max_width(ui.available_width()),
                                );
                            }
                            None => {
                                ui.weak(i18n::tr("msg-no-preview"));
                            }
                        }
                        ui.small(format!("{} ({} KB)", name, len.div_ceil(1024)));
                        ui.horizontal(|ui| {
                            let busy = self.translator.is_busy(Action::Image);
                            if ui
                                .add_enabled(
                                    !busy,
                                    egui::Button::new(icon_label(
                                        Icon::Image,
                                        &i18n::tr("btn-translate-image"),
                                    )),
                                )
                                .clicked()
                            {
                                self.translator.submit_image();
                            }
                            if busy {
                                ui.spinner();
                            }
                            if ui
                                .add_enabled(!busy, egui::Button::new(icon_label(Icon::X, "")))
                                .on_hover_text(i18n::tr("btn-remove-image"))
                                .clicked()
                            {
                                self.translator.clear_image();
                            }
                        });
                    });
                });
        }
    }

    fn output_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong(i18n::tr("heading-translation"));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let has_output = !self.translator.output_text().is_empty();
                if ui
                    .add_enabled(has_output, egui::Button::new(icon_label(Icon::Copy, "")))
                    .on_hover_text(i18n::tr("btn-copy"))
                    .clicked()
                {
                    ui.ctx().copy_text(self.translator.output_text().to_string());
                    self.status_message = Some(i18n::tr("msg-copied"));
                }
            });
        });
        ui.add_space(4.0);
        egui::Frame::default()
            .fill(ui.visuals().extreme_bg_color)
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                ui.set_min_height(240.0);
                ui.set_width(ui.available_width());
                let output = self.translator.output_text();
                if output.is_empty() {
                    ui.weak(i18n::tr("hint-output-placeholder"));
                } else {
                    ui.add(egui::Label::new(output).selectable(true).wrap());
                }
            });
        if let Some(msg) = &self.status_message {
            ui.add_space(4.0);
            ui.weak(msg);
        }
    }

    fn notice_modal(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.translator.peek_notice().cloned() else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("translate_failure_notice")).show(ctx, |ui| {
            ui.set_width(360.0);
            ui.heading(notice_title(&notice));
            ui.add_space(6.0);
            ui.label(notice_message(&notice.error, self.backend.base()));
            ui.add_space(10.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.button(i18n::tr("btn-ok")).clicked()
            })
            .inner
        });
        if modal.inner || modal.should_close() {
            self.translator.take_notice();
        }
    }
}

fn language_combo(ui: &mut egui::Ui, id_salt: &str, current: &str) -> Option<&'static str> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(catalog::display_name(current))
        .width(180.0)
        .show_ui(ui, |ui| {
            for lang in LANGUAGES {
                if ui
                    .selectable_label(lang.code == current, lang.name)
                    .clicked()
                    && lang.code != current
                {
                    picked = Some(lang.code);
                }
            }
        });
    picked
}

fn notice_title(notice: &Notice) -> String {
    match notice.action {
        Action::Text => i18n::tr("notice-title-text"),
        Action::Image => i18n::tr("notice-title-image"),
    }
}

fn notice_message(error: &TranslateError, base: &str) -> String {
    let id = error.notice_id();
    match error {
        TranslateError::Unreachable(detail) => i18n::tr_args(
            id,
            &[("base", base.to_string()), ("detail", detail.clone())],
        ),
        TranslateError::Rejected { status, detail } => i18n::tr_args(
            id,
            &[("status", status.to_string()), ("detail", detail.clone())],
        ),
        TranslateError::MalformedResponse(detail) | TranslateError::InvalidRequest(detail) => {
            i18n::tr_args(id, &[("detail", detail.clone())])
        }
    }
}

impl eframe::App for TranslateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.translator.poll();
        self.poll_health();
        self.handle_dropped_files(ctx);
        self.sync_preview(ctx);

        let panel_fill = ctx.style().visuals.panel_fill;
        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::default()
                    .fill(panel_fill)
                    .inner_margin(egui::Margin::symmetric(15, 10)),
            )
            .show(ctx, |ui| self.header_ui(ui));

        if self.show_history {
            let limit = self.settings.effective_history_limit();
            let backend = self.backend.clone();
            let action = egui::SidePanel::right("history_panel")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| self.history.ui(ui, &backend, limit))
                .inner;
            if let Some(HistoryAction::Reuse(entry)) = action {
                self.translator
                    .set_input_text(entry.source_text.unwrap_or_default());
                if let Some(code) = entry.source_lang {
                    self.translator.set_source_lang(code);
                }
                if let Some(code) = entry.target_lang {
                    self.translator.set_target_lang(code);
                }
            }
        }

        egui::CentralPanel::default()
            .frame(
                egui::Frame::default()
                    .fill(panel_fill)
                    .inner_margin(egui::Margin::symmetric(15, 12)),
            )
            .show(ctx, |ui| {
                ui.spacing_mut().button_padding = egui::vec2(8.0, 5.0);
                self.language_row(ui);
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.columns(2, |cols| {
                            self.source_ui(&mut cols[0]);
                            self.output_ui(&mut cols[1]);
                        });
                    });
            });

        self.sync_language_pair();

        if let Some(new_settings) = self.settings_window.show(ctx) {
            self.apply_settings(ctx, new_settings);
        }
        self.notice_modal(ctx);

        if self.translator.is_busy(Action::Text) || self.translator.is_busy(Action::Image) {
            // Spinners animate; completions also wake us via the repaint callback
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
