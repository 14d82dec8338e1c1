//! Interactive translation state and the actions that change it.
//!
//! Backend calls run on short-lived worker threads and report back over a
//! channel; the UI thread applies them in [`Translator::poll`]. Every
//! submission gets a sequence number, and only the most recent submission
//! may write the output.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::catalog::{DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
use crate::client::{
    ImageRequest, TextRequest, TranslateBackend, TranslateError, TranslateResult,
    TranslationResult,
};
use crate::preview::SelectedImage;

/// Called from a worker thread after it posts a completion (e.g. to wake the UI).
pub type RepaintCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Text,
    Image,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::Text => "text",
            Action::Image => "image",
        }
    }
}

/// A failure the user has not acknowledged yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: Action,
    pub error: TranslateError,
}

struct Completion {
    action: Action,
    seq: u64,
    result: TranslateResult<TranslationResult>,
}

pub struct Translator {
    backend: Arc<dyn TranslateBackend>,
    source_lang: String,
    target_lang: String,
    input_text: String,
    output_text: String,
    image: Option<SelectedImage>,
    next_selection: u64,
    next_seq: u64,
    // Seq of the newest submission of either kind; owns the output slot.
    latest_submission: u64,
    pending_text: Option<u64>,
    pending_image: Option<u64>,
    notices: VecDeque<Notice>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    repaint: Option<RepaintCallback>,
}

impl Translator {
    pub fn new(backend: Arc<dyn TranslateBackend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            input_text: String::new(),
            output_text: String::new(),
            image: None,
            next_selection: 1,
            next_seq: 1,
            latest_submission: 0,
            pending_text: None,
            pending_image: None,
            notices: VecDeque::new(),
            tx,
            rx,
            repaint: None,
        }
    }

    pub fn with_repaint(mut self, repaint: RepaintCallback) -> Self {
        self.repaint = Some(repaint);
        self
    }

    /// Requests already in flight keep the backend they started with.
    pub fn set_backend(&mut self, backend: Arc<dyn TranslateBackend>) {
        self.backend = backend;
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn set_source_lang(&mut self, code: impl Into<String>) {
        self.source_lang = code.into();
    }

    pub fn set_target_lang(&mut self, code: impl Into<String>) {
        self.target_lang = code.into();
    }

    pub fn swap_languages(&mut self) {
        std::mem::swap(&mut self.source_lang, &mut self.target_lang);
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn input_text_mut(&mut self) -> &mut String {
        &mut self.input_text
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    pub fn output_text(&self) -> &str {
        &self.output_text
    }

    pub fn is_busy(&self, action: Action) -> bool {
        match action {
            Action::Text => self.pending_text.is_some(),
            Action::Image => self.pending_image.is_some(),
        }
    }

    pub fn can_submit_text(&self) -> bool {
        !self.is_busy(Action::Text) && !self.input_text.trim().is_empty()
    }

    pub fn selected_image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    /// Replace the held image. The preview derived from the previous one is
    /// released by whoever holds it once they see the new selection id.
    pub fn select_image(&mut self, mut image: SelectedImage) {
        image.selection_id = self.next_selection;
        self.next_selection += 1;
        tracing::info!(
            "selected image '{}' ({} bytes)",
            image.file_name,
            image.len()
        );
        self.image = Some(image);
    }

    /// Read `path` and select it. An unreadable file becomes a notice.
    pub fn select_image_file(&mut self, path: &Path) -> bool {
        match SelectedImage::from_path(path) {
            Ok(image) => {
                self.select_image(image);
                true
            }
            Err(e) => {
                tracing::error!("failed to read image {}: {}", path.display(), e);
                self.notices.push_back(Notice {
                    action: Action::Image,
                    error: TranslateError::InvalidRequest(format!("{}: {}", path.display(), e)),
                });
                false
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Translate the current input text. Returns `false` without touching
    /// any state when the input is empty or whitespace.
    pub fn submit_text(&mut self) -> bool {
        if self.input_text.trim().is_empty() {
            return false;
        }
        let request = TextRequest {
            text: self.input_text.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        };
        let seq = self.begin(Action::Text);
        let backend = self.backend.clone();
        self.spawn(Action::Text, seq, move || backend.translate_text(&request));
        true
    }

    /// Translate the selected image. Returns `false` when none is selected.
    pub fn submit_image(&mut self) -> bool {
        let Some(image) = self.image.as_ref() else {
            return false;
        };
        let request = ImageRequest {
            file_name: image.file_name.clone(),
            bytes: image.bytes.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        };
        let seq = self.begin(Action::Image);
        let backend = self.backend.clone();
        self.spawn(Action::Image, seq, move || backend.translate_image(&request));
        true
    }

    /// Apply every completion that has arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Block until one completion arrives (or `timeout` passes) and apply it.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply(completion);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn peek_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    fn begin(&mut self, action: Action) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_submission = seq;
        *self.pending_mut(action) = Some(seq);
        tracing::debug!("{} request #{} submitted", action.label(), seq);
        seq
    }

    fn spawn<F>(&mut self, action: Action, seq: u64, call: F)
    where
        F: FnOnce() -> TranslateResult<TranslationResult> + Send + 'static,
    {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let spawned = thread::Builder::new()
            .name(format!("translate-{}-{}", action.label(), seq))
            .spawn(move || {
                let result = call();
                // Receiver gone means the view was torn down; nothing to update.
                let _ = tx.send(Completion {
                    action,
                    seq,
                    result,
                });
                if let Some(repaint) = repaint {
                    repaint();
                }
            });
        if let Err(e) = spawned {
            self.apply(Completion {
                action,
                seq,
                result: Err(TranslateError::InvalidRequest(format!(
                    "failed to start worker: {}",
                    e
                ))),
            });
        }
    }

    fn pending_mut(&mut self, action: Action) -> &mut Option<u64> {
        match action {
            Action::Text => &mut self.pending_text,
            Action::Image => &mut self.pending_image,
        }
    }

    fn apply(&mut self, completion: Completion) {
        let Completion {
            action,
            seq,
            result,
        } = completion;
        let pending = self.pending_mut(action);
        let latest_of_action = *pending == Some(seq);
        if latest_of_action {
            *pending = None;
        }
        match result {
            Ok(result) if seq == self.latest_submission => {
                tracing::info!(
                    "{} request #{} translated ({} chars)",
                    action.label(),
                    seq,
                    result.translated_text.chars().count()
                );
                self.output_text = result.translated_text;
            }
            Ok(_) => {
                tracing::debug!(
                    "discarding {} result #{}; #{} is newer",
                    action.label(),
                    seq,
                    self.latest_submission
                );
            }
            Err(error) => {
                tracing::error!("{} translation #{} failed: {}", action.label(), seq, error);
                if latest_of_action {
                    self.notices.push_back(Notice { action, error });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    type Reply = TranslateResult<TranslationResult>;

    /// In-memory backend. Requests keyed in `gates` block until the test
    /// sends their reply; everything else gets `fallback` immediately.
    struct FakeBackend {
        text_calls: Mutex<Vec<TextRequest>>,
        image_calls: Mutex<Vec<ImageRequest>>,
        gates: Mutex<HashMap<String, mpsc::Receiver<Reply>>>,
        fallback: Reply,
    }

    impl FakeBackend {
        fn replying(fallback: Reply) -> Arc<Self> {
            Arc::new(Self {
                text_calls: Mutex::new(Vec::new()),
                image_calls: Mutex::new(Vec::new()),
                gates: Mutex::new(HashMap::new()),
                fallback,
            })
        }

        fn ok(text: &str) -> Arc<Self> {
            Self::replying(Ok(ok_reply(text)))
        }

        fn gate(&self, key: &str) -> mpsc::Sender<Reply> {
            let (tx, rx) = mpsc::channel();
            self.gates.lock().unwrap().insert(key.to_string(), rx);
            tx
        }

        fn reply_for(&self, key: &str) -> Reply {
            let gate = self.gates.lock().unwrap().remove(key);
            match gate {
                Some(rx) => rx.recv().unwrap(),
                None => self.fallback.clone(),
            }
        }

        fn text_calls(&self) -> Vec<TextRequest> {
            self.text_calls.lock().unwrap().clone()
        }

        fn image_calls(&self) -> Vec<ImageRequest> {
            self.image_calls.lock().unwrap().clone()
        }
    }

    impl TranslateBackend for FakeBackend {
        fn translate_text(&self, request: &TextRequest) -> Reply {
            self.text_calls.lock().unwrap().push(request.clone());
            self.reply_for(&request.text)
        }

        fn translate_image(&self, request: &ImageRequest) -> Reply {
            self.image_calls.lock().unwrap().push(request.clone());
            self.reply_for(&request.file_name)
        }
    }

    fn ok_reply(text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: text.to_string(),
        }
    }

    fn translator(backend: &Arc<FakeBackend>) -> Translator {
        Translator::new(backend.clone())
    }

    #[test]
    fn defaults_to_english_to_traditional_chinese() {
        let backend = FakeBackend::ok("unused");
        let t = translator(&backend);
        assert_eq!(t.source_lang(), "en");
        assert_eq!(t.target_lang(), "zh-TW");
        assert!(!t.is_busy(Action::Text));
        assert!(!t.is_busy(Action::Image));
    }

    #[test]
    fn empty_or_whitespace_text_is_a_silent_no_op() {
        let backend = FakeBackend::ok("unused");
        let mut t = translator(&backend);
        for input in ["", "   ", "\n\t "] {
            t.set_input_text(input);
            assert!(!t.submit_text());
            assert!(!t.is_busy(Action::Text));
        }
        assert!(!t.wait_for_completion(Duration::from_millis(50)));
        assert!(backend.text_calls().is_empty());
        assert!(t.peek_notice().is_none());
        assert_eq!(t.output_text(), "");
    }

    #[test]
    fn text_submission_sends_one_request_and_updates_output() {
        let backend = FakeBackend::ok("你好");
        let mut t = translator(&backend);
        t.set_input_text("Hello");

        assert!(t.submit_text());
        assert!(t.wait_for_completion(WAIT));

        assert_eq!(
            backend.text_calls(),
            vec![TextRequest {
                text: "Hello".into(),
                source_lang: "en".into(),
                target_lang: "zh-TW".into(),
            }]
        );
        assert_eq!(t.output_text(), "你好");
        assert!(!t.is_busy(Action::Text));
    }

    #[test]
    fn image_submission_without_selection_is_a_no_op() {
        let backend = FakeBackend::ok("unused");
        let mut t = translator(&backend);
        assert!(!t.submit_image());
        assert!(!t.is_busy(Action::Image));
        assert!(!t.wait_for_completion(Duration::from_millis(50)));
        assert!(backend.image_calls().is_empty());
        assert_eq!(t.output_text(), "");
    }

    #[test]
    fn selected_image_is_sent_with_current_pair() {
        let backend = FakeBackend::ok("X");
        let mut t = translator(&backend);
        t.set_source_lang("ja");
        t.set_target_lang("en");
        t.select_image(SelectedImage::new("menu.jpg", b"\xff\xd8jpeg-bytes".to_vec()));

        assert!(t.submit_image());
        assert!(t.wait_for_completion(WAIT));

        let calls = backend.image_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_name, "menu.jpg");
        assert_eq!(&calls[0].bytes[..], b"\xff\xd8jpeg-bytes");
        assert_eq!(calls[0].source_lang, "ja");
        assert_eq!(calls[0].target_lang, "en");
        assert_eq!(t.output_text(), "X");
        assert!(!t.is_busy(Action::Image));
    }

    #[test]
    fn busy_is_held_until_resolution_and_cleared_on_failure() {
        let backend = FakeBackend::ok("unused");
        let release = backend.gate("Hello");
        let mut t = translator(&backend);
        t.set_input_text("Hello");

        assert!(t.submit_text());
        assert!(t.is_busy(Action::Text));
        assert!(!t.can_submit_text());
        assert!(!t.is_busy(Action::Image));
        assert_eq!(t.poll(), 0);
        assert!(t.is_busy(Action::Text));

        release
            .send(Err(TranslateError::Unreachable("connection refused".into())))
            .unwrap();
        assert!(t.wait_for_completion(WAIT));

        assert!(!t.is_busy(Action::Text));
        let notice = t.take_notice().unwrap();
        assert_eq!(notice.action, Action::Text);
        assert!(matches!(notice.error, TranslateError::Unreachable(_)));
        assert!(t.take_notice().is_none());
    }

    #[test]
    fn image_failure_clears_image_busy_and_queues_image_notice() {
        let backend = FakeBackend::ok("unused");
        let release = backend.gate("scan.png");
        let mut t = translator(&backend);
        t.select_image(SelectedImage::new("scan.png", vec![1u8, 2, 3]));

        assert!(t.submit_image());
        assert!(t.is_busy(Action::Image));
        assert!(!t.is_busy(Action::Text));

        release
            .send(Err(TranslateError::Rejected {
                status: 422,
                detail: "unsupported image".into(),
            }))
            .unwrap();
        assert!(t.wait_for_completion(WAIT));

        assert!(!t.is_busy(Action::Image));
        let notice = t.take_notice().unwrap();
        assert_eq!(notice.action, Action::Image);
        assert_eq!(notice.error.notice_id(), "notice-rejected");
        assert_eq!(t.output_text(), "");
        assert!(t.selected_image().is_some());
    }

    #[test]
    fn older_text_result_is_dropped_after_newer_image_fails() {
        let backend = FakeBackend::ok("unused");
        let text = backend.gate("Hello");
        let image = backend.gate("scan.png");
        let mut t = translator(&backend);
        t.set_input_text("Hello");
        t.select_image(SelectedImage::new("scan.png", vec![9u8]));

        t.submit_text();
        t.submit_image();

        image
            .send(Err(TranslateError::Unreachable("timed out".into())))
            .unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.take_notice().unwrap().action, Action::Image);

        text.send(Ok(ok_reply("from text"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "");
        assert!(!t.is_busy(Action::Text));
        assert!(t.peek_notice().is_none());
    }

    #[test]
    fn failure_keeps_previous_output() {
        let backend = FakeBackend::replying(Err(TranslateError::Rejected {
            status: 500,
            detail: "boom".into(),
        }));
        let ok = backend.gate("first");
        let mut t = translator(&backend);

        t.set_input_text("first");
        t.submit_text();
        ok.send(Ok(ok_reply("premier"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "premier");

        t.set_input_text("second");
        t.submit_text();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "premier");
        assert_eq!(t.take_notice().unwrap().error.notice_id(), "notice-rejected");
    }

    #[test]
    fn language_setters_touch_only_their_field() {
        let backend = FakeBackend::ok("unused");
        let mut t = translator(&backend);
        t.set_input_text("keep");

        t.set_source_lang("ja");
        assert_eq!((t.source_lang(), t.target_lang()), ("ja", "zh-TW"));
        t.set_target_lang("ja");
        assert_eq!((t.source_lang(), t.target_lang()), ("ja", "ja"));
        t.set_source_lang("de");
        t.swap_languages();
        assert_eq!((t.source_lang(), t.target_lang()), ("ja", "de"));

        assert_eq!(t.input_text(), "keep");
        assert!(!t.is_busy(Action::Text));
        assert!(!t.wait_for_completion(Duration::from_millis(50)));
        assert!(backend.text_calls().is_empty());
    }

    #[test]
    fn latest_submission_wins_when_older_resolves_last() {
        let backend = FakeBackend::ok("unused");
        let first = backend.gate("first");
        let second = backend.gate("second");
        let mut t = translator(&backend);

        t.set_input_text("first");
        t.submit_text();
        t.set_input_text("second");
        t.submit_text();

        second.send(Ok(ok_reply("SECOND"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "SECOND");
        assert!(!t.is_busy(Action::Text));

        first.send(Ok(ok_reply("FIRST"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "SECOND");
        assert!(!t.is_busy(Action::Text));
    }

    #[test]
    fn stale_response_resolving_first_is_discarded() {
        let backend = FakeBackend::ok("unused");
        let first = backend.gate("first");
        let second = backend.gate("second");
        let mut t = translator(&backend);

        t.set_input_text("first");
        t.submit_text();
        t.set_input_text("second");
        t.submit_text();

        first
            .send(Err(TranslateError::Unreachable("late".into())))
            .unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "");
        assert!(t.is_busy(Action::Text));
        assert!(t.peek_notice().is_none());

        second.send(Ok(ok_reply("SECOND"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert_eq!(t.output_text(), "SECOND");
        assert!(!t.is_busy(Action::Text));
    }

    #[test]
    fn text_and_image_busy_states_are_independent() {
        let backend = FakeBackend::ok("unused");
        let text = backend.gate("Hello");
        let image = backend.gate("scan.png");
        let mut t = translator(&backend);
        t.set_input_text("Hello");
        t.select_image(SelectedImage::new("scan.png", vec![1u8, 2, 3]));

        t.submit_text();
        t.submit_image();
        assert!(t.is_busy(Action::Text));
        assert!(t.is_busy(Action::Image));

        image.send(Ok(ok_reply("from image"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert!(t.is_busy(Action::Text));
        assert!(!t.is_busy(Action::Image));
        assert_eq!(t.output_text(), "from image");

        // Submitted before the image, so it no longer owns the output.
        text.send(Ok(ok_reply("from text"))).unwrap();
        assert!(t.wait_for_completion(WAIT));
        assert!(!t.is_busy(Action::Text));
        assert_eq!(t.output_text(), "from image");
    }

    #[test]
    fn reselecting_changes_selection_id() {
        let backend = FakeBackend::ok("unused");
        let mut t = translator(&backend);
        t.select_image(SelectedImage::new("a.png", vec![1u8]));
        let first = t.selected_image().unwrap().selection_id();
        t.select_image(SelectedImage::new("a.png", vec![1u8]));
        let second = t.selected_image().unwrap().selection_id();
        assert_ne!(first, second);

        t.clear_image();
        assert!(t.selected_image().is_none());
        assert!(!t.submit_image());
    }

    #[test]
    fn unreadable_file_becomes_notice() {
        let backend = FakeBackend::ok("unused");
        let mut t = translator(&backend);
        let dir = tempfile::tempdir().unwrap();
        assert!(!t.select_image_file(&dir.path().join("missing.png")));
        assert!(t.selected_image().is_none());
        let notice = t.take_notice().unwrap();
        assert_eq!(notice.action, Action::Image);
        assert!(matches!(notice.error, TranslateError::InvalidRequest(_)));
    }

    #[test]
    fn repaint_callback_fires_after_completion() {
        let backend = FakeBackend::ok("done");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut t = translator(&backend).with_repaint(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        t.set_input_text("x");
        t.submit_text();
        assert!(t.wait_for_completion(WAIT));
        // The callback runs right after the send; give the worker a moment.
        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
