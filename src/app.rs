//! Application state tree.
//!
//! All mutable state lives in one [`App`] value owned by the event loop.
//! Spawned tasks never touch it directly; they post [`AppEvent`]s and the
//! loop applies them here, one atomic mutation per completed async step.

use std::time::{Duration, Instant};

use crate::history::{HistoryEntry, HistoryStore};
use crate::models::{AnalysisResult, AppEvent, ActionKind, DiffToken, Jd, ParseKind, Resume, RewriteTarget};
use crate::router::{Route, RouteV1};
use crate::settings::{SettingsStore, UserSettings};
use crate::theme::ColorScheme;

const TOAST_TTL: Duration = Duration::from_secs(4);
const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// Number of editable rows on the settings view.
pub const SETTINGS_ROWS: usize = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Editor,
    Results,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Editor, Tab::Results, Tab::History, Tab::Settings];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Editor => "Editor",
            Tab::Results => "Results",
            Tab::History => "History",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditorPane {
    Resume,
    Jd,
}

impl EditorPane {
    pub fn other(self) -> Self {
        match self {
            EditorPane::Resume => EditorPane::Jd,
            EditorPane::Jd => EditorPane::Resume,
        }
    }

    pub fn kind(self) -> ParseKind {
        match self {
            EditorPane::Resume => ParseKind::Resume,
            EditorPane::Jd => ParseKind::Jd,
        }
    }
}

/// What a path typed into the prompt bar will be used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathAction {
    /// Read a local text file into the focused editor pane.
    LoadText,
    /// Send the file to the backend's multipart upload endpoint.
    Upload,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the focused editor pane.
    EditText,
    /// Typing a file path into the prompt bar.
    PathPrompt(PathAction),
    /// Typing a JD title override into the prompt bar.
    TitlePrompt,
    /// Waiting for y/n on history clear.
    ConfirmClear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// The interactive rewrite dialog over one experience bullet.
pub struct RewriteDrawer {
    pub exp: usize,
    pub bullet: usize,
    pub original: String,
    pub rewritten: Option<String>,
    pub diff: Vec<DiffToken>,
}

pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    pub input_mode: InputMode,

    // Editor view
    pub editor_focus: EditorPane,
    pub resume_text: String,
    pub jd_text: String,
    pub resume_scroll: u16,
    pub jd_scroll: u16,
    pub prompt_buffer: String,

    // Documents (client-owned for the session)
    pub resume: Option<Resume>,
    pub jd: Option<Jd>,
    pub analysis: Option<AnalysisResult>,

    // Results view
    pub bullet_sel: usize,
    pub drawer: Option<RewriteDrawer>,

    // History view
    pub history: HistoryStore,
    pub history_sel: usize,

    // Settings view
    pub settings: UserSettings,
    pub settings_store: SettingsStore,
    pub settings_sel: usize,

    // Per-action busy flags keying the loading indicators
    pub parsing: Option<ParseKind>,
    pub analyzing: bool,
    pub rewriting: bool,
    pub batch: Option<(usize, usize)>,
    pub exporting: bool,

    pub backend_ok: Option<bool>,
    toast: Option<(String, ToastKind, Instant)>,
    spinner_idx: usize,
    theme: ColorScheme,
}

impl App {
    pub fn new(settings: UserSettings, settings_store: SettingsStore, history: HistoryStore) -> Self {
        Self {
            should_quit: false,
            tab: Tab::Editor,
            input_mode: InputMode::Normal,
            editor_focus: EditorPane::Resume,
            resume_text: String::new(),
            jd_text: String::new(),
            resume_scroll: 0,
            jd_scroll: 0,
            prompt_buffer: String::new(),
            resume: None,
            jd: None,
            analysis: None,
            bullet_sel: 0,
            drawer: None,
            history,
            history_sel: 0,
            settings,
            settings_store,
            settings_sel: 0,
            parsing: None,
            analyzing: false,
            rewriting: false,
            batch: None,
            exporting: false,
            backend_ok: None,
            toast: None,
            spinner_idx: 0,
            theme: ColorScheme::default(),
        }
    }

    pub fn theme(&self) -> &ColorScheme {
        &self.theme
    }

    // ----- routing -----

    pub fn apply_route(&mut self, route: &Route) {
        let Route::V1(v1) = route;
        self.tab = match v1 {
            RouteV1::Editor => Tab::Editor,
            RouteV1::Results => Tab::Results,
            RouteV1::History => Tab::History,
            RouteV1::Settings => Tab::Settings,
        };
    }

    pub fn next_tab(&mut self) {
        let idx = (self.tab.index() + 1) % Tab::ALL.len();
        self.tab = Tab::ALL[idx];
    }

    pub fn prev_tab(&mut self) {
        let idx = (self.tab.index() + Tab::ALL.len() - 1) % Tab::ALL.len();
        self.tab = Tab::ALL[idx];
    }

    // ----- toasts / spinner -----

    pub fn toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some((message.into(), kind, Instant::now()));
    }

    pub fn toast_message(&self) -> Option<(&str, ToastKind)> {
        match &self.toast {
            Some((msg, kind, at)) if at.elapsed() < TOAST_TTL => Some((msg.as_str(), *kind)),
            _ => None,
        }
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_idx = (self.spinner_idx + 1) % SPINNER_FRAMES.len();
    }

    pub fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_idx]
    }

    /// One-line description of whatever is in flight, for the header.
    pub fn busy_line(&self) -> Option<String> {
        if let Some(kind) = self.parsing {
            return Some(format!("parsing {kind}..."));
        }
        if self.analyzing {
            return Some("analyzing...".to_string());
        }
        if let Some((done, total)) = self.batch {
            return Some(format!("rewriting bullets {done}/{total}..."));
        }
        if self.rewriting {
            return Some("rewriting...".to_string());
        }
        if self.exporting {
            return Some("exporting...".to_string());
        }
        None
    }

    // ----- editor helpers -----

    pub fn focused_text_mut(&mut self) -> &mut String {
        match self.editor_focus {
            EditorPane::Resume => &mut self.resume_text,
            EditorPane::Jd => &mut self.jd_text,
        }
    }

    pub fn focused_text(&self) -> &str {
        match self.editor_focus {
            EditorPane::Resume => &self.resume_text,
            EditorPane::Jd => &self.jd_text,
        }
    }

    pub fn focused_scroll_mut(&mut self) -> &mut u16 {
        match self.editor_focus {
            EditorPane::Resume => &mut self.resume_scroll,
            EditorPane::Jd => &mut self.jd_scroll,
        }
    }

    /// Apply a user-supplied title override to the parsed JD.
    pub fn override_jd_title(&mut self, title: &str) {
        if let Some(jd) = &mut self.jd {
            let title = title.trim();
            jd.title = if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            };
        }
    }

    // ----- results helpers -----

    /// Flattened (experience index, bullet index) list for selection.
    pub fn bullet_refs(&self) -> Vec<(usize, usize)> {
        let mut refs = Vec::new();
        if let Some(resume) = &self.resume {
            for (e, item) in resume.experience.iter().enumerate() {
                for (b, _) in item.bullets.iter().enumerate() {
                    refs.push((e, b));
                }
            }
        }
        refs
    }

    pub fn selected_bullet(&self) -> Option<(usize, usize, &str)> {
        let refs = self.bullet_refs();
        let (e, b) = *refs.get(self.bullet_sel)?;
        let text = self.resume.as_ref()?.experience.get(e)?.bullets.get(b)?;
        Some((e, b, text.as_str()))
    }

    pub fn move_bullet_sel(&mut self, delta: isize) {
        let len = self.bullet_refs().len();
        if len == 0 {
            self.bullet_sel = 0;
            return;
        }
        let cur = self.bullet_sel as isize;
        self.bullet_sel = (cur + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Keywords handed to the rewrite endpoint: missing skills first, then the
    /// normalized JD skill list.
    pub fn rewrite_keywords(&self) -> Vec<String> {
        let mut keywords = Vec::new();
        if let Some(analysis) = &self.analysis {
            keywords.extend(analysis.missing.iter().cloned());
            for s in &analysis.normalized_jd.skills {
                if !keywords.contains(s) {
                    keywords.push(s.clone());
                }
            }
        } else if let Some(jd) = &self.jd {
            keywords.extend(jd.skills.iter().cloned());
        }
        keywords
    }

    pub fn open_drawer(&mut self) -> Option<String> {
        let (exp, bullet, text) = self.selected_bullet()?;
        let original = text.to_string();
        self.drawer = Some(RewriteDrawer {
            exp,
            bullet,
            original: original.clone(),
            rewritten: None,
            diff: Vec::new(),
        });
        Some(original)
    }

    /// Closing the drawer just stops listening; an in-flight rewrite
    /// completes or fails in the background and its result is dropped.
    pub fn close_drawer(&mut self) {
        self.drawer = None;
        self.rewriting = false;
    }

    /// Accept the drawer's rewritten text into the resume.
    pub fn apply_drawer_rewrite(&mut self) {
        let Some(drawer) = &self.drawer else { return };
        let Some(rewritten) = drawer.rewritten.clone() else {
            return;
        };
        let (exp, bullet) = (drawer.exp, drawer.bullet);
        self.set_bullet(exp, bullet, rewritten);
        self.drawer = None;
        self.toast("Bullet updated", ToastKind::Success);
    }

    fn set_bullet(&mut self, exp: usize, bullet: usize, text: String) {
        if let Some(resume) = &mut self.resume {
            if let Some(item) = resume.experience.get_mut(exp) {
                if let Some(slot) = item.bullets.get_mut(bullet) {
                    *slot = text;
                }
            }
        }
    }

    // ----- history helpers -----

    pub fn move_history_sel(&mut self, delta: isize) {
        let len = self.history.len();
        if len == 0 {
            self.history_sel = 0;
            return;
        }
        let cur = self.history_sel as isize;
        self.history_sel = (cur + delta).clamp(0, len as isize - 1) as usize;
    }

    /// Restore the selected snapshot triple and jump to results.
    pub fn restore_history_entry(&mut self) {
        let Some(entry) = self.history.entries().get(self.history_sel).cloned() else {
            return;
        };
        self.resume = Some(entry.resume);
        self.jd = Some(entry.jd);
        self.analysis = Some(entry.analysis);
        self.bullet_sel = 0;
        self.tab = Tab::Results;
        self.toast(format!("Restored \"{}\"", entry.job_title), ToastKind::Info);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.history_sel = 0;
        self.toast("History cleared", ToastKind::Info);
    }

    // ----- settings helpers -----

    pub fn move_settings_sel(&mut self, delta: isize) {
        let cur = self.settings_sel as isize;
        self.settings_sel = (cur + delta).clamp(0, SETTINGS_ROWS as isize - 1) as usize;
    }

    /// Adjust the selected settings row. `delta` is -1/+1 from left/right
    /// keys; toggles ignore the sign. Every change persists immediately.
    pub fn adjust_setting(&mut self, delta: i64) {
        match self.settings_sel {
            0 => {
                let v = self.settings.rewrite_max_words as i64 + delta * 5;
                self.settings.rewrite_max_words = v.clamp(5, 80) as u32;
            }
            1 => self.settings.export_style = self.settings.export_style.toggle(),
            2 => self.settings.auto_save_history = !self.settings.auto_save_history,
            3 => self.settings.show_advanced_analysis = !self.settings.show_advanced_analysis,
            4 => {
                let v = self.settings.request_timeout_ms as i64 + delta * 5_000;
                self.settings.request_timeout_ms = v.clamp(5_000, 120_000) as u64;
            }
            _ => {}
        }
        self.settings_store.save(&self.settings);
    }

    // ----- event application -----

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ResumeParsed(resume) => {
                self.parsing = None;
                self.toast(
                    format!("Resume parsed: {} skills found", resume.skills.len()),
                    ToastKind::Success,
                );
                self.resume = Some(*resume);
                self.bullet_sel = 0;
            }
            AppEvent::JdParsed(jd) => {
                self.parsing = None;
                self.toast(
                    format!("JD parsed: \"{}\"", jd.display_title()),
                    ToastKind::Success,
                );
                self.jd = Some(*jd);
            }
            AppEvent::AnalyzeDone(analysis) => {
                self.analyzing = false;
                if self.settings.auto_save_history {
                    if let (Some(resume), Some(jd)) = (&self.resume, &self.jd) {
                        self.history
                            .insert(HistoryEntry::capture(resume, jd, &analysis));
                        self.history_sel = 0;
                    }
                }
                self.toast(format!("Match score: {}", analysis.score), ToastKind::Success);
                self.analysis = Some(*analysis);
                self.tab = Tab::Results;
            }
            AppEvent::RewriteDone {
                target,
                rewritten,
                diff,
            } => match target {
                RewriteTarget::Drawer => {
                    self.rewriting = false;
                    // Drawer may have been closed while the call was in
                    // flight; the result is dropped in that case.
                    if let Some(drawer) = &mut self.drawer {
                        drawer.rewritten = Some(rewritten);
                        drawer.diff = diff;
                    }
                }
                RewriteTarget::Bullet { exp, bullet } => {
                    self.set_bullet(exp, bullet, rewritten);
                }
            },
            AppEvent::BatchProgress { done, total } => {
                self.batch = Some((done, total));
            }
            AppEvent::BatchDone => {
                self.batch = None;
                self.toast("Batch rewrite finished", ToastKind::Success);
            }
            AppEvent::ExportDone { path } => {
                self.exporting = false;
                self.toast(format!("Saved {}", path.display()), ToastKind::Success);
            }
            AppEvent::HealthChecked { ok } => {
                self.backend_ok = Some(ok);
            }
            AppEvent::ActionFailed { action, message } => {
                match action {
                    ActionKind::ParseResume | ActionKind::ParseJd => self.parsing = None,
                    ActionKind::Analyze => self.analyzing = false,
                    ActionKind::Rewrite => self.rewriting = false,
                    ActionKind::BatchRewrite => {}
                    ActionKind::Export => self.exporting = false,
                    ActionKind::Health => self.backend_ok = Some(false),
                }
                if action != ActionKind::Health {
                    self.toast(format!("{}: {message}", action.label()), ToastKind::Error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyzeSections, ExperienceItem, NormalizedJd};
    use tempfile::tempdir;

    fn test_app(dir: &std::path::Path) -> App {
        App::new(
            UserSettings::default(),
            SettingsStore::new(dir),
            HistoryStore::load(dir),
        )
    }

    fn sample_resume() -> Resume {
        Resume {
            skills: vec!["Rust".into()],
            experience: vec![ExperienceItem {
                company: "Acme".into(),
                role: "Engineer".into(),
                location: None,
                start: "2021".into(),
                end: None,
                bullets: vec!["Did a thing".into(), "Did another".into()],
            }],
            ..Default::default()
        }
    }

    fn sample_analysis(score: u8) -> AnalysisResult {
        AnalysisResult {
            score,
            matched: vec!["Rust".into()],
            missing: vec!["Go".into()],
            sections: AnalyzeSections {
                skills_coverage_pct: 50,
                preferred_coverage_pct: 0,
                domain_coverage_pct: 40,
                recency_score_pct: None,
                hygiene_score_pct: None,
            },
            normalized_jd: NormalizedJd {
                skills: vec!["Rust".into(), "Go".into()],
                responsibilities: vec![],
            },
            hygiene_flags: None,
        }
    }

    #[test]
    fn analyze_done_saves_history_and_switches_to_results() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.resume = Some(sample_resume());
        app.jd = Some(Jd::default());

        app.on_event(AppEvent::AnalyzeDone(Box::new(sample_analysis(72))));

        assert_eq!(app.tab, Tab::Results);
        assert!(!app.analyzing);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.entries()[0].score, 72);
    }

    #[test]
    fn analyze_done_skips_history_when_auto_save_off() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.settings.auto_save_history = false;
        app.resume = Some(sample_resume());
        app.jd = Some(Jd::default());

        app.on_event(AppEvent::AnalyzeDone(Box::new(sample_analysis(50))));

        assert!(app.history.is_empty());
        assert!(app.analysis.is_some());
    }

    #[test]
    fn drawer_result_is_dropped_after_close() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.resume = Some(sample_resume());
        app.open_drawer().unwrap();
        app.close_drawer();

        app.on_event(AppEvent::RewriteDone {
            target: RewriteTarget::Drawer,
            rewritten: "Better bullet".into(),
            diff: Vec::new(),
        });

        // Stopped listening: nothing applied, nothing reopened.
        assert!(app.drawer.is_none());
        assert_eq!(
            app.resume.as_ref().unwrap().experience[0].bullets[0],
            "Did a thing"
        );
    }

    #[test]
    fn batch_rewrite_applies_directly_to_bullets() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.resume = Some(sample_resume());

        app.on_event(AppEvent::RewriteDone {
            target: RewriteTarget::Bullet { exp: 0, bullet: 1 },
            rewritten: "Did another, measurably".into(),
            diff: Vec::new(),
        });

        assert_eq!(
            app.resume.as_ref().unwrap().experience[0].bullets[1],
            "Did another, measurably"
        );
    }

    #[test]
    fn restore_pairs_all_three_snapshots() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.resume = Some(sample_resume());
        app.jd = Some(Jd {
            title: Some("Platform Engineer".into()),
            ..Default::default()
        });
        app.on_event(AppEvent::AnalyzeDone(Box::new(sample_analysis(65))));

        // Wipe session state, then restore from history.
        app.resume = None;
        app.jd = None;
        app.analysis = None;
        app.history_sel = 0;
        app.restore_history_entry();

        assert!(app.resume.is_some());
        assert_eq!(app.jd.as_ref().unwrap().display_title(), "Platform Engineer");
        assert_eq!(app.analysis.as_ref().unwrap().score, 65);
        assert_eq!(app.tab, Tab::Results);
    }

    #[test]
    fn bullet_selection_clamps_to_flattened_list() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.resume = Some(sample_resume());

        app.move_bullet_sel(10);
        assert_eq!(app.bullet_sel, 1);
        app.move_bullet_sel(-10);
        assert_eq!(app.bullet_sel, 0);
    }

    #[test]
    fn adjust_setting_clamps_and_persists(){
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.settings_sel = 0;
        for _ in 0..40 {
            app.adjust_setting(1);
        }
        assert_eq!(app.settings.rewrite_max_words, 80);

        // Persisted synchronously on every change.
        let reloaded = SettingsStore::new(dir.path()).load();
        assert_eq!(reloaded.rewrite_max_words, 80);
    }
}
