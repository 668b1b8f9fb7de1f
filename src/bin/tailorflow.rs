// Native binary for TailorFlow - terminal UI mode

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::Path, path::PathBuf, time::Duration};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use tailorflow::{
    api::ApiClient,
    app::{App, EditorPane, InputMode, PathAction, Tab, ToastKind},
    config::{self, Config},
    export,
    history::HistoryStore,
    models::{ActionKind, AppEvent, RewriteTarget},
    router,
    settings::SettingsStore,
    ui, validation,
};

const TICK: Duration = Duration::from_millis(50);
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cfg = config::load().context("Failed to load configuration")?;

    let settings_store = SettingsStore::new(&cfg.data_dir);
    let settings = settings_store.load();
    let history = HistoryStore::load(&cfg.data_dir);

    let mut app = App::new(settings, settings_store, history);

    // Apply deep link route from CLI args (if provided)
    // Example: ./tailorflow tailorflow://v1/history
    if let Some(raw) = &cfg.route {
        match router::parse(raw) {
            Some(route) => {
                app.apply_route(&route);
                log::info!("Applied deep link route from CLI: {raw}");
            }
            None => log::warn!("Ignoring unrecognized route: {raw}"),
        }
    }

    // app + channels
    let (tx, rx) = unbounded_channel::<AppEvent>();

    // Periodic connectivity probe for the header status dot
    {
        let api = api_client(&app, &cfg);
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                let ok = api.health().await.unwrap_or(false);
                if tx.send(AppEvent::HealthChecked { ok }).is_err() {
                    break;
                }
                tokio::time::sleep(HEALTH_INTERVAL).await;
            }
        });
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &mut app, &cfg, tx, rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    cfg: &Config,
    tx: UnboundedSender<AppEvent>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Apply whatever the spawned tasks finished since the last frame.
        while let Ok(event) = rx.try_recv() {
            app.on_event(event);
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, app, cfg, &tx);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Build a client reflecting the current settings. The persisted timeout wins
/// unless one was passed explicitly on the CLI/env for this run.
fn api_client(app: &App, cfg: &Config) -> ApiClient {
    let timeout_ms = if cfg.timeout_explicit {
        cfg.timeout_ms
    } else {
        app.settings.request_timeout_ms
    };
    ApiClient::new(
        cfg.api_url.clone(),
        cfg.api_token.clone(),
        timeout_ms,
        cfg.retries,
    )
}

// ===============================
// Key dispatch
// ===============================

fn handle_key(key: KeyEvent, app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::EditText => edit_text_key(key, app),
        InputMode::PathPrompt(action) => prompt_key(key, app, |app, buffer| {
            submit_path(action, buffer, app, cfg, tx);
        }),
        InputMode::TitlePrompt => prompt_key(key, app, |app, buffer| {
            app.override_jd_title(&buffer);
            app.toast("Title updated", ToastKind::Info);
        }),
        InputMode::ConfirmClear => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.clear_history();
                app.input_mode = InputMode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
            }
            _ => {}
        },
        InputMode::Normal => normal_key(key, app, cfg, tx),
    }
}

fn edit_text_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.focused_text_mut().push('\n'),
        KeyCode::Backspace => {
            app.focused_text_mut().pop();
        }
        KeyCode::Char(c) => app.focused_text_mut().push(c),
        _ => {}
    }
}

/// Shared editing for the one-line prompt bar; `submit` runs on Enter with
/// the finished buffer.
fn prompt_key(key: KeyEvent, app: &mut App, submit: impl FnOnce(&mut App, String)) {
    match key.code {
        KeyCode::Esc => {
            app.prompt_buffer.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            let buffer = std::mem::take(&mut app.prompt_buffer);
            app.input_mode = InputMode::Normal;
            submit(app, buffer);
        }
        KeyCode::Backspace => {
            app.prompt_buffer.pop();
        }
        KeyCode::Char(c) => app.prompt_buffer.push(c),
        _ => {}
    }
}

fn normal_key(key: KeyEvent, app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    // The rewrite drawer swallows input while open.
    if app.drawer.is_some() {
        match key.code {
            KeyCode::Enter => app.apply_drawer_rewrite(),
            KeyCode::Esc => app.close_drawer(),
            _ => {}
        }
        return;
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => {
            app.tab = Tab::Editor;
            return;
        }
        KeyCode::Char('2') => {
            app.tab = Tab::Results;
            return;
        }
        KeyCode::Char('3') => {
            app.tab = Tab::History;
            return;
        }
        KeyCode::Char('4') => {
            app.tab = Tab::Settings;
            return;
        }
        // Tab cycles views everywhere except the editor, where it switches
        // the focused text pane instead.
        KeyCode::Tab if app.tab != Tab::Editor => {
            app.next_tab();
            return;
        }
        KeyCode::BackTab => {
            app.prev_tab();
            return;
        }
        _ => {}
    }

    match app.tab {
        Tab::Editor => editor_key(key, app, cfg, tx),
        Tab::Results => results_key(key, app, cfg, tx),
        Tab::History => history_key(key, app),
        Tab::Settings => settings_key(key, app),
    }
}

fn editor_key(key: KeyEvent, app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Tab => app.editor_focus = app.editor_focus.other(),
        KeyCode::Char('e') => app.input_mode = InputMode::EditText,
        KeyCode::Char('o') => {
            app.prompt_buffer.clear();
            app.input_mode = InputMode::PathPrompt(PathAction::LoadText);
        }
        KeyCode::Char('u') => {
            app.prompt_buffer.clear();
            app.input_mode = InputMode::PathPrompt(PathAction::Upload);
        }
        KeyCode::Char('p') => start_parse(app, cfg, tx),
        KeyCode::Char('a') => start_analyze(app, cfg, tx),
        KeyCode::Up => {
            let scroll = app.focused_scroll_mut();
            *scroll = scroll.saturating_sub(1);
        }
        KeyCode::Down => {
            let scroll = app.focused_scroll_mut();
            *scroll = scroll.saturating_add(1);
        }
        _ => {}
    }
}

fn results_key(key: KeyEvent, app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_bullet_sel(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_bullet_sel(-1),
        KeyCode::Char('r') => start_rewrite(app, cfg, tx),
        KeyCode::Char('b') => start_batch_rewrite(app, cfg, tx),
        KeyCode::Char('t') => {
            if app.jd.is_some() {
                app.prompt_buffer = app
                    .jd
                    .as_ref()
                    .and_then(|jd| jd.title.clone())
                    .unwrap_or_default();
                app.input_mode = InputMode::TitlePrompt;
            } else {
                app.toast("Parse a JD first", ToastKind::Error);
            }
        }
        KeyCode::Char('x') => start_export(app, cfg, tx),
        KeyCode::Char('a') => start_analyze(app, cfg, tx),
        _ => {}
    }
}

fn history_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_history_sel(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_history_sel(-1),
        KeyCode::Enter => app.restore_history_entry(),
        KeyCode::Char('c') => {
            if !app.history.is_empty() {
                app.input_mode = InputMode::ConfirmClear;
            }
        }
        _ => {}
    }
}

fn settings_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_settings_sel(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_settings_sel(-1),
        KeyCode::Left => app.adjust_setting(-1),
        KeyCode::Right | KeyCode::Enter => app.adjust_setting(1),
        _ => {}
    }
}

// ===============================
// Actions (validate, flag busy, spawn, post events)
// ===============================

fn start_parse(app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    let pane = app.editor_focus;
    let text = app.focused_text().to_string();
    let check = match pane {
        EditorPane::Resume => validation::validate_resume_text(&text),
        EditorPane::Jd => validation::validate_jd_text(&text),
    };
    if let Err(msg) = check {
        app.toast(msg, ToastKind::Error);
        return;
    }
    if app.parsing.is_some() {
        return;
    }
    app.parsing = Some(pane.kind());

    let api = api_client(app, cfg);
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match pane {
            EditorPane::Resume => match api.parse_resume(&text, None).await {
                Ok(resume) => AppEvent::ResumeParsed(Box::new(resume)),
                Err(e) => AppEvent::ActionFailed {
                    action: ActionKind::ParseResume,
                    message: e.to_string(),
                },
            },
            EditorPane::Jd => match api.parse_jd(&text, None).await {
                Ok(jd) => AppEvent::JdParsed(Box::new(jd)),
                Err(e) => AppEvent::ActionFailed {
                    action: ActionKind::ParseJd,
                    message: e.to_string(),
                },
            },
        };
        let _ = tx.send(event);
    });
}

fn submit_path(
    action: PathAction,
    buffer: String,
    app: &mut App,
    cfg: &Config,
    tx: &UnboundedSender<AppEvent>,
) {
    let path = PathBuf::from(buffer.trim());
    if path.as_os_str().is_empty() {
        return;
    }

    match action {
        PathAction::LoadText => match std::fs::read_to_string(&path) {
            Ok(text) => {
                *app.focused_text_mut() = text;
                app.toast(format!("Loaded {}", path.display()), ToastKind::Info);
            }
            Err(e) => app.toast(format!("Cannot read {}: {e}", path.display()), ToastKind::Error),
        },
        PathAction::Upload => {
            if app.parsing.is_some() {
                return;
            }
            let pane = app.editor_focus;
            app.parsing = Some(pane.kind());

            let api = api_client(app, cfg);
            let tx = tx.clone();
            tokio::spawn(async move {
                let event = match pane {
                    EditorPane::Resume => match api.parse_upload_resume(&path).await {
                        Ok(resume) => AppEvent::ResumeParsed(Box::new(resume)),
                        Err(e) => AppEvent::ActionFailed {
                            action: ActionKind::ParseResume,
                            message: e.to_string(),
                        },
                    },
                    EditorPane::Jd => match api.parse_upload_jd(&path).await {
                        Ok(jd) => AppEvent::JdParsed(Box::new(jd)),
                        Err(e) => AppEvent::ActionFailed {
                            action: ActionKind::ParseJd,
                            message: e.to_string(),
                        },
                    },
                };
                let _ = tx.send(event);
            });
        }
    }
}

fn start_analyze(app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    // Validation gates run before any network call.
    if let Err(msg) = validation::validate_resume_text(&app.resume_text) {
        app.toast(msg, ToastKind::Error);
        return;
    }
    if let Err(msg) = validation::validate_jd_text(&app.jd_text) {
        app.toast(msg, ToastKind::Error);
        return;
    }
    let (Some(resume), Some(jd)) = (app.resume.clone(), app.jd.clone()) else {
        app.toast("Parse both documents first (p)", ToastKind::Error);
        return;
    };
    if app.analyzing {
        return;
    }
    app.analyzing = true;

    let api = api_client(app, cfg);
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match api.analyze(&resume, &jd).await {
            Ok(analysis) => AppEvent::AnalyzeDone(Box::new(analysis)),
            Err(e) => AppEvent::ActionFailed {
                action: ActionKind::Analyze,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event);
    });
}

fn start_rewrite(app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    if app.rewriting {
        return;
    }
    let Some(original) = app.open_drawer() else {
        app.toast("No bullet selected", ToastKind::Error);
        return;
    };
    if let Err(msg) = validation::validate_rewrite_text(&original) {
        app.close_drawer();
        app.toast(msg, ToastKind::Error);
        return;
    }
    app.rewriting = true;

    let api = api_client(app, cfg);
    let keywords = app.rewrite_keywords();
    let max_words = app.settings.rewrite_max_words;
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match api.rewrite("experience", &original, &keywords, max_words).await {
            Ok(r) => AppEvent::RewriteDone {
                target: RewriteTarget::Drawer,
                rewritten: r.rewritten,
                diff: r.diff,
            },
            Err(e) => AppEvent::ActionFailed {
                action: ActionKind::Rewrite,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event);
    });
}

fn start_batch_rewrite(app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    if app.batch.is_some() {
        return;
    }
    let Some(resume) = &app.resume else {
        app.toast("Nothing to rewrite yet", ToastKind::Error);
        return;
    };
    let items: Vec<(RewriteTarget, String)> = app
        .bullet_refs()
        .into_iter()
        .filter_map(|(exp, bullet)| {
            let text = resume.experience.get(exp)?.bullets.get(bullet)?.clone();
            validation::validate_rewrite_text(&text).ok()?;
            Some((RewriteTarget::Bullet { exp, bullet }, text))
        })
        .collect();
    if items.is_empty() {
        app.toast("No rewritable bullets found", ToastKind::Error);
        return;
    }
    app.batch = Some((0, items.len()));

    let api = api_client(app, cfg);
    let keywords = app.rewrite_keywords();
    let max_words = app.settings.rewrite_max_words;
    let tx = tx.clone();
    tokio::spawn(async move {
        api.rewrite_batch("experience", items, keywords, max_words, tx)
            .await;
    });
}

fn start_export(app: &mut App, cfg: &Config, tx: &UnboundedSender<AppEvent>) {
    let Some(resume) = app.resume.clone() else {
        app.toast("Parse a resume before exporting", ToastKind::Error);
        return;
    };
    if app.exporting {
        return;
    }
    app.exporting = true;

    let api = api_client(app, cfg);
    let tx = tx.clone();
    tokio::spawn(async move {
        let event = match api.export_docx(&resume).await {
            // The download fires only on success; error responses never
            // touch the filesystem.
            Ok(bytes) => match export::write_docx(&bytes, Path::new(".")) {
                Ok(path) => AppEvent::ExportDone { path },
                Err(e) => AppEvent::ActionFailed {
                    action: ActionKind::Export,
                    message: format!("could not save file: {e}"),
                },
            },
            Err(e) => AppEvent::ActionFailed {
                action: ActionKind::Export,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event);
    });
}
