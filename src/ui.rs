use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect},
    widgets::{Block, Borders, BorderType, Clear, List, ListItem, ListState, Paragraph, Wrap},
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::app::{App, EditorPane, InputMode, PathAction, Tab, ToastKind};
use crate::models::{DiffOp, DiffToken};
use crate::validation;

// ===============================
// Top-level draw
// ===============================
pub fn draw(f: &mut Frame, app: &mut App) {
    // Advance spinner animation on each render
    app.tick_spinner();

    let prompt_open = matches!(
        app.input_mode,
        InputMode::PathPrompt(_) | InputMode::TitlePrompt
    );

    let mut constraints: Vec<Constraint> = Vec::with_capacity(4);
    constraints.push(Constraint::Length(1)); // header
    if prompt_open {
        constraints.push(Constraint::Length(3)); // prompt bar
    }
    constraints.push(Constraint::Min(0)); // body
    constraints.push(Constraint::Length(1)); // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut idx = 0usize;
    header(f, chunks[idx], app);
    idx += 1;
    if prompt_open {
        prompt_bar(f, chunks[idx], app);
        idx += 1;
    }
    body(f, chunks[idx], app);
    idx += 1;
    footer(f, chunks[idx], app);

    // Overlays render last
    if app.drawer.is_some() {
        draw_rewrite_drawer(f, app);
    }
    if app.input_mode == InputMode::ConfirmClear {
        draw_confirm_clear(f, app);
    }
    if app.toast_message().is_some() {
        draw_toast(f, app);
    }
}

// ===============================
// Header / prompt bar / footer
// ===============================
fn header(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let mut spans = Vec::new();

    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i == 0 {
            spans.push(Span::raw("┌─"));
        } else {
            spans.push(Span::raw("┬─"));
        }
        if *tab == app.tab {
            spans.push(Span::styled(
                tab.title(),
                Style::default()
                    .fg(theme.focus_border)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(tab.title()));
        }
        spans.push(Span::raw("─"));
    }
    spans.push(Span::raw("┐"));

    // Right side: in-flight action, then backend status dot.
    if let Some(busy) = app.busy_line() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {busy}", app.spinner_char()),
            Style::default().fg(theme.warn),
        ));
    }
    match app.backend_ok {
        Some(true) => {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("● backend", Style::default().fg(theme.ok)));
        }
        Some(false) => {
            spans.push(Span::raw("  "));
            spans.push(Span::styled("● offline", Style::default().fg(theme.err)));
        }
        None => {}
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn prompt_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let title = match app.input_mode {
        InputMode::PathPrompt(PathAction::LoadText) => "Load text file (path)",
        InputMode::PathPrompt(PathAction::Upload) => "Upload file (path)",
        InputMode::TitlePrompt => "JD title override",
        _ => "",
    };
    let content = format!("{}_", app.prompt_buffer);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.focus_border))
        .title(title);
    f.render_widget(Paragraph::new(content).block(block), area);
}

fn footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let hints = match app.input_mode {
        InputMode::EditText => "Esc done · type to edit · Enter newline",
        InputMode::PathPrompt(_) | InputMode::TitlePrompt => "Enter confirm · Esc cancel",
        InputMode::ConfirmClear => "y clear everything · n keep",
        InputMode::Normal => match app.tab {
            Tab::Editor => {
                "Tab pane · e edit · o load · u upload · p parse · a analyze · 1-4 views · q quit"
            }
            Tab::Results => {
                "j/k bullet · r rewrite · b batch · t title · x export · 1-4 views · q quit"
            }
            Tab::History => "j/k select · Enter restore · c clear · 1-4 views · q quit",
            Tab::Settings => "j/k select · ←/→/Enter change · 1-4 views · q quit",
        },
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(theme.text_dim)),
        area,
    );
}

// ===============================
// Body
// ===============================
fn body(f: &mut Frame, area: Rect, app: &App) {
    match app.tab {
        Tab::Editor => editor_body(f, area, app),
        Tab::Results => results_body(f, area, app),
        Tab::History => history_body(f, area, app),
        Tab::Settings => settings_body(f, area, app),
    }
}

fn pane_title(app: &App, pane: EditorPane) -> String {
    let (label, text, parsed) = match pane {
        EditorPane::Resume => ("Resume", &app.resume_text, app.resume.is_some()),
        EditorPane::Jd => ("Job Description", &app.jd_text, app.jd.is_some()),
    };
    let words = validation::word_count(text);
    let editing = app.editor_focus == pane && app.input_mode == InputMode::EditText;
    let mut title = format!(" {label} · {words} words");
    if parsed {
        title.push_str(" · parsed ✔");
    }
    if editing {
        title.push_str(" · editing");
    }
    title.push(' ');
    title
}

fn editor_body(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (pane, chunk, scroll) in [
        (EditorPane::Resume, halves[0], app.resume_scroll),
        (EditorPane::Jd, halves[1], app.jd_scroll),
    ] {
        let focused = app.editor_focus == pane;
        let border = if focused {
            theme.focus_border
        } else {
            theme.unfocused_border
        };
        let text = match pane {
            EditorPane::Resume => app.resume_text.as_str(),
            EditorPane::Jd => app.jd_text.as_str(),
        };
        let placeholder = match pane {
            EditorPane::Resume => "Paste resume text here (e), or load a file (o).",
            EditorPane::Jd => "Paste the job description here (e), or load a file (o).",
        };
        let body = if text.is_empty() { placeholder } else { text };
        let style = if text.is_empty() {
            Style::default().fg(theme.text_dim)
        } else {
            Style::default().fg(theme.text)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(pane_title(app, pane));
        f.render_widget(
            Paragraph::new(body)
                .style(style)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0))
                .block(block),
            chunk,
        );
    }
}

/// Textual percentage bar, e.g. `███████░░░ 70%`.
fn pct_bar(pct: u8, width: usize) -> String {
    let filled = (pct as usize * width) / 100;
    let mut bar = String::with_capacity(width + 5);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    format!("{bar} {pct:>3}%")
}

fn results_body(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let Some(analysis) = &app.analysis else {
        let msg = "No analysis yet.\n\nParse a resume and a job description on the Editor view,\nthen press `a` to analyze.";
        f.render_widget(
            Paragraph::new(msg)
                .style(Style::default().fg(theme.text_dim))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Results ")),
            area,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(5),
            Constraint::Length(8),
        ])
        .split(area);

    // --- summary row: score, coverage, hygiene ---
    let summary = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Min(30),
            Constraint::Percentage(30),
        ])
        .split(rows[0]);

    let score_lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("   {:>3}", analysis.score),
            Style::default()
                .fg(theme.score_color(analysis.score))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "   /100",
            Style::default().fg(theme.text_dim),
        )),
    ];
    f.render_widget(
        Paragraph::new(score_lines)
            .block(Block::default().borders(Borders::ALL).title(" Score ")),
        summary[0],
    );

    let s = &analysis.sections;
    let mut coverage = vec![
        Line::raw(format!("Skills     {}", pct_bar(s.skills_coverage_pct, 20))),
        Line::raw(format!("Preferred  {}", pct_bar(s.preferred_coverage_pct, 20))),
        Line::raw(format!("Domain     {}", pct_bar(s.domain_coverage_pct, 20))),
    ];
    if app.settings.show_advanced_analysis {
        if let Some(pct) = s.recency_score_pct {
            coverage.push(Line::raw(format!("Recency    {}", pct_bar(pct, 20))));
        }
        if let Some(pct) = s.hygiene_score_pct {
            coverage.push(Line::raw(format!("Hygiene    {}", pct_bar(pct, 20))));
        }
    }
    f.render_widget(
        Paragraph::new(coverage)
            .block(Block::default().borders(Borders::ALL).title(" Coverage ")),
        summary[1],
    );

    let flags = analysis.hygiene_flags();
    let hygiene_lines: Vec<Line> = if flags.is_empty() {
        vec![Line::from(Span::styled(
            "no issues",
            Style::default().fg(theme.ok),
        ))]
    } else {
        flags
            .iter()
            .map(|flag| {
                Line::from(Span::styled(
                    format!("⚑ {flag}"),
                    Style::default().fg(theme.warn),
                ))
            })
            .collect()
    };
    f.render_widget(
        Paragraph::new(hygiene_lines)
            .block(Block::default().borders(Borders::ALL).title(" ATS hygiene ")),
        summary[2],
    );

    // --- skill columns ---
    let advanced = app.settings.show_advanced_analysis;
    let mid_constraints = if advanced {
        vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ]
    } else {
        vec![Constraint::Percentage(50), Constraint::Percentage(50)]
    };
    let mid = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(mid_constraints)
        .split(rows[1]);

    let matched: Vec<ListItem> = analysis
        .matched
        .iter()
        .map(|s| ListItem::new(Line::from(Span::styled(format!("✔ {s}"), Style::default().fg(theme.ok)))))
        .collect();
    f.render_widget(
        List::new(matched).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Matched ({}) ", analysis.matched.len())),
        ),
        mid[0],
    );

    let missing: Vec<ListItem> = analysis
        .missing
        .iter()
        .map(|s| ListItem::new(Line::from(Span::styled(format!("✘ {s}"), Style::default().fg(theme.err)))))
        .collect();
    f.render_widget(
        List::new(missing).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Missing ({}) ", analysis.missing.len())),
        ),
        mid[1],
    );

    if advanced {
        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            "skills",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            analysis
                .normalized_jd
                .skills
                .iter()
                .map(|s| Line::raw(format!("  {s}"))),
        );
        lines.push(Line::from(Span::styled(
            "responsibilities",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(
            analysis
                .normalized_jd
                .responsibilities
                .iter()
                .map(|r| Line::raw(format!("  {r}"))),
        );
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Normalized JD ")),
            mid[2],
        );
    }

    // --- experience bullets ---
    let refs = app.bullet_refs();
    let items: Vec<ListItem> = refs
        .iter()
        .map(|(e, b)| {
            let resume = app.resume.as_ref();
            let (role, text) = resume
                .and_then(|r| r.experience.get(*e))
                .map(|item| (item.role.as_str(), item.bullets[*b].as_str()))
                .unwrap_or(("?", "?"));
            ListItem::new(Line::raw(format!("{role}: {text}")))
        })
        .collect();
    let mut state = ListState::default();
    if !refs.is_empty() {
        state.select(Some(app.bullet_sel.min(refs.len() - 1)));
    }
    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Experience bullets ({}) ", refs.len())),
        );
    f.render_stateful_widget(list, rows[2], &mut state);
}

fn history_body(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    if app.history.is_empty() {
        f.render_widget(
            Paragraph::new("No saved analyses.\n\nRun an analysis with auto-save enabled and it will appear here.")
                .style(Style::default().fg(theme.text_dim))
                .block(Block::default().borders(Borders::ALL).title(" History ")),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .history
        .entries()
        .iter()
        .map(|entry| {
            let when = entry
                .at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M");
            let line = Line::from(vec![
                Span::styled(format!("{when}  "), Style::default().fg(theme.text_dim)),
                Span::styled(
                    format!("{:>3}  ", entry.score),
                    Style::default().fg(theme.score_color(entry.score)),
                ),
                Span::raw(entry.job_title.clone()),
            ]);
            ListItem::new(line)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.history_sel.min(app.history.len() - 1)));
    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" History ({} of 10 kept) ", app.history.len())),
        );
    f.render_stateful_widget(list, area, &mut state);
}

fn settings_body(f: &mut Frame, area: Rect, app: &App) {
    let theme = *app.theme();
    let s = &app.settings;
    let rows: [(&str, String); crate::app::SETTINGS_ROWS] = [
        ("Rewrite word budget", s.rewrite_max_words.to_string()),
        ("Export style", s.export_style.as_str().to_string()),
        ("Auto-save history", on_off(s.auto_save_history)),
        ("Advanced analysis display", on_off(s.show_advanced_analysis)),
        ("Request timeout", format!("{} ms", s.request_timeout_ms)),
    ];

    let items: Vec<ListItem> = rows
        .iter()
        .map(|(label, value)| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{label:<28}")),
                Span::styled(value.clone(), Style::default().fg(theme.focus_border)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.settings_sel));
    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .block(Block::default().borders(Borders::ALL).title(" Settings "));
    f.render_stateful_widget(list, area, &mut state);
}

fn on_off(v: bool) -> String {
    if v { "on".into() } else { "off".into() }
}

// ===============================
// Overlays
// ===============================

/// Centered rect helper for modal overlays.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn diff_line(diff: &[DiffToken], app: &App) -> Line<'static> {
    let theme = *app.theme();
    let mut spans = Vec::new();
    for token in diff {
        match token.op {
            DiffOp::Equal => spans.push(Span::raw(token.to.clone())),
            DiffOp::Insert => spans.push(Span::styled(
                token.to.clone(),
                Style::default().fg(theme.diff_insert).add_modifier(Modifier::BOLD),
            )),
            DiffOp::Delete => spans.push(Span::styled(
                token.from.clone(),
                Style::default()
                    .fg(theme.diff_delete)
                    .add_modifier(Modifier::CROSSED_OUT),
            )),
            DiffOp::Replace => {
                spans.push(Span::styled(
                    token.from.clone(),
                    Style::default()
                        .fg(theme.diff_delete)
                        .add_modifier(Modifier::CROSSED_OUT),
                ));
                spans.push(Span::styled(
                    token.to.clone(),
                    Style::default().fg(theme.diff_insert).add_modifier(Modifier::BOLD),
                ));
            }
        }
    }
    Line::from(spans)
}

fn draw_rewrite_drawer(f: &mut Frame, app: &App) {
    let theme = *app.theme();
    let Some(drawer) = &app.drawer else { return };
    let area = centered_rect(72, 60, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.focus_border))
        .title(" Rewrite bullet ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Span::styled("Original", Style::default().fg(theme.text_dim))),
        sections[0],
    );
    f.render_widget(
        Paragraph::new(drawer.original.as_str()).wrap(Wrap { trim: false }),
        sections[1],
    );

    f.render_widget(
        Paragraph::new(Span::styled("Rewritten", Style::default().fg(theme.text_dim))),
        sections[2],
    );
    match &drawer.rewritten {
        Some(_) => {
            f.render_widget(
                Paragraph::new(diff_line(&drawer.diff, app)).wrap(Wrap { trim: false }),
                sections[3],
            );
        }
        None => {
            f.render_widget(
                Paragraph::new(format!("{} waiting for rewrite...", app.spinner_char()))
                    .style(Style::default().fg(theme.warn)),
                sections[3],
            );
        }
    }

    let hint = if drawer.rewritten.is_some() {
        "Enter apply · Esc discard"
    } else {
        "Esc close (request keeps running in the background)"
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(theme.text_dim)),
        sections[4],
    );
}

fn draw_confirm_clear(f: &mut Frame, app: &App) {
    let theme = *app.theme();
    let area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.err))
        .title(" Clear history ");
    f.render_widget(
        Paragraph::new("Delete all saved analyses?\n\ny to confirm, n to cancel")
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn draw_toast(f: &mut Frame, app: &App) {
    let theme = *app.theme();
    let Some((message, kind)) = app.toast_message() else {
        return;
    };
    let color = match kind {
        ToastKind::Info => theme.focus_border,
        ToastKind::Success => theme.ok,
        ToastKind::Error => theme.err,
    };

    // Bottom strip, one line above the footer.
    let width = (message.chars().count() as u16 + 4).min(f.area().width);
    let area = Rect {
        x: f.area().width.saturating_sub(width + 1),
        y: f.area().height.saturating_sub(4),
        width,
        height: 3,
    }
    .intersection(f.area());
    if area.is_empty() {
        return;
    }
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    f.render_widget(Paragraph::new(message.to_string()).block(block), area);
}
