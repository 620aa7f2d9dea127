use drhp_core::{
    ActiveDialog, AppViewModel, CompanyDetailView, LeftPaneView, ReportPaneView, ReportSlot,
    SourceDocument,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};

use super::constants::*;
use super::layout::{centered, split};
use crate::platform::input::Prompt;

/// Per-frame UI state the core does not own.
pub struct Chrome<'a> {
    pub backend: &'a str,
    pub selected: Option<usize>,
    pub prompt: Option<&'a Prompt>,
    pub scroll: ReportScroll,
}

/// Row offsets of the two report viewers. Also used for the per-frame scroll limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportScroll {
    pub generated: u16,
    pub company: u16,
}

impl ReportScroll {
    pub fn get(self, slot: ReportSlot) -> u16 {
        match slot {
            ReportSlot::Generated => self.generated,
            ReportSlot::Company => self.company,
        }
    }

    fn slot_mut(&mut self, slot: ReportSlot) -> &mut u16 {
        match slot {
            ReportSlot::Generated => &mut self.generated,
            ReportSlot::Company => &mut self.company,
        }
    }

    /// Moves one viewer by `delta` rows, never past `limits`.
    pub fn scroll(&mut self, slot: ReportSlot, delta: i16, limits: ReportScroll) {
        let limit = limits.get(slot);
        let offset = self.slot_mut(slot);
        *offset = offset.saturating_add_signed(delta).min(limit);
    }

    pub fn reset(&mut self, slot: ReportSlot) {
        *self.slot_mut(slot) = 0;
    }

    pub fn clamp_to(&mut self, limits: ReportScroll) {
        self.generated = self.generated.min(limits.generated);
        self.company = self.company.min(limits.company);
    }
}

/// Draws one frame and returns how far each report viewer can scroll at this size.
pub fn draw(frame: &mut Frame, view: &AppViewModel, chrome: &Chrome) -> ReportScroll {
    let areas = split(frame.area(), view.company.is_some());

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(APP_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" {}", chrome.backend),
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        areas.header,
    );

    frame.render_widget(preview(&view.left), areas.preview);
    draw_directory(frame, view, chrome.selected, areas.directory);
    let mut limits = ReportScroll {
        generated: draw_report(
            frame,
            TITLE_GENERATED,
            &view.generated,
            "s",
            chrome.scroll.generated,
            areas.generated,
        ),
        company: 0,
    };

    if let (Some(detail), Some(area)) = (&view.company, areas.company) {
        limits.company = draw_company(frame, detail, chrome.scroll.company, area);
    }

    let notice = view.notice.as_deref().unwrap_or("");
    frame.render_widget(
        Paragraph::new(notice).style(Style::default().fg(Color::Cyan)),
        areas.notice,
    );
    let help = if chrome.prompt.is_some() {
        HELP_PROMPT
    } else {
        HELP_MAIN
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        areas.help,
    );

    if let Some(dialog) = &view.dialog {
        draw_dialog(frame, dialog);
    } else if let Some(prompt) = chrome.prompt {
        draw_prompt(frame, prompt);
    }
    limits
}

fn preview(left: &LeftPaneView) -> Paragraph<'static> {
    let lines = match left {
        LeftPaneView::Empty => vec![
            Line::from("Drop a DRHP PDF onto the terminal"),
            Line::from("or press o to choose one."),
        ],
        LeftPaneView::Loading { file_name } => vec![Line::from(format!("Loading {file_name}..."))],
        LeftPaneView::Previewing { file_name, path } => vec![
            Line::from(Span::styled(
                file_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                path.display().to_string(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from("g: generate IPO notes   x: remove"),
        ],
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(TITLE_PREVIEW))
        .wrap(Wrap { trim: false })
}

fn draw_directory(frame: &mut Frame, view: &AppViewModel, selected: Option<usize>, area: Rect) {
    let title = if view.directory_loading {
        format!("{TITLE_DIRECTORY}(loading...) ")
    } else {
        format!("{TITLE_DIRECTORY}({}) ", view.companies.len())
    };

    let items: Vec<ListItem> = view
        .companies
        .iter()
        .map(|row| {
            let style = if row.selectable {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(vec![
                Line::from(Span::styled(row.name.clone(), style.add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(
                    format!(
                        "  {} | {} | {}",
                        row.corporate_identity_number, row.created_at, row.status
                    ),
                    style,
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

/// Returns the largest useful scroll offset; zero unless a report is shown.
fn draw_report(
    frame: &mut Frame,
    title: &str,
    pane: &ReportPaneView,
    save_key: &str,
    offset: u16,
    area: Rect,
) -> u16 {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    match pane {
        ReportPaneView::Idle => {
            frame.render_widget(
                Paragraph::new("No report yet.")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block),
                area,
            );
        }
        ReportPaneView::Processing {
            headline,
            step,
            progress,
        } => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ])
                .split(inner);
            frame.render_widget(Paragraph::new(headline.clone()), rows[0]);
            if let Some(step) = step {
                frame.render_widget(
                    Paragraph::new(format!("step: {step}"))
                        .style(Style::default().fg(Color::DarkGray)),
                    rows[1],
                );
            }
            let percent = progress.unwrap_or(0).min(100);
            let label = match progress {
                Some(value) => format!("{value}%"),
                None => "working...".to_string(),
            };
            frame.render_widget(
                Gauge::default()
                    .gauge_style(Style::default().fg(Color::Green))
                    .percent(u16::from(percent))
                    .label(label),
                rows[2],
            );
        }
        ReportPaneView::Ready {
            filename,
            byte_len,
            markdown,
        } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    filename.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("{} | {save_key}: save PDF", format_size(*byte_len))),
                Line::from(""),
            ];
            match markdown {
                Some(text) => lines.extend(text.lines().map(|line| Line::from(line.to_string()))),
                None => lines.push(Line::from(Span::styled(
                    "PDF report ready.",
                    Style::default().fg(Color::DarkGray),
                ))),
            }
            let inner = block.inner(area);
            let body = Paragraph::new(lines).wrap(Wrap { trim: false });
            let rows = body.line_count(inner.width);
            let limit = u16::try_from(rows.saturating_sub(usize::from(inner.height)))
                .unwrap_or(u16::MAX);
            frame.render_widget(body.scroll((offset.min(limit), 0)).block(block), area);
            return limit;
        }
        ReportPaneView::Error { message } => {
            frame.render_widget(
                Paragraph::new(message.clone())
                    .style(Style::default().fg(Color::Red))
                    .block(block)
                    .wrap(Wrap { trim: false }),
                area,
            );
        }
    }
    0
}

fn draw_company(frame: &mut Frame, detail: &CompanyDetailView, offset: u16, area: Rect) -> u16 {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let source = match &detail.source_document {
        SourceDocument::Unresolved => "Looking up source document...".to_string(),
        SourceDocument::Found(path) => format!("Source DRHP: {}", path.display()),
        SourceDocument::NotFound => "Source document not found".to_string(),
    };
    let mut lines = vec![
        Line::from(format!(
            "CIN: {} | uploaded {} | {}",
            detail.corporate_identity_number, detail.created_at, detail.status
        )),
        Line::from(source),
    ];
    if let Some(link) = &detail.website_link {
        lines.insert(1, Line::from(format!("Website: {link}")));
    }
    lines.push(Line::from(Span::styled(
        "r: regenerate  [/]: scroll  Esc: close",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", detail.name)),
            )
            .wrap(Wrap { trim: true }),
        rows[0],
    );

    draw_report(
        frame,
        " Company IPO Notes ",
        &detail.report,
        "S",
        offset,
        rows[1],
    )
}

fn draw_dialog(frame: &mut Frame, dialog: &ActiveDialog) {
    let (title, body, keys, color) = match dialog {
        ActiveDialog::Warning(message) => (" Warning ", message.clone(), "Enter: OK", Color::Yellow),
        ActiveDialog::Generate => (
            " Generate IPO Notes ",
            "Generate IPO notes for this DRHP?".to_string(),
            "y: generate  n: cancel",
            Color::Cyan,
        ),
        ActiveDialog::Remove => (
            " Remove file ",
            "Remove this file and any generated report?".to_string(),
            "y: remove  n: cancel",
            Color::Cyan,
        ),
        ActiveDialog::Delete { company_name } => (
            " Delete company ",
            format!("Delete {company_name} and its report? This cannot be undone."),
            "y: delete  n: cancel",
            Color::Red,
        ),
    };

    let area = centered(frame.area(), DIALOG_WIDTH, DIALOG_HEIGHT);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(body),
            Line::from(""),
            Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        )
        .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_prompt(frame: &mut Frame, prompt: &Prompt) {
    let area = centered(frame.area(), DIALOG_WIDTH + 10, 3);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(format!("{}_", prompt.buffer)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.target.title()),
        ),
        area,
    );
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
