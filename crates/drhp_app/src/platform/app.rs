use std::collections::VecDeque;
use std::io::{stdout, Stdout};
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use drhp_core::{update, AppState, AppViewModel, Msg, ReportPaneView, ReportSlot};
use drhp_logging::{drhp_debug, drhp_info};
use ratatui::prelude::{CrosstermBackend, Terminal};

use super::config::{AppConfig, CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::input::{map_key, map_paste, KeyAction, Prompt, PromptOutcome};
use super::logging;
use super::ui::render::{draw, Chrome, ReportScroll};

/// Input poll interval; also bounds how long finished client work waits to be applied.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app() -> anyhow::Result<()> {
    logging::initialize();
    let config = AppConfig::load_or_default(Path::new(CONFIG_FILENAME));
    let runner = EffectRunner::new(&config)?;
    let mut app = App::new(runner, config.base_url.clone());

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableBracketedPaste)?;
    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| app.run(&mut terminal));

    let _ = stdout().execute(DisableBracketedPaste);
    let _ = stdout().execute(LeaveAlternateScreen);
    disable_raw_mode()?;
    drhp_info!("drhp_app exiting");
    result
}

struct App {
    state: AppState,
    view: AppViewModel,
    runner: EffectRunner,
    backend: String,
    selected: Option<usize>,
    prompt: Option<Prompt>,
    scroll: ReportScroll,
    scroll_limits: ReportScroll,
    redraw: bool,
    quit: bool,
}

impl App {
    fn new(runner: EffectRunner, backend: String) -> Self {
        let state = AppState::new();
        let view = state.view();
        Self {
            state,
            view,
            runner,
            backend,
            selected: None,
            prompt: None,
            scroll: ReportScroll::default(),
            scroll_limits: ReportScroll::default(),
            redraw: true,
            quit: false,
        }
    }

    fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        self.dispatch(Msg::CompaniesRequested);

        while !self.quit {
            if self.redraw {
                let chrome = Chrome {
                    backend: &self.backend,
                    selected: self.selected,
                    prompt: self.prompt.as_ref(),
                    scroll: self.scroll,
                };
                let mut limits = ReportScroll::default();
                terminal.draw(|frame| limits = draw(frame, &self.view, &chrome))?;
                self.scroll_limits = limits;
                self.scroll.clamp_to(limits);
                self.redraw = false;
            }

            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(prompt) = self.prompt.as_mut() {
                            match prompt.handle_key(key) {
                                PromptOutcome::Editing => {}
                                PromptOutcome::Cancelled => self.prompt = None,
                                PromptOutcome::Submitted(msg) => {
                                    self.prompt = None;
                                    if let Some(msg) = msg {
                                        self.dispatch(msg);
                                    }
                                }
                            }
                            self.redraw = true;
                        } else {
                            let action = map_key(key, &self.view, self.selected);
                            self.apply(action);
                        }
                    }
                    Event::Paste(text) => {
                        if let Some(prompt) = self.prompt.as_mut() {
                            prompt.paste(&text);
                            self.redraw = true;
                        } else if self.view.dialog.is_none() {
                            if let Some(msg) = map_paste(&text) {
                                self.dispatch(msg);
                            }
                        }
                    }
                    Event::Resize(..) => self.redraw = true,
                    _ => {}
                }
            }

            for msg in self.runner.poll() {
                self.dispatch(msg);
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Dispatch(msg) => self.dispatch(msg),
            KeyAction::OpenPrompt(target) => {
                self.prompt = Some(Prompt::new(target));
                self.redraw = true;
            }
            KeyAction::MoveSelection(delta) => {
                self.selected = move_selection(self.selected, delta, self.view.companies.len());
                self.redraw = true;
            }
            KeyAction::Scroll(slot, delta) => {
                self.scroll.scroll(slot, delta, self.scroll_limits);
                self.redraw = true;
            }
            KeyAction::Quit => self.quit = true,
            KeyAction::Ignore => {}
        }
    }

    /// Runs `msg` through `update`, feeding back any messages produced without IO.
    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            drhp_debug!("dispatch {}", msg_name(&msg));
            let (state, effects) = update(std::mem::take(&mut self.state), msg);
            self.state = state;
            queue.extend(self.runner.run(effects));
        }

        if self.state.consume_dirty() {
            self.view = self.state.view();
            self.selected = clamp_selection(self.selected, self.view.companies.len());
            settle_scroll(&mut self.scroll, &self.view);
            self.redraw = true;
        }
    }
}

fn move_selection(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current {
        None => 0,
        Some(index) => index.saturating_add_signed(delta).min(len - 1),
    };
    Some(next)
}

fn clamp_selection(current: Option<usize>, len: usize) -> Option<usize> {
    match (current, len) {
        (_, 0) => None,
        (None, _) => Some(0),
        (Some(index), len) => Some(index.min(len - 1)),
    }
}

/// A viewer that no longer shows a report starts its next report at the top.
fn settle_scroll(scroll: &mut ReportScroll, view: &AppViewModel) {
    if !matches!(view.generated, ReportPaneView::Ready { .. }) {
        scroll.reset(ReportSlot::Generated);
    }
    let company_ready = view
        .company
        .as_ref()
        .is_some_and(|detail| matches!(detail.report, ReportPaneView::Ready { .. }));
    if !company_ready {
        scroll.reset(ReportSlot::Company);
    }
}

/// Variant name only; messages can carry whole reports.
fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::FileOffered { .. } => "FileOffered",
        Msg::PreviewLoaded { .. } => "PreviewLoaded",
        Msg::PreviewFailed { .. } => "PreviewFailed",
        Msg::GenerateClicked => "GenerateClicked",
        Msg::RemoveClicked => "RemoveClicked",
        Msg::DialogConfirmed(..) => "DialogConfirmed",
        Msg::DialogDismissed(..) => "DialogDismissed",
        Msg::CancelProcessingClicked(..) => "CancelProcessingClicked",
        Msg::StreamProgress { .. } => "StreamProgress",
        Msg::StreamCompleted { .. } => "StreamCompleted",
        Msg::StreamFailed { .. } => "StreamFailed",
        Msg::StreamInterrupted { .. } => "StreamInterrupted",
        Msg::ReportRendered { .. } => "ReportRendered",
        Msg::ReportRenderFailed { .. } => "ReportRenderFailed",
        Msg::CompaniesRequested => "CompaniesRequested",
        Msg::CompaniesLoaded(..) => "CompaniesLoaded",
        Msg::CompaniesFailed(..) => "CompaniesFailed",
        Msg::CompanySelected(..) => "CompanySelected",
        Msg::CompanyReportLoaded { .. } => "CompanyReportLoaded",
        Msg::CompanyReportFailed { .. } => "CompanyReportFailed",
        Msg::SourceDocumentResolved { .. } => "SourceDocumentResolved",
        Msg::CloseCompanyDetail => "CloseCompanyDetail",
        Msg::RegenerateClicked => "RegenerateClicked",
        Msg::DeleteClicked(..) => "DeleteClicked",
        Msg::CompanyDeleted(..) => "CompanyDeleted",
        Msg::CompanyDeleteFailed { .. } => "CompanyDeleteFailed",
        Msg::DownloadClicked(..) => "DownloadClicked",
        Msg::ReportSaved { .. } => "ReportSaved",
        Msg::ReportSaveFailed(..) => "ReportSaveFailed",
        Msg::LogoOffered { .. } => "LogoOffered",
        Msg::LogoUploaded { .. } => "LogoUploaded",
        Msg::LogoUploadFailed(..) => "LogoUploadFailed",
        Msg::Tick => "Tick",
        Msg::NoOp => "NoOp",
    }
}
