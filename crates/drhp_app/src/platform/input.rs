//! Keyboard and paste handling. Pure: key in, action out.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use drhp_core::{ActiveDialog, AppViewModel, DialogKind, LogoKind, Msg, ReportSlot};

use super::dropped::parse_dropped_path;
use super::mime::declared_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptTarget {
    File,
    Logo(LogoKind),
}

impl PromptTarget {
    pub(crate) fn title(self) -> &'static str {
        match self {
            PromptTarget::File => " Open DRHP PDF ",
            PromptTarget::Logo(LogoKind::Company) => " Upload company logo ",
            PromptTarget::Logo(LogoKind::Entity) => " Upload entity logo ",
        }
    }

    fn offer(self, path: PathBuf) -> Msg {
        let declared_type = declared_type(&path);
        match self {
            PromptTarget::File => Msg::FileOffered {
                path,
                declared_type,
            },
            PromptTarget::Logo(kind) => Msg::LogoOffered {
                path,
                declared_type,
                kind,
            },
        }
    }
}

/// Path entry line shown over the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prompt {
    pub target: PromptTarget,
    pub buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PromptOutcome {
    Editing,
    Cancelled,
    Submitted(Option<Msg>),
}

impl Prompt {
    pub(crate) fn new(target: PromptTarget) -> Self {
        Self {
            target,
            buffer: String::new(),
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        match key.code {
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Enter => PromptOutcome::Submitted(
                parse_dropped_path(&self.buffer).map(|path| self.target.offer(path)),
            ),
            KeyCode::Backspace => {
                self.buffer.pop();
                PromptOutcome::Editing
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.push(ch);
                PromptOutcome::Editing
            }
            _ => PromptOutcome::Editing,
        }
    }

    pub(crate) fn paste(&mut self, text: &str) {
        if let Some(line) = text.lines().find(|line| !line.trim().is_empty()) {
            self.buffer.push_str(line.trim());
        }
    }
}

/// Rows moved by one report page key.
const SCROLL_PAGE: i16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Dispatch(Msg),
    OpenPrompt(PromptTarget),
    MoveSelection(isize),
    Scroll(ReportSlot, i16),
    Quit,
    Ignore,
}

/// Maps a key press outside the prompt. `selected` is the highlighted directory row.
pub(crate) fn map_key(key: KeyEvent, view: &AppViewModel, selected: Option<usize>) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    if let Some(dialog) = &view.dialog {
        return map_dialog_key(key, dialog);
    }

    let selected_id = selected
        .and_then(|index| view.companies.get(index))
        .map(|row| row.id.clone());

    let msg = match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('o') => return KeyAction::OpenPrompt(PromptTarget::File),
        KeyCode::Char('l') => return KeyAction::OpenPrompt(PromptTarget::Logo(LogoKind::Company)),
        KeyCode::Char('e') => return KeyAction::OpenPrompt(PromptTarget::Logo(LogoKind::Entity)),
        KeyCode::Up | KeyCode::Char('k') => return KeyAction::MoveSelection(-1),
        KeyCode::Down | KeyCode::Char('j') => return KeyAction::MoveSelection(1),
        KeyCode::PageDown => return KeyAction::Scroll(ReportSlot::Generated, SCROLL_PAGE),
        KeyCode::PageUp => return KeyAction::Scroll(ReportSlot::Generated, -SCROLL_PAGE),
        KeyCode::Char(']') => return KeyAction::Scroll(ReportSlot::Company, SCROLL_PAGE),
        KeyCode::Char('[') => return KeyAction::Scroll(ReportSlot::Company, -SCROLL_PAGE),
        KeyCode::Char('g') => Msg::GenerateClicked,
        KeyCode::Char('x') => Msg::RemoveClicked,
        KeyCode::Char('s') => Msg::DownloadClicked(ReportSlot::Generated),
        KeyCode::Char('S') => Msg::DownloadClicked(ReportSlot::Company),
        KeyCode::Char('c') => Msg::CancelProcessingClicked(ReportSlot::Generated),
        KeyCode::Char('C') => Msg::CancelProcessingClicked(ReportSlot::Company),
        KeyCode::Char('r') => Msg::RegenerateClicked,
        KeyCode::Char('R') | KeyCode::F(5) => Msg::CompaniesRequested,
        KeyCode::Enter => match selected_id {
            Some(id) => Msg::CompanySelected(id),
            None => return KeyAction::Ignore,
        },
        KeyCode::Delete | KeyCode::Char('D') => match selected_id {
            Some(id) => Msg::DeleteClicked(id),
            None => return KeyAction::Ignore,
        },
        KeyCode::Esc if view.company.is_some() => Msg::CloseCompanyDetail,
        _ => return KeyAction::Ignore,
    };
    KeyAction::Dispatch(msg)
}

fn map_dialog_key(key: KeyEvent, dialog: &ActiveDialog) -> KeyAction {
    let kind = match dialog {
        ActiveDialog::Warning(_) => {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('y') => {
                    KeyAction::Dispatch(Msg::DialogDismissed(DialogKind::Warning))
                }
                _ => KeyAction::Ignore,
            };
        }
        ActiveDialog::Generate => DialogKind::Generate,
        ActiveDialog::Remove => DialogKind::Remove,
        ActiveDialog::Delete { .. } => DialogKind::Delete,
    };
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') => KeyAction::Dispatch(Msg::DialogConfirmed(kind)),
        KeyCode::Esc | KeyCode::Char('n') => KeyAction::Dispatch(Msg::DialogDismissed(kind)),
        _ => KeyAction::Ignore,
    }
}

/// A drop onto the terminal: the first pasted path is offered as the DRHP file.
pub(crate) fn map_paste(text: &str) -> Option<Msg> {
    parse_dropped_path(text).map(|path| PromptTarget::File.offer(path))
}
