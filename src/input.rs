use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    SwitchTab(u8),
    Down,
    Up,
    Top,
    Bottom,
    NextCluster,
    PrevCluster,
    NextNamespace,
    PrevNamespace,
    OpenDetail,
    EventsForPod,
    Dismiss,
    StartEdit,
    StartAlertFilter,
    CycleEventType,
    ToggleMonitorFilter,
    Refresh,
    RefreshClusters,
    TriggerRun,
    PollRun,
    ToggleHelp,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Query | InputMode::PodFilter | InputMode::AlertFilter => {
            map_input_mode_key(key)
        }
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::RefreshClusters),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|digit| Action::SwitchTab(digit as u8)),
        KeyCode::Right | KeyCode::Tab => Some(Action::NextTab),
        KeyCode::Left | KeyCode::BackTab => Some(Action::PrevTab),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Char('c') => Some(Action::NextCluster),
        KeyCode::Char('C') => Some(Action::PrevCluster),
        KeyCode::Char('n') => Some(Action::NextNamespace),
        KeyCode::Char('N') => Some(Action::PrevNamespace),
        KeyCode::Enter => Some(Action::OpenDetail),
        KeyCode::Char('e') => Some(Action::EventsForPod),
        KeyCode::Esc => Some(Action::Dismiss),
        KeyCode::Char('/') => Some(Action::StartEdit),
        KeyCode::Char('a') => Some(Action::StartAlertFilter),
        KeyCode::Char('f') => Some(Action::CycleEventType),
        KeyCode::Char('m') => Some(Action::ToggleMonitorFilter),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('R') => Some(Action::RefreshClusters),
        KeyCode::Char('x') => Some(Action::TriggerRun),
        KeyCode::Char('p') => Some(Action::PollRun),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        _ => None,
    }
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::CancelInput)
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}
