use crate::console::Console;
use crate::input::Action;
use crate::model::ConsoleTab;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Query,
    PodFilter,
    AlertFilter,
}

/// What the event loop should ask the console to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    SelectTab(ConsoleTab),
    SelectCluster(String),
    SelectNamespace(String),
    OpenDetail(String),
    CloseDetail,
    ShowEventsForPod(String),
    SetEventPod(Option<String>),
    CycleEventType,
    ToggleMonitorFilter,
    SetAlertNamespace(Option<String>),
    SubmitQuery(String),
    Refresh,
    RefreshClusters,
    TriggerRun,
    PollRun,
}

/// Terminal-only state: input mode, cursor and the status line.
#[derive(Debug)]
pub struct App {
    running: bool,
    mode: InputMode,
    input: String,
    last_query: String,
    selected: usize,
    show_help: bool,
    status: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            input: String::new(),
            last_query: String::new(),
            selected: 0,
            show_help: false,
            status: "Press ? for keys".to_string(),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Keeps the cursor inside the active view after its data changed.
    pub fn clamp_selection(&mut self, console: &Console) {
        let rows = row_count(console);
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    pub fn apply_action(&mut self, action: Action, console: &Console) -> AppCommand {
        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::Dismiss) {
                return AppCommand::None;
            }
        }

        let tab = console.selection().tab;
        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::NextTab => self.switch_tab(offset_tab(tab, 1)),
            Action::PrevTab => self.switch_tab(offset_tab(tab, -1)),
            Action::SwitchTab(number) => {
                match ConsoleTab::ALL.get(usize::from(number).saturating_sub(1)) {
                    Some(next) if number > 0 => self.switch_tab(*next),
                    _ => AppCommand::None,
                }
            }
            Action::Down => {
                let rows = row_count(console);
                if rows > 0 {
                    self.selected = (self.selected + 1).min(rows - 1);
                }
                AppCommand::None
            }
            Action::Up => {
                self.selected = self.selected.saturating_sub(1);
                AppCommand::None
            }
            Action::Top => {
                self.selected = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.selected = row_count(console).saturating_sub(1);
                AppCommand::None
            }
            Action::NextCluster => self.cycle_cluster(console, 1),
            Action::PrevCluster => self.cycle_cluster(console, -1),
            Action::NextNamespace => self.cycle_namespace(console, 1),
            Action::PrevNamespace => self.cycle_namespace(console, -1),
            Action::OpenDetail => match tab {
                ConsoleTab::Pods => match self.selected_pod(console) {
                    Some(pod) => AppCommand::OpenDetail(pod),
                    None => AppCommand::None,
                },
                ConsoleTab::Query if !self.last_query.is_empty() => {
                    AppCommand::SubmitQuery(self.last_query.clone())
                }
                ConsoleTab::Query => self.start_input(InputMode::Query, String::new()),
                _ => AppCommand::None,
            },
            Action::EventsForPod => {
                if tab != ConsoleTab::Pods {
                    self.status = "Select a pod on the Pods view first".to_string();
                    return AppCommand::None;
                }
                match self.selected_pod(console) {
                    Some(pod) => {
                        self.selected = 0;
                        AppCommand::ShowEventsForPod(pod)
                    }
                    None => AppCommand::None,
                }
            }
            Action::Dismiss => {
                if console.detail().open_pod().is_some() {
                    AppCommand::CloseDetail
                } else {
                    self.status.clear();
                    AppCommand::None
                }
            }
            Action::StartEdit => match tab {
                ConsoleTab::Query => {
                    let current = self.last_query.clone();
                    self.start_input(InputMode::Query, current)
                }
                ConsoleTab::Events => {
                    let current = console.selection().pod_for_events.unwrap_or_default();
                    self.start_input(InputMode::PodFilter, current)
                }
                _ => {
                    self.status = "/ edits the PromQL query or the Events pod filter".to_string();
                    AppCommand::None
                }
            },
            Action::StartAlertFilter => {
                let current = console.selection().alert_namespace.unwrap_or_default();
                self.start_input(InputMode::AlertFilter, current)
            }
            Action::CycleEventType => AppCommand::CycleEventType,
            Action::ToggleMonitorFilter => {
                if tab != ConsoleTab::Monitor {
                    self.status = "m switches the Monitor filter".to_string();
                    return AppCommand::None;
                }
                self.selected = 0;
                AppCommand::ToggleMonitorFilter
            }
            Action::Refresh => AppCommand::Refresh,
            Action::RefreshClusters => AppCommand::RefreshClusters,
            Action::TriggerRun => AppCommand::TriggerRun,
            Action::PollRun => AppCommand::PollRun,
            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.input.clear();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                AppCommand::None
            }
        }
    }

    fn switch_tab(&mut self, tab: ConsoleTab) -> AppCommand {
        self.selected = 0;
        AppCommand::SelectTab(tab)
    }

    fn start_input(&mut self, mode: InputMode, seed: String) -> AppCommand {
        self.mode = mode;
        self.input = seed;
        AppCommand::None
    }

    fn submit_input(&mut self) -> AppCommand {
        let mode = self.mode;
        self.mode = InputMode::Normal;
        let value = std::mem::take(&mut self.input).trim().to_string();
        match mode {
            InputMode::Normal => AppCommand::None,
            InputMode::Query => {
                self.last_query = value.clone();
                self.selected = 0;
                AppCommand::SubmitQuery(value)
            }
            InputMode::PodFilter => {
                self.selected = 0;
                AppCommand::SetEventPod(non_empty(value))
            }
            InputMode::AlertFilter => {
                self.selected = 0;
                AppCommand::SetAlertNamespace(non_empty(value))
            }
        }
    }

    fn cycle_cluster(&mut self, console: &Console, step: isize) -> AppCommand {
        let names = console.registry().names();
        let current = console.selection().cluster;
        match cycle(&names, current.as_deref(), step) {
            Some(next) => {
                self.selected = 0;
                AppCommand::SelectCluster(next)
            }
            None => {
                self.status = "No clusters available".to_string();
                AppCommand::None
            }
        }
    }

    fn cycle_namespace(&mut self, console: &Console, step: isize) -> AppCommand {
        let selection = console.selection();
        let Some(cluster) = selection.cluster.as_deref() else {
            self.status = "Select a cluster first (c)".to_string();
            return AppCommand::None;
        };
        let namespaces = console.namespaces().namespaces_for(cluster);
        match cycle(&namespaces, selection.namespace.as_deref(), step) {
            Some(next) => {
                self.selected = 0;
                AppCommand::SelectNamespace(next)
            }
            None => {
                self.status = format!("No namespaces known for {cluster}");
                AppCommand::None
            }
        }
    }

    /// Rows still on screen from another namespace are not selectable.
    fn selected_pod(&self, console: &Console) -> Option<String> {
        console
            .pods()
            .current_data()
            .and_then(|pods| pods.get(self.selected))
            .map(|pod| pod.name.clone())
    }
}

/// Number of rows the active view currently shows.
pub fn row_count(console: &Console) -> usize {
    match console.selection().tab {
        ConsoleTab::Pods => console.pods().data().map_or(0, Vec::len),
        ConsoleTab::Events => console.events().data().map_or(0, Vec::len),
        ConsoleTab::Alerts => console.visible_alerts().len(),
        ConsoleTab::Query => console.query().data().map_or(0, |result| result.series.len()),
        ConsoleTab::Summary => 0,
        ConsoleTab::Monitor => console.monitor().data().map_or(0, Vec::len),
        ConsoleTab::Alarms => console.alarms().data().map_or(0, Vec::len),
    }
}

fn offset_tab(tab: ConsoleTab, offset: isize) -> ConsoleTab {
    let len = ConsoleTab::ALL.len() as isize;
    let index = (tab.index() as isize + offset).rem_euclid(len);
    ConsoleTab::ALL[index as usize]
}

fn cycle(values: &[String], current: Option<&str>, step: isize) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let len = values.len() as isize;
    let index = match current.and_then(|current| values.iter().position(|value| value == current)) {
        Some(index) => (index as isize + step).rem_euclid(len),
        None if step < 0 => len - 1,
        None => 0,
    };
    values.get(index as usize).cloned()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
