use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{App, InputMode};
use crate::console::Console;
use crate::detail::Slot;
use crate::model::{ConsoleTab, MonitorFilter, RunStatus};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);

pub fn render(frame: &mut Frame, app: &App, console: &Console) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], console);
    render_tabs(frame, root[1], console);
    render_body(frame, root[2], app, console);
    render_footer(frame, root[3], app, console);

    if app.show_help() {
        render_help_modal(frame);
    }
}

fn render_header(frame: &mut Frame, area: Rect, console: &Console) {
    let selection = console.selection();
    let session = console.session();
    let mut spans = Vec::new();

    let (session_label, session_bg) = if session.logged_in {
        (" ● session ", PL_A)
    } else {
        (" ○ no session ", ERROR)
    };
    push_powerline_segment(&mut spans, " fleetwatch ", Color::White, PL_D, session_bg);
    push_powerline_segment(&mut spans, session_label, Color::White, session_bg, PL_B);

    let cluster = selection.cluster.as_deref().unwrap_or("-");
    let mut cluster_flags = String::new();
    if let Some(name) = selection.cluster.as_deref() {
        let registry = console.registry();
        cluster_flags.push_str(if registry.metrics_available(name) { " prom" } else { " -prom" });
        cluster_flags.push_str(if registry.logs_available(name) { " loki" } else { " -loki" });
        if console.namespaces().is_loading(name) {
            cluster_flags.push_str(" …");
        } else if console.namespaces().error_for(name).is_some() {
            cluster_flags.push_str(" ns!");
        }
    }
    push_powerline_segment(
        &mut spans,
        format!(" {}{} ", compact_text(cluster, 24), cluster_flags),
        Color::White,
        PL_B,
        PL_C,
    );
    let namespace = selection.namespace.as_deref().unwrap_or("-");
    push_powerline_segment(
        &mut spans,
        format!(" {} ", compact_text(namespace, 24)),
        Color::White,
        PL_C,
        BG,
    );

    let run = console.run();
    let state = run.state();
    let mut run_label = format!("  run: {}", state.status.label());
    if run.is_active() {
        run_label.push_str(&format!(" ({}/{})", run.ticks(), run.max_ticks()));
    }
    if let Some(label) = state.exit_label() {
        run_label.push_str(&format!(" {label}"));
    }
    let run_color = match state.status {
        RunStatus::Running => WARN,
        RunStatus::Done if state.exit_code == Some(0) => ACCENT,
        RunStatus::Done | RunStatus::Timeout | RunStatus::Error => ERROR,
        RunStatus::NeverRun | RunStatus::Unknown => MUTED,
    };
    spans.push(Span::styled(run_label, Style::default().fg(run_color).bg(BG)));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG).fg(Color::White)),
        area,
    );
}

fn render_tabs(frame: &mut Frame, area: Rect, console: &Console) {
    let active = console.selection().tab;
    let mut spans = Vec::new();
    for (index, tab) in ConsoleTab::ALL.iter().enumerate() {
        let label = format!(" {} {} ", index + 1, tab.title());
        let style = if *tab == active {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).bg(BG)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::styled(" ", Style::default().bg(BG)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    if !console.selection().tab.needs_session() {
        render_active_tab(frame, area, app, console);
        return;
    }
    if !console.session().logged_in {
        render_message(
            frame,
            area,
            "No session",
            "Waiting for an active session. Log in through the web console; this view updates on its own.",
            MUTED,
        );
        return;
    }

    let registry = console.registry();
    if registry.list_clusters().is_empty() {
        let (message, color) = match registry.error() {
            Some(error) => (format!("Cluster list unavailable: {error}"), ERROR),
            None if registry.loading() => ("Loading clusters…".to_string(), MUTED),
            None => ("No clusters registered. Press R to reload.".to_string(), MUTED),
        };
        render_message(frame, area, "Clusters", &message, color);
        return;
    }

    if console.detail().open_pod().is_some() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        render_active_tab(frame, split[0], app, console);
        render_pod_detail(frame, split[1], console);
        return;
    }

    render_active_tab(frame, area, app, console);
}

fn render_active_tab(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    let selection = console.selection();
    match selection.tab {
        ConsoleTab::Pods => {
            let fetcher = console.pods();
            let rows = fetcher
                .data()
                .map(|pods| {
                    pods.iter()
                        .map(|pod| {
                            vec![
                                pod.name.clone(),
                                pod.ready_label(),
                                pod.phase.clone(),
                                pod.total_restarts().to_string(),
                                pod.node.clone().unwrap_or_default(),
                                pod.created_at.clone().unwrap_or_default(),
                            ]
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            render_table(
                frame,
                area,
                TableView {
                    title: "Pods",
                    headers: &["NAME", "READY", "PHASE", "RESTARTS", "NODE", "CREATED"],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: if selection.namespace.is_none() {
                        "Pick a cluster (c) and a namespace (n)"
                    } else {
                        "No pods"
                    },
                },
            );
        }
        ConsoleTab::Events => {
            let fetcher = console.events();
            let rows = fetcher
                .data()
                .map(|events| {
                    events
                        .iter()
                        .map(|event| {
                            vec![
                                event.event_type.clone().unwrap_or_default(),
                                event.reason.clone().unwrap_or_default(),
                                event.involved_object.clone().unwrap_or_default(),
                                event.count.map(|count| count.to_string()).unwrap_or_default(),
                                event.last_timestamp.clone().unwrap_or_default(),
                                event.message.clone().unwrap_or_default(),
                            ]
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let mut title = "Events".to_string();
            if let Some(pod) = &selection.pod_for_events {
                title.push_str(&format!(" pod={pod}"));
            }
            if let Some(event_type) = selection.event_type {
                title.push_str(&format!(" type={event_type}"));
            }
            render_table(
                frame,
                area,
                TableView {
                    title: &title,
                    headers: &["TYPE", "REASON", "OBJECT", "COUNT", "LAST SEEN", "MESSAGE"],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: "No events",
                },
            );
        }
        ConsoleTab::Alerts => {
            let fetcher = console.alerts();
            if let Some(result) = fetcher.data()
                && !result.ok
            {
                render_message(
                    frame,
                    area,
                    "Alerts",
                    result.error.as_deref().unwrap_or("alerts query failed"),
                    ERROR,
                );
                return;
            }
            let rows = console
                .visible_alerts()
                .into_iter()
                .map(|series| {
                    vec![
                        series.label("alertname").unwrap_or("-").to_string(),
                        series.label("severity").unwrap_or("-").to_string(),
                        series.label("namespace").unwrap_or("-").to_string(),
                        series.label("alertstate").unwrap_or("-").to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            let title = match &selection.alert_namespace {
                Some(namespace) => format!("Alerts namespace={namespace}"),
                None => "Alerts".to_string(),
            };
            render_table(
                frame,
                area,
                TableView {
                    title: &title,
                    headers: &["ALERT", "SEVERITY", "NAMESPACE", "STATE"],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: "No firing alerts",
                },
            );
        }
        ConsoleTab::Query => render_query(frame, area, app, console),
        ConsoleTab::Summary => render_summary(frame, area, console),
        ConsoleTab::Monitor => {
            let fetcher = console.monitor();
            let rows = fetcher
                .data()
                .map(|snapshots| {
                    snapshots
                        .iter()
                        .map(|snapshot| {
                            let not_ready = snapshot
                                .pods
                                .iter()
                                .filter(|pod| !pod.fully_ready())
                                .count();
                            vec![
                                snapshot.status.label().to_string(),
                                snapshot.namespace.clone(),
                                snapshot.cluster.clone(),
                                snapshot.pods.len().to_string(),
                                not_ready.to_string(),
                                snapshot.timestamp_utc.clone(),
                            ]
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let filter = selection.monitor_filter;
            let target = match filter {
                MonitorFilter::Cluster => selection.cluster.as_deref(),
                MonitorFilter::Namespace => selection.namespace.as_deref(),
            };
            let counts = console.monitor_counts();
            let title = format!(
                "Monitor {}={} ok={} problem={}",
                filter.label(),
                target.unwrap_or("all"),
                counts.ok,
                counts.problem + counts.error
            );
            render_table(
                frame,
                area,
                TableView {
                    title: &title,
                    headers: &["STATUS", "NAMESPACE", "CLUSTER", "PODS", "NOT READY", "CHECKED"],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: "No snapshots recorded yet (m switches cluster/namespace)",
                },
            );
        }
        ConsoleTab::Alarms => {
            let fetcher = console.alarms();
            let rows = fetcher
                .data()
                .map(|alarms| {
                    alarms
                        .iter()
                        .map(|alarm| {
                            vec![
                                alarm.timestamp_utc.clone(),
                                alarm.alarm_name.clone(),
                                alarm.status.label().to_string(),
                                alarm.severity.clone(),
                                alarm.evidence_text("cluster").unwrap_or_else(|| "-".into()),
                                alarm.evidence_text("namespace").unwrap_or_else(|| "-".into()),
                                alarm.evidence_text("count").unwrap_or_else(|| "-".into()),
                            ]
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            let counts = console.alarm_counts();
            let title = format!(
                "Alarms ok={} problem={} error={}",
                counts.ok, counts.problem, counts.error
            );
            render_table(
                frame,
                area,
                TableView {
                    title: &title,
                    headers: &[
                        "TIME", "ALARM", "STATUS", "SEVERITY", "CLUSTER", "NAMESPACE", "PODS",
                    ],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: "No alarms",
                },
            );
        }
    }
}

struct TableView<'a> {
    title: &'a str,
    headers: &'a [&'a str],
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
    loading: bool,
    error: Option<&'a str>,
    last_refreshed: Option<DateTime<Local>>,
    empty_hint: &'a str,
}

fn render_table(frame: &mut Frame, area: Rect, view: TableView<'_>) {
    let mut title = format!("{} ({})", view.title, view.rows.len());
    if view.loading {
        title.push_str(" loading…");
    }
    if let Some(at) = view.last_refreshed {
        title.push_str(&format!(" @ {}", at.format("%H:%M:%S")));
    }

    let (border, area) = match view.error {
        Some(error) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);
            let banner = Paragraph::new(Text::from(compact_text(error, 400)))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title("Error")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(ERROR))
                        .style(Style::default().bg(PANEL)),
                )
                .style(Style::default().fg(ERROR));
            frame.render_widget(banner, split[0]);
            (ERROR, split[1])
        }
        None => (ACCENT, area),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(PANEL));

    if view.rows.is_empty() {
        let hint = if view.loading { "Loading…" } else { view.empty_hint };
        frame.render_widget(
            Paragraph::new(hint).block(block).style(Style::default().fg(MUTED)),
            area,
        );
        return;
    }

    let header_row = Row::new(view.headers.iter().map(|header| {
        Cell::from(header.to_string()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let rows = view.rows.into_iter().map(|row| {
        Row::new(
            row.into_iter()
                .map(|column| Cell::from(column).style(Style::default().fg(Color::White))),
        )
    });

    let table = Table::new(rows, column_constraints(view.headers.len()))
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(view.selected);
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_query(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    let fetcher = console.query();
    let query = fetcher
        .params()
        .map(|params| params.query.clone())
        .unwrap_or_else(|| app.last_query().to_string());

    match fetcher.data() {
        Some(result) if !result.ok => {
            let message = format!(
                "{}\n\nquery: {}",
                result.error.as_deref().unwrap_or("query rejected"),
                query
            );
            render_message(frame, area, "PromQL error", &message, ERROR);
        }
        Some(result) => {
            let rows = result
                .series
                .iter()
                .map(|series| {
                    let latest = series.latest();
                    vec![
                        series.selector(),
                        latest.map(|sample| sample.value.clone()).unwrap_or_default(),
                        series.samples.len().to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            render_table(
                frame,
                area,
                TableView {
                    title: &format!("PromQL {}", compact_text(&query, 60)),
                    headers: &["SERIES", "VALUE", "SAMPLES"],
                    rows,
                    selected: Some(app.selected()),
                    loading: fetcher.loading(),
                    error: fetcher.error(),
                    last_refreshed: fetcher.last_refreshed(),
                    empty_hint: "Query returned no series",
                },
            );
        }
        None => {
            let hint = if fetcher.loading() {
                "Running query…".to_string()
            } else if let Some(error) = fetcher.error() {
                error.to_string()
            } else {
                "Press / to write a query, Enter to run it again".to_string()
            };
            let color = if fetcher.error().is_some() { ERROR } else { MUTED };
            render_message(frame, area, "PromQL", &hint, color);
        }
    }
}

fn render_summary(frame: &mut Frame, area: Rect, console: &Console) {
    let fetcher = console.summary();
    let mut lines = Vec::new();
    match fetcher.data() {
        Some(summary) => {
            lines.push(summary_line("Running", summary.running, ACCENT));
            lines.push(summary_line("Pending", summary.pending, WARN));
            lines.push(summary_line("Failed", summary.failed, ERROR));
            lines.push(summary_line("Restarts", summary.total_restarts, WARN));
            lines.push(summary_line("Warnings", summary.warning_event_count, ERROR));
        }
        None if fetcher.loading() => lines.push(Line::from("Loading…")),
        None => lines.push(Line::from("Pick a cluster (c) and a namespace (n)")),
    }
    if let Some(error) = fetcher.error() {
        lines.push(Line::from(""));
        lines.push(Line::styled(error.to_string(), Style::default().fg(ERROR)));
    }
    if let Some(at) = fetcher.last_refreshed() {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            format!("updated {}", at.format("%H:%M:%S")),
            Style::default().fg(MUTED),
        ));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title("Summary")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(panel, area);
}

fn summary_line(label: &str, value: u32, color: Color) -> Line<'static> {
    let value_color = if value == 0 { MUTED } else { color };
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(Color::White)),
        Span::styled(
            value.to_string(),
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_pod_detail(frame: &mut Frame, area: Rect, console: &Console) {
    let detail = console.detail();
    let Some(key) = detail.open_pod() else {
        return;
    };

    let mut lines = vec![
        Line::styled(
            format!("{}/{}", key.namespace, key.pod),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::styled("Containers", Style::default().add_modifier(Modifier::BOLD)),
    ];
    match detail.metrics() {
        Slot::Idle => {}
        Slot::Loading => lines.push(Line::styled("  loading…", Style::default().fg(MUTED))),
        Slot::Failed(error) => lines.push(Line::styled(
            format!("  {error}"),
            Style::default().fg(ERROR),
        )),
        Slot::Ready(usage) if usage.is_empty() => {
            lines.push(Line::styled("  no samples", Style::default().fg(MUTED)))
        }
        Slot::Ready(usage) => {
            for entry in usage {
                lines.push(Line::from(format!(
                    "  {:<20} cpu {:>8}  mem {:>8}",
                    compact_text(&entry.container, 20),
                    entry.cpu_cores.map(format_cores).unwrap_or_else(|| "-".to_string()),
                    entry
                        .memory_bytes
                        .map(format_bytes_compact)
                        .unwrap_or_else(|| "-".to_string()),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::styled(
        "Recent events",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    match detail.events() {
        Slot::Idle => {}
        Slot::Loading => lines.push(Line::styled("  loading…", Style::default().fg(MUTED))),
        Slot::Failed(error) => lines.push(Line::styled(
            format!("  {error}"),
            Style::default().fg(ERROR),
        )),
        Slot::Ready(events) if events.is_empty() => {
            lines.push(Line::styled("  none", Style::default().fg(MUTED)))
        }
        Slot::Ready(events) => {
            for event in events {
                let color = if event.is_warning() { WARN } else { Color::White };
                lines.push(Line::styled(
                    format!(
                        "  {} {} {}",
                        event.last_timestamp.as_deref().unwrap_or("-"),
                        event.reason.as_deref().unwrap_or("-"),
                        event.message.as_deref().unwrap_or_default(),
                    ),
                    Style::default().fg(color),
                ));
            }
        }
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Pod detail (Esc to close)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(panel, area);
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let panel = Paragraph::new(Text::from(message.to_string()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(color));
    frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, console: &Console) {
    let mut spans = Vec::new();
    let prompt = match app.mode() {
        InputMode::Normal => None,
        InputMode::Query => Some(" promql "),
        InputMode::PodFilter => Some(" pod "),
        InputMode::AlertFilter => Some(" alert ns "),
    };

    if let Some(prompt) = prompt {
        push_powerline_segment(&mut spans, prompt, Color::Black, WARN, BG);
        spans.push(Span::styled(
            format!(" {}▏", app.input()),
            Style::default().fg(Color::White).bg(BG),
        ));
    } else {
        push_powerline_segment(&mut spans, " nrm ", Color::White, PL_A, PL_B);
        let status = console
            .notice()
            .or_else(|| console.run().message().filter(|_| console.run().is_busy()))
            .unwrap_or(app.status());
        let width = area.width.saturating_sub(12).min(120) as usize;
        push_powerline_segment(
            &mut spans,
            format!(" {} ", compact_text(status, width)),
            Color::White,
            PL_B,
            BG,
        );
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_help_modal(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let lines = [
        "1-7 / ←→   switch view",
        "c / C      next / previous cluster",
        "n / N      next / previous namespace",
        "j k g G    move selection",
        "Enter      pod detail (Pods) or re-run query (PromQL)",
        "e          events for the selected pod",
        "Esc        close pod detail / cancel input",
        "/          edit query (PromQL) or pod filter (Events)",
        "f          cycle event type filter",
        "a          filter alerts by namespace",
        "m          monitor by cluster or by namespace",
        "r          refresh current view",
        "R          refresh cluster list",
        "x          trigger a run",
        "p          check run status once",
        "q          quit",
    ]
    .into_iter()
    .map(Line::from)
    .collect::<Vec<_>>();

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn format_cores(cores: f64) -> String {
    if cores < 1.0 {
        format!("{:.0}m", cores * 1000.0)
    } else {
        format!("{cores:.2}")
    }
}

fn format_bytes_compact(bytes: f64) -> String {
    const UNITS: [(&str, f64); 4] = [
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
    ];

    for (suffix, unit) in UNITS {
        if bytes >= unit {
            return format!("{:.1}{suffix}", bytes / unit);
        }
    }

    format!("{bytes:.0}B")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    let width = (100 / columns as u16).max(1);
    (0..columns)
        .map(|_| Constraint::Percentage(width))
        .collect()
}
