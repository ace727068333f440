use lw_core::{
    logs::{LogHub, LogSurface},
    media::{PlaceholderKind, RenderInstruction},
    reconcile::DisplayState,
    LogLevel, TaskKind, TaskStatus, Verdict,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, state: &DisplayState, hub: &LogHub) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(12),
        ])
        .split(frame.size());

    render_header(frame, outer[0], state);
    render_stations(frame, outer[1], state);
    render_logs(frame, outer[2], hub);
}

fn render_header(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mode = if state.simulated {
        Span::styled(
            " SIMULATION ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" LIVE ", Style::default().fg(Color::Black).bg(Color::Green))
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Factory Line Monitor",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        mode,
        Span::raw("  press q to quit"),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_stations(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(area);

    for (kind, column) in TaskKind::ALL.into_iter().zip(columns.iter()) {
        render_station(frame, *column, state, kind);
    }
}

fn render_station(frame: &mut Frame, area: Rect, state: &DisplayState, kind: TaskKind) {
    let Some(station) = state.station(kind) else {
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        format!(" {} ", station.status),
        status_style(station.status),
    ))];

    lines.push(Line::raw(""));
    match &station.render {
        RenderInstruction::Placeholder(PlaceholderKind::NoData) => {
            lines.push(Line::from(Span::styled(
                "no data",
                Style::default().fg(Color::DarkGray),
            )));
        }
        RenderInstruction::Placeholder(PlaceholderKind::LoadFailed) => {
            lines.push(Line::from(Span::styled(
                "failed to load",
                Style::default().fg(Color::Red),
            )));
        }
        RenderInstruction::Still { file, timestamp } => {
            lines.push(Line::from(vec![
                Span::styled("IMG ", Style::default().fg(Color::Cyan)),
                Span::raw(file.clone()),
            ]));
            lines.push(Line::from(Span::styled(
                timestamp.clone(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        RenderInstruction::Motion {
            file,
            timestamp,
            looped,
            muted,
            ..
        } => {
            let mut tags = String::new();
            if *looped {
                tags.push_str(" loop");
            }
            if *muted {
                tags.push_str(" muted");
            }
            lines.push(Line::from(vec![
                Span::styled("VID ", Style::default().fg(Color::Magenta)),
                Span::raw(file.clone()),
                Span::styled(tags, Style::default().fg(Color::DarkGray)),
            ]));
            lines.push(Line::from(Span::styled(
                timestamp.clone(),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.push(Line::raw(""));
    match &station.result {
        Some(result) => {
            lines.push(Line::from(vec![
                Span::raw("Result: "),
                Span::styled(result.status.as_str(), verdict_style(result.status)),
                Span::raw(format!("  {}", result.confidence)),
            ]));
            if !result.details.is_empty() {
                lines.push(Line::raw(result.details.clone()));
            }
            for field in kind.result_fields() {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{field}: "),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(result.status.as_str()),
                ]));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Result: -",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if !station.history.is_empty() {
        lines.push(Line::raw(""));
        for file in &station.history {
            lines.push(Line::from(Span::styled(
                format!("· {file}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", kind.label()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_logs(frame: &mut Frame, area: Rect, hub: &LogHub) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_log_surface(frame, panes[0], hub.surface(crate::MAIN_LOG_SURFACE), "System log");
    render_log_surface(
        frame,
        panes[1],
        hub.surface(crate::FOOTER_LOG_SURFACE),
        "Events",
    );
}

fn render_log_surface(
    frame: &mut Frame,
    area: Rect,
    surface: Option<&LogSurface>,
    title: &str,
) {
    let items: Vec<ListItem> = surface
        .map(|s| {
            s.entries()
                .map(|entry| {
                    ListItem::new(Line::from(Span::styled(
                        entry.line.clone(),
                        level_style(entry.level),
                    )))
                })
                .collect()
        })
        .unwrap_or_default();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} ")),
    );
    frame.render_widget(list, area);
}

fn status_style(status: TaskStatus) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match status {
        TaskStatus::Idle => style.fg(Color::DarkGray),
        TaskStatus::Running => style.fg(Color::Cyan),
        TaskStatus::Completed => style.fg(Color::Green),
        TaskStatus::Error => style.fg(Color::Red),
    }
}

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Ok => Style::default().fg(Color::Green),
        Verdict::Ng => Style::default().fg(Color::Yellow),
        Verdict::Error => Style::default().fg(Color::Red),
        Verdict::None => Style::default().fg(Color::DarkGray),
    }
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default().fg(Color::Gray),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red),
        LogLevel::Plain => Style::default().fg(Color::DarkGray),
    }
}
