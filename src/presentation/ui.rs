use crate::application::{format_quantity, App, AppMode, FormField};
use crate::domain::{Activity, ActivityKind, MapProjection};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use std::collections::HashMap;

pub fn render_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(chunks[1]);

    render_map(f, app, panes[0]);
    render_workout_list(f, app, panes[1]);
    render_status_bar(f, app, chunks[2]);

    if matches!(app.mode, AppMode::Form) {
        render_form_popup(f, app);
    }
    if matches!(app.mode, AppMode::Help) {
        render_help_popup(f, app.help_scroll);
    }
}

fn kind_color(kind: ActivityKind) -> Color {
    match kind {
        ActivityKind::Running => Color::Yellow,
        ActivityKind::Cycling => Color::Green,
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(format!(
        "twlog - Terminal Workout Log | {} workout{} | map ({:.4}, {:.4}) z{}",
        app.log.len(),
        if app.log.len() == 1 { "" } else { "s" },
        app.map.center.lat,
        app.map.center.lng,
        app.map.zoom
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_map(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Map");
    let inner = block.inner(area);
    app.update_map_viewport(inner.x, inner.y, inner.width, inner.height);

    if inner.width == 0 || inner.height == 0 {
        f.render_widget(block, area);
        return;
    }

    let projection = MapProjection::new(app.map.center, app.map.zoom, inner.width, inner.height);
    let selected_id = app.selected_workout().map(|w| w.id.clone());

    let mut marker_cells: HashMap<(u16, u16), (ActivityKind, bool)> = HashMap::new();
    for marker in &app.markers {
        let Some(cell) = projection.project(marker.coords) else {
            continue;
        };
        let is_selected = selected_id.as_deref() == Some(marker.workout_id.as_str());
        // A selected marker wins the cell over overlapping neighbors
        match marker_cells.get(&cell) {
            Some((_, true)) if !is_selected => {}
            _ => {
                marker_cells.insert(cell, (marker.kind, is_selected));
            }
        }
    }

    let mut lines: Vec<Line> = Vec::with_capacity(inner.height as usize);
    for row in 0..inner.height {
        let mut spans: Vec<Span> = Vec::with_capacity(inner.width as usize);
        for col in 0..inner.width {
            if let Some(&(kind, is_selected)) = marker_cells.get(&(col, row)) {
                let style = if is_selected {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else {
                    Style::default()
                        .fg(kind_color(kind))
                        .add_modifier(Modifier::BOLD)
                };
                spans.push(Span::styled("●", style));
            } else if col == inner.width / 2 && row == inner.height / 2 {
                spans.push(Span::styled("+", Style::default().fg(Color::DarkGray)));
            } else if col % 10 == 0 && row % 5 == 0 {
                spans.push(Span::styled("·", Style::default().fg(Color::DarkGray)));
            } else {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_workout_list(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Workouts");
    let inner = block.inner(area);
    app.update_list_viewport(
        inner.x,
        inner.y + 1,
        inner.width,
        inner.height.saturating_sub(1),
    );

    if app.log.is_empty() {
        let empty = Paragraph::new("No workouts yet.\nClick the map or press n to record one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_style = Style::default().fg(Color::Yellow);
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Workout").style(header_style),
        Cell::from("km").style(header_style),
        Cell::from("min").style(header_style),
        Cell::from("pace/speed").style(header_style),
        Cell::from("cad/elev").style(header_style),
    ])
    .height(1);

    let mut rows = vec![header];

    let visible = app.list_rows;
    for (index, workout) in app
        .displayed()
        .enumerate()
        .skip(app.list_scroll)
        .take(visible)
    {
        let metric = match (workout.pace(), workout.speed()) {
            (Some(pace), _) => format!("{:.1} min/km", pace),
            (_, Some(speed)) => format!("{:.1} km/h", speed),
            _ => String::new(),
        };
        let extra = match workout.activity {
            Activity::Running { cadence } => format!("{} spm", format_quantity(cadence)),
            Activity::Cycling { elevation_gain } => {
                format!("{} m", format_quantity(elevation_gain))
            }
        };

        let row_style = if index == app.selected {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default()
        };

        rows.push(
            Row::new(vec![
                Cell::from(Span::styled("●", Style::default().fg(kind_color(workout.kind())))),
                Cell::from(workout.description()),
                Cell::from(format_quantity(workout.distance)),
                Cell::from(format_quantity(workout.duration)),
                Cell::from(metric),
                Cell::from(extra),
            ])
            .style(row_style)
            .height(1),
        );
    }

    let widths = vec![
        Constraint::Length(1),
        Constraint::Min(14),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(11),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths).block(block).column_spacing(1);

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                format!(
                    "Log: {} | n: new | e: edit | d: delete | R: reset | Ctrl+E: export CSV | F1/?: help | q: quit",
                    app.storage_path
                )
            }
        }
        AppMode::Form => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else if app.form.as_ref().is_some_and(|form| form.editing.is_some()) {
                "Editing workout (Enter to save, Esc to cancel)".to_string()
            } else {
                "Recording new workout (Enter to save, Esc to cancel)".to_string()
            }
        }
        AppMode::Help => {
            "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string()
        }
        AppMode::ConfirmReset => "Delete all workouts and stored data? (y/N)".to_string(),
        AppMode::ExportCsv => format!(
            "Export CSV as: {} (Enter to export, Esc to cancel)",
            app.filename_input
        ),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Form => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::ConfirmReset => Style::default().fg(Color::Red),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
        });
    f.render_widget(input, area);
}

fn render_form_popup(f: &mut Frame, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let area = f.area();
    let width = 46.min(area.width.saturating_sub(2));
    let height = 8.min(area.height.saturating_sub(2));
    let popup_area = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup_area);

    let focused = form.field;
    let kind_value = format!("< {} >", form.kind.label());
    let lines = vec![
        form_line(
            "Type",
            vec![Span::raw(kind_value)],
            focused == FormField::Kind,
        ),
        form_line(
            "Distance (km)",
            input_spans(&form.distance, app.cursor_position, focused == FormField::Distance),
            focused == FormField::Distance,
        ),
        form_line(
            "Duration (min)",
            input_spans(&form.duration, app.cursor_position, focused == FormField::Duration),
            focused == FormField::Duration,
        ),
        form_line(
            form.extra_label(),
            input_spans(form.extra_input(), app.cursor_position, focused == FormField::Extra),
            focused == FormField::Extra,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Tab: next field | ←/→: change type | Enter: save",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let title = if form.editing.is_some() {
        "Edit workout".to_string()
    } else {
        format!("New workout at {:.4}, {:.4}", form.coords.lat, form.coords.lng)
    };

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(Color::Green)),
    );
    f.render_widget(popup, popup_area);
}

fn form_line(label: &str, value: Vec<Span<'static>>, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![Span::styled(format!(" {:<16}", label), label_style)];
    spans.extend(value);
    Line::from(spans)
}

fn input_spans(value: &str, cursor: usize, focused: bool) -> Vec<Span<'static>> {
    if !focused {
        return vec![Span::raw(value.to_string())];
    }
    let cursor = cursor.min(value.len());
    let (before, rest) = value.split_at(cursor);
    let mut spans = vec![Span::raw(before.to_string())];
    match rest.chars().next() {
        Some(c) => {
            spans.push(Span::styled(
                c.to_string(),
                Style::default().fg(Color::Black).bg(Color::Green),
            ));
            spans.push(Span::raw(rest[c.len_utf8()..].to_string()));
        }
        None => spans.push(Span::styled(" ", Style::default().bg(Color::Green))),
    }
    spans
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("twlog Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

fn get_help_text() -> String {
    r#"TWLOG - TERMINAL WORKOUT LOG

=== BASIC CONCEPTS ===
• Click a point on the map (or press n for the map center) to record
  a workout at that spot
• Two activity types: running (with cadence) and cycling (with
  elevation gain)
• Pace (min/km) and speed (km/h) are derived from distance and
  duration, never entered by hand
• Every change is saved to the log file immediately and loaded back
  on the next start

=== MAP ===
Arrow keys      Pan the view
+ / -           Zoom in / out (also mouse wheel over the map)
Left click      Open the workout form at the clicked point
●               Workout marker (yellow: running, green: cycling)
+               View center

=== WORKOUT LIST ===
j / k           Move the selection down / up
Enter           Center the map on the selected workout
Left click      Select and center on the clicked entry
e               Edit the selected workout
d / Backspace   Delete the selected workout
R               Delete all workouts (asks for confirmation)

=== WORKOUT FORM ===
Tab / Down      Next field
Shift+Tab / Up  Previous field
← / →           Switch running/cycling on the type field
Enter           Validate and save
Esc             Cancel without saving

Distance, duration and cadence must be positive numbers.
Elevation gain may be negative for net-downhill rides.
Editing keeps the workout in place; switching its type replaces it
with a fresh record at the same spot.

=== FILE OPERATIONS ===
Ctrl+E          Export the log to a CSV file
                The log itself is stored as "workouts.json"

=== OTHER ===
F1 or ?         Show this help (scroll with ↑↓, PgUp/PgDn, Home)
q               Quit application

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#
        .to_string()
}
