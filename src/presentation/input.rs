use crate::application::{App, AppMode, FormField};
use crate::domain::{CsvExporter, MapProjection};
use crate::infrastructure::WorkoutStore;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Form => Self::handle_form_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::ConfirmReset => Self::handle_confirm_reset(app, key),
            AppMode::ExportCsv => Self::handle_filename_input_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('e') = key {
                app.start_csv_export();
                return;
            }
        }

        app.status_message = None;

        match key {
            KeyCode::Up => app.map.pan(0, -1),
            KeyCode::Down => app.map.pan(0, 1),
            KeyCode::Left => app.map.pan(-1, 0),
            KeyCode::Right => app.map.pan(1, 0),
            KeyCode::Char('+') | KeyCode::Char('=') => app.map.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => app.map.zoom_out(),
            KeyCode::Char('j') => app.select_next(),
            KeyCode::Char('k') => app.select_previous(),
            KeyCode::Enter => app.focus_selected(),
            KeyCode::Char('n') => {
                let center = app.map.center;
                app.open_form(center);
            }
            KeyCode::Char('e') => {
                if let Some(id) = app.selected_workout().map(|w| w.id.clone()) {
                    app.open_edit_form(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Backspace => {
                if let Some(id) = app.selected_workout().map(|w| w.id.clone()) {
                    app.delete_workout(&id);
                    Self::persist(app);
                }
            }
            KeyCode::Char('R') => app.request_reset(),
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
    }

    fn handle_form_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                app.submit_form();
                if matches!(app.mode, AppMode::Normal) {
                    Self::persist(app);
                }
            }
            KeyCode::Esc => {
                app.cancel_form();
            }
            KeyCode::Tab | KeyCode::Down => {
                if let Some(form) = app.form.as_mut() {
                    form.next_field();
                    app.cursor_position = form.field_input().map(|s| s.len()).unwrap_or(0);
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(form) = app.form.as_mut() {
                    form.previous_field();
                    app.cursor_position = form.field_input().map(|s| s.len()).unwrap_or(0);
                }
            }
            KeyCode::Left => {
                if let Some(form) = app.form.as_mut() {
                    if form.field == FormField::Kind {
                        form.toggle_kind();
                    } else if app.cursor_position > 0 {
                        app.cursor_position -= 1;
                    }
                }
            }
            KeyCode::Right => {
                if let Some(form) = app.form.as_mut() {
                    if form.field == FormField::Kind {
                        form.toggle_kind();
                    } else {
                        let len = form.field_input().map(|s| s.len()).unwrap_or(0);
                        if app.cursor_position < len {
                            app.cursor_position += 1;
                        }
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(form) = app.form.as_mut() {
                    let cursor = app.cursor_position;
                    if let Some(input) = form.field_input_mut() {
                        if cursor > 0 && cursor <= input.len() {
                            input.remove(cursor - 1);
                            app.cursor_position = cursor - 1;
                        }
                    }
                }
            }
            KeyCode::Delete => {
                if let Some(form) = app.form.as_mut() {
                    let cursor = app.cursor_position;
                    if let Some(input) = form.field_input_mut() {
                        if cursor < input.len() {
                            input.remove(cursor);
                        }
                    }
                }
            }
            KeyCode::Home => {
                app.cursor_position = 0;
            }
            KeyCode::End => {
                if let Some(form) = app.form.as_mut() {
                    app.cursor_position = form.field_input().map(|s| s.len()).unwrap_or(0);
                }
            }
            KeyCode::Char(c) => {
                if let Some(form) = app.form.as_mut() {
                    if form.field == FormField::Kind {
                        if c == ' ' {
                            form.toggle_kind();
                        }
                    } else if c.is_ascii_digit() || c == '.' || c == '-' {
                        let cursor = app.cursor_position;
                        if let Some(input) = form.field_input_mut() {
                            let cursor = cursor.min(input.len());
                            input.insert(cursor, c);
                            app.cursor_position = cursor + 1;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_confirm_reset(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.reset();
                if let Err(error) = WorkoutStore::clear(&app.storage_path) {
                    app.status_message = Some(format!("Reset failed: {}", error));
                }
            }
            _ => app.cancel_reset(),
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let filename = app.get_csv_export_filename();
                let result = CsvExporter::export_to_csv(&app.log, &filename);
                app.set_csv_export_result(result);
            }
            KeyCode::Esc => {
                app.cancel_filename_input();
            }
            KeyCode::Backspace => {
                if app.cursor_position > 0 {
                    app.filename_input.remove(app.cursor_position - 1);
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Delete => {
                if app.cursor_position < app.filename_input.len() {
                    app.filename_input.remove(app.cursor_position);
                }
            }
            KeyCode::Left => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if app.cursor_position < app.filename_input.len() {
                    app.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                app.cursor_position = 0;
            }
            KeyCode::End => {
                app.cursor_position = app.filename_input.len();
            }
            KeyCode::Char(c) => {
                if c.is_ascii() {
                    app.filename_input.insert(app.cursor_position, c);
                    app.cursor_position += 1;
                }
            }
            _ => {}
        }
    }

    pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
        if !matches!(app.mode, AppMode::Normal) {
            return;
        }

        let in_map = Self::contains(app.map_viewport, mouse.column, mouse.row);
        let in_list = Self::contains(app.list_viewport, mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if in_map {
                    let (x, y, width, height) = app.map_viewport;
                    let projection = MapProjection::new(app.map.center, app.map.zoom, width, height);
                    let coords = projection.unproject(mouse.column - x, mouse.row - y);
                    app.open_form(coords);
                } else if in_list {
                    let (_, y, _, _) = app.list_viewport;
                    let index = app.list_scroll + (mouse.row - y) as usize;
                    if index < app.log.len() {
                        app.selected = index;
                        app.focus_selected();
                    }
                }
            }
            MouseEventKind::ScrollUp => {
                if in_map {
                    app.map.zoom_in();
                } else if in_list {
                    app.select_previous();
                }
            }
            MouseEventKind::ScrollDown => {
                if in_map {
                    app.map.zoom_out();
                } else if in_list {
                    app.select_next();
                }
            }
            _ => {}
        }
    }

    fn contains(viewport: (u16, u16, u16, u16), column: u16, row: u16) -> bool {
        let (x, y, width, height) = viewport;
        column >= x && column < x + width && row >= y && row < y + height
    }

    fn persist(app: &mut App) {
        let result = WorkoutStore::save_workouts(&app.log, &app.storage_path);
        app.set_save_result(result);
    }
}
