//! Application state management for the terminal workout log.
//!
//! This module contains the main application state and mode management
//! for the terminal user interface.

use crate::domain::{
    Activity, ActivityKind, Coords, DomainError, DomainResult, MapProjection, Workout,
    WorkoutBuilder, WorkoutLog, MAX_ZOOM, MIN_ZOOM,
};

/// Represents the current mode of the application.
///
/// The application can be in different modes that determine how user input
/// is interpreted and what UI elements are displayed.
#[derive(Debug)]
pub enum AppMode {
    /// Normal navigation mode - pan/zoom the map, move the list selection
    Normal,
    /// Workout form is open - user is entering or editing a workout
    Form,
    /// Help screen is displayed
    Help,
    /// Reset confirmation prompt is active
    ConfirmReset,
    /// CSV export dialog is open
    ExportCsv,
}

/// Map view state: the center the panes render around and the zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coords,
    pub zoom: u8,
}

impl MapView {
    /// Zoom level used when the view centers on a workout.
    pub const DEFAULT_ZOOM: u8 = 13;

    pub fn zoom_in(&mut self) {
        if self.zoom < MAX_ZOOM {
            self.zoom += 1;
        }
    }

    pub fn zoom_out(&mut self) {
        if self.zoom > MIN_ZOOM {
            self.zoom -= 1;
        }
    }

    /// Centers the view on the given coordinates at the standard zoom.
    pub fn center_on(&mut self, coords: Coords) {
        self.center = coords;
        self.zoom = Self::DEFAULT_ZOOM;
    }

    /// Moves the center by whole cells at the current zoom level.
    pub fn pan(&mut self, d_cols: i16, d_rows: i16) {
        let (per_col, per_row) = MapProjection::cell_degrees(self.zoom);
        self.center.lng = (self.center.lng + f64::from(d_cols) * per_col).clamp(-180.0, 180.0);
        self.center.lat = (self.center.lat - f64::from(d_rows) * per_row).clamp(-85.0, 85.0);
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coords { lat: 51.505, lng: -0.09 },
            zoom: Self::DEFAULT_ZOOM,
        }
    }
}

/// Map overlay for one workout.
///
/// Markers are kept strictly in sync with the workout list: one marker per
/// workout, carrying the popup text and the activity kind for styling.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub workout_id: String,
    pub coords: Coords,
    pub popup: String,
    pub kind: ActivityKind,
}

impl Marker {
    pub fn for_workout(workout: &Workout) -> Self {
        Self {
            workout_id: workout.id.clone(),
            coords: workout.coords,
            popup: workout.description(),
            kind: workout.kind(),
        }
    }
}

/// Field focus inside the workout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Kind,
    Distance,
    Duration,
    /// Cadence for running, elevation gain for cycling
    Extra,
}

/// Input state of the workout form.
///
/// Holds the raw text the user typed; parsing and validation happen on
/// submission. `editing` carries the id of the workout being edited, or
/// `None` when recording a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub kind: ActivityKind,
    pub coords: Coords,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
    pub field: FormField,
    pub editing: Option<String>,
}

impl WorkoutForm {
    /// Blank form for a new workout at the clicked coordinates.
    ///
    /// The distance field gets the initial focus, matching where data
    /// entry starts.
    pub fn new_at(coords: Coords) -> Self {
        Self {
            kind: ActivityKind::Running,
            coords,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
            field: FormField::Distance,
            editing: None,
        }
    }

    /// Form prefilled with an existing workout's values.
    pub fn for_workout(workout: &Workout) -> Self {
        let mut form = Self::new_at(workout.coords);
        form.kind = workout.kind();
        form.distance = format_quantity(workout.distance);
        form.duration = format_quantity(workout.duration);
        match workout.activity {
            Activity::Running { cadence } => form.cadence = format_quantity(cadence),
            Activity::Cycling { elevation_gain } => {
                form.elevation = format_quantity(elevation_gain)
            }
        }
        form.editing = Some(workout.id.clone());
        form
    }

    /// Switches between running and cycling, swapping the extra field.
    pub fn toggle_kind(&mut self) {
        self.kind = match self.kind {
            ActivityKind::Running => ActivityKind::Cycling,
            ActivityKind::Cycling => ActivityKind::Running,
        };
    }

    /// The type-specific input: cadence for running, elevation for cycling.
    pub fn extra_input(&self) -> &str {
        match self.kind {
            ActivityKind::Running => &self.cadence,
            ActivityKind::Cycling => &self.elevation,
        }
    }

    pub fn extra_label(&self) -> &'static str {
        match self.kind {
            ActivityKind::Running => "Cadence (spm)",
            ActivityKind::Cycling => "Elev. gain (m)",
        }
    }

    /// Text buffer of the focused field, `None` on the kind selector.
    pub fn field_input(&self) -> Option<&String> {
        match self.field {
            FormField::Kind => None,
            FormField::Distance => Some(&self.distance),
            FormField::Duration => Some(&self.duration),
            FormField::Extra => Some(match self.kind {
                ActivityKind::Running => &self.cadence,
                ActivityKind::Cycling => &self.elevation,
            }),
        }
    }

    pub fn field_input_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Kind => None,
            FormField::Distance => Some(&mut self.distance),
            FormField::Duration => Some(&mut self.duration),
            FormField::Extra => Some(match self.kind {
                ActivityKind::Running => &mut self.cadence,
                ActivityKind::Cycling => &mut self.elevation,
            }),
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Kind => FormField::Distance,
            FormField::Distance => FormField::Duration,
            FormField::Duration => FormField::Extra,
            FormField::Extra => FormField::Kind,
        };
    }

    pub fn previous_field(&mut self) {
        self.field = match self.field {
            FormField::Kind => FormField::Extra,
            FormField::Distance => FormField::Kind,
            FormField::Duration => FormField::Distance,
            FormField::Extra => FormField::Duration,
        };
    }
}

/// Main application state containing the workout log and UI state.
///
/// The log is the source of truth; the rendered list (newest first) and
/// the marker overlays are kept consistent with it under create, edit and
/// delete operations.
///
/// # Examples
///
/// ```
/// use twlog::application::App;
///
/// let app = App::default();
/// assert!(app.log.is_empty());
/// assert_eq!(app.selected, 0);
/// ```
#[derive(Debug)]
pub struct App {
    /// The recorded workouts, oldest first
    pub log: WorkoutLog,
    /// Map overlays, one per workout
    pub markers: Vec<Marker>,
    /// Map center and zoom
    pub map: MapView,
    /// Current application mode
    pub mode: AppMode,
    /// Workout form state while in form mode
    pub form: Option<WorkoutForm>,
    /// Selected entry in the newest-first list
    pub selected: usize,
    /// First visible entry of the list viewport
    pub list_scroll: usize,
    /// Rows the list viewport can show
    pub list_rows: usize,
    /// Cursor position within the focused input buffer
    pub cursor_position: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Input buffer for the CSV export filename
    pub filename_input: String,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Where the workout log is persisted
    pub storage_path: String,
    /// Map pane interior as (x, y, width, height), set during rendering
    pub map_viewport: (u16, u16, u16, u16),
    /// List rows region as (x, y, width, height), set during rendering
    pub list_viewport: (u16, u16, u16, u16),
}

impl Default for App {
    fn default() -> Self {
        Self {
            log: WorkoutLog::default(),
            markers: Vec::new(),
            map: MapView::default(),
            mode: AppMode::Normal,
            form: None,
            selected: 0,
            list_scroll: 0,
            list_rows: 20,
            cursor_position: 0,
            status_message: None,
            filename_input: String::new(),
            help_scroll: 0,
            storage_path: "workouts.json".to_string(),
            map_viewport: (0, 0, 0, 0),
            list_viewport: (0, 0, 0, 0),
        }
    }
}

impl App {
    /// Workouts in display order, newest first.
    pub fn displayed(&self) -> impl Iterator<Item = &Workout> {
        self.log.iter().rev()
    }

    /// The workout under the list selection.
    pub fn selected_workout(&self) -> Option<&Workout> {
        self.displayed().nth(self.selected)
    }

    /// Opens the workout form for the given coordinates.
    ///
    /// Entered on a map click or on `n` for the current map center.
    ///
    /// # Examples
    ///
    /// ```
    /// use twlog::application::{App, AppMode};
    /// use twlog::domain::Coords;
    ///
    /// let mut app = App::default();
    /// app.open_form(Coords { lat: 51.5, lng: -0.09 });
    /// assert!(matches!(app.mode, AppMode::Form));
    /// assert!(app.form.is_some());
    /// ```
    pub fn open_form(&mut self, coords: Coords) {
        self.form = Some(WorkoutForm::new_at(coords));
        self.mode = AppMode::Form;
        self.cursor_position = 0;
        self.status_message = None;
    }

    /// Opens the form prefilled with an existing workout for editing.
    pub fn open_edit_form(&mut self, id: &str) {
        let Some(workout) = self.log.find(id) else {
            return;
        };
        let form = WorkoutForm::for_workout(workout);
        self.cursor_position = form.distance.len();
        self.form = Some(form);
        self.mode = AppMode::Form;
        self.status_message = None;
    }

    /// Closes the form without touching the log.
    pub fn cancel_form(&mut self) {
        self.mode = AppMode::Normal;
        self.form = None;
        self.cursor_position = 0;
    }

    /// Submits the open form.
    ///
    /// Creates a new workout or applies an edit, keeping the marker set in
    /// sync. On validation failure the form stays open and the status
    /// message reports the problem.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let outcome = match form.editing.clone() {
            Some(id) => self.apply_edit(&id, &form),
            None => self.apply_new(&form),
        };
        match outcome {
            Ok(message) => {
                self.form = None;
                self.mode = AppMode::Normal;
                self.cursor_position = 0;
                self.status_message = Some(message);
            }
            Err(error) => {
                self.status_message = Some(error.to_string());
            }
        }
    }

    fn apply_new(&mut self, form: &WorkoutForm) -> DomainResult<String> {
        let workout = WorkoutBuilder::build(
            form.kind,
            form.coords,
            &form.distance,
            &form.duration,
            form.extra_input(),
        )?;
        let message = format!("Recorded {}", workout.description());
        self.markers.push(Marker::for_workout(&workout));
        self.log.add(workout);
        // The new entry shows at the top of the list
        self.selected = 0;
        self.list_scroll = 0;
        Ok(message)
    }

    /// Applies an edit to the workout with the given id.
    ///
    /// Same activity type: the record mutates in place, keeping id, date
    /// and click count; derived metrics follow automatically. Changed
    /// activity type: the record is replaced by a fresh one of the other
    /// type at the same coordinates and list position, and its marker is
    /// replaced along with it.
    fn apply_edit(&mut self, id: &str, form: &WorkoutForm) -> DomainResult<String> {
        let distance = WorkoutBuilder::positive_number("distance", &form.distance)?;
        let duration = WorkoutBuilder::positive_number("duration", &form.duration)?;
        let activity = match form.kind {
            ActivityKind::Running => Activity::Running {
                cadence: WorkoutBuilder::positive_number("cadence", &form.cadence)?,
            },
            ActivityKind::Cycling => Activity::Cycling {
                elevation_gain: WorkoutBuilder::finite_number("elevation gain", &form.elevation)?,
            },
        };
        let index = self
            .log
            .position(id)
            .ok_or_else(|| DomainError::WorkoutNotFound(id.to_string()))?;

        if self.log.workouts[index].kind() == form.kind {
            let workout = &mut self.log.workouts[index];
            workout.distance = distance;
            workout.duration = duration;
            workout.activity = activity;
            let popup = workout.description();
            let kind = workout.kind();
            let message = format!("Updated {}", popup);
            if let Some(marker) = self.markers.iter_mut().find(|m| m.workout_id == id) {
                marker.popup = popup;
                marker.kind = kind;
            }
            Ok(message)
        } else {
            let coords = self.log.workouts[index].coords;
            let replacement = Workout::new(coords, distance, duration, activity);
            self.markers.retain(|m| m.workout_id != id);
            self.markers.push(Marker::for_workout(&replacement));
            let message = format!("Changed to {}", replacement.description());
            self.log.workouts[index] = replacement;
            Ok(message)
        }
    }

    /// Removes a workout and its marker.
    pub fn delete_workout(&mut self, id: &str) {
        let Some(removed) = self.log.remove(id) else {
            return;
        };
        self.markers.retain(|m| m.workout_id != id);
        if self.selected >= self.log.len() {
            self.selected = self.log.len().saturating_sub(1);
        }
        self.ensure_selected_visible();
        self.status_message = Some(format!("Deleted {}", removed.description()));
    }

    /// Asks for confirmation before wiping the log.
    pub fn request_reset(&mut self) {
        self.mode = AppMode::ConfirmReset;
        self.status_message = None;
    }

    pub fn cancel_reset(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Drops every workout and marker.
    pub fn reset(&mut self) {
        self.log.clear();
        self.markers.clear();
        self.selected = 0;
        self.list_scroll = 0;
        self.mode = AppMode::Normal;
        self.status_message = Some("All workouts deleted".to_string());
    }

    /// Centers the map on the selected workout and counts the visit.
    pub fn focus_selected(&mut self) {
        let Some(id) = self.selected_workout().map(|w| w.id.clone()) else {
            return;
        };
        self.focus_workout(&id);
    }

    pub fn focus_workout(&mut self, id: &str) {
        let Some(workout) = self.log.find_mut(id) else {
            return;
        };
        workout.click();
        let coords = workout.coords;
        self.map.center_on(coords);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.log.len() {
            self.selected += 1;
            self.ensure_selected_visible();
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.ensure_selected_visible();
        }
    }

    /// Adjusts the list scroll so the selection stays visible.
    pub fn ensure_selected_visible(&mut self) {
        if self.list_rows == 0 {
            return;
        }
        if self.selected < self.list_scroll {
            self.list_scroll = self.selected;
        } else if self.selected >= self.list_scroll + self.list_rows {
            self.list_scroll = self.selected + 1 - self.list_rows;
        }
    }

    /// Records where the map pane interior landed during rendering.
    pub fn update_map_viewport(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.map_viewport = (x, y, width, height);
    }

    /// Records where the list rows landed during rendering.
    pub fn update_list_viewport(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.list_viewport = (x, y, width, height);
        self.list_rows = height as usize;
    }

    /// Processes the result of loading the stored log.
    ///
    /// Rebuilds the marker overlays from the loaded workouts and resets
    /// the list position. A failed load leaves the current log untouched.
    pub fn set_load_result(&mut self, result: Result<WorkoutLog, String>) {
        match result {
            Ok(log) => {
                self.markers = log.iter().map(Marker::for_workout).collect();
                if !log.is_empty() {
                    self.status_message = Some(format!(
                        "Loaded {} workout{} from {}",
                        log.len(),
                        if log.len() == 1 { "" } else { "s" },
                        self.storage_path
                    ));
                }
                self.log = log;
                self.selected = 0;
                self.list_scroll = 0;
            }
            Err(error) => {
                self.status_message = Some(format!("Load failed: {}", error));
            }
        }
    }

    /// Processes the result of persisting the log.
    ///
    /// Saves run after every mutation, so success stays quiet and only a
    /// failure surfaces in the status bar.
    pub fn set_save_result(&mut self, result: Result<String, String>) {
        if let Err(error) = result {
            self.status_message = Some(format!("Save failed: {}", error));
        }
    }

    /// Switches to CSV export mode to prompt for a filename.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = self.storage_path.replace(".json", ".csv");
        self.cursor_position = self.filename_input.len();
        self.status_message = None;
    }

    /// Gets the filename to use for CSV export.
    pub fn get_csv_export_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "workouts.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    /// Processes the result of a CSV export operation.
    pub fn set_csv_export_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(filename) => {
                self.status_message = Some(format!("Exported to {}", filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Export failed: {}", error));
            }
        }

        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Cancels filename input and returns to normal mode.
    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }
}

/// Formats a quantity the way it was typed: no trailing `.0` on whole
/// numbers.
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICK: Coords = Coords { lat: 51.49, lng: -0.12 };

    fn app_with_running_workout() -> App {
        let mut app = App::default();
        app.open_form(CLICK);
        let form = app.form.as_mut().unwrap();
        form.distance = "5.2".to_string();
        form.duration = "24".to_string();
        form.cadence = "178".to_string();
        app.submit_form();
        app
    }

    #[test]
    fn test_app_default() {
        let app = App::default();
        assert!(app.log.is_empty());
        assert!(app.markers.is_empty());
        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.form.is_none());
        assert_eq!(app.selected, 0);
        assert_eq!(app.list_scroll, 0);
        assert!(app.status_message.is_none());
        assert_eq!(app.storage_path, "workouts.json");
        assert_eq!(app.map.zoom, MapView::DEFAULT_ZOOM);
    }

    #[test]
    fn test_open_form_at_clicked_coords() {
        let mut app = App::default();
        app.open_form(CLICK);

        assert!(matches!(app.mode, AppMode::Form));
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.coords, CLICK);
        assert_eq!(form.kind, ActivityKind::Running);
        assert_eq!(form.field, FormField::Distance);
        assert!(form.editing.is_none());
    }

    #[test]
    fn test_cancel_form() {
        let mut app = App::default();
        app.open_form(CLICK);
        app.cancel_form();

        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.form.is_none());
        assert!(app.log.is_empty());
    }

    #[test]
    fn test_submit_creates_workout_and_marker() {
        let app = app_with_running_workout();

        assert_eq!(app.log.len(), 1);
        assert_eq!(app.markers.len(), 1);
        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.form.is_none());
        assert_eq!(app.selected, 0);

        let workout = app.log.get(0).unwrap();
        assert_eq!(workout.coords, CLICK);
        assert_eq!(workout.distance, 5.2);
        assert_eq!(workout.pace(), Some(24.0 / 5.2));

        let marker = &app.markers[0];
        assert_eq!(marker.workout_id, workout.id);
        assert_eq!(marker.coords, CLICK);
        assert_eq!(marker.popup, workout.description());
        assert_eq!(marker.kind, ActivityKind::Running);

        assert!(app.status_message.as_ref().unwrap().starts_with("Recorded"));
    }

    #[test]
    fn test_submit_rejects_invalid_input_and_keeps_form_open() {
        let mut app = App::default();
        app.open_form(CLICK);
        let form = app.form.as_mut().unwrap();
        form.distance = "-5".to_string();
        form.duration = "24".to_string();
        form.cadence = "178".to_string();
        app.submit_form();

        assert!(matches!(app.mode, AppMode::Form));
        assert!(app.form.is_some());
        assert!(app.log.is_empty());
        assert!(app.markers.is_empty());
        assert!(app
            .status_message
            .as_ref()
            .unwrap()
            .contains("positive number"));
    }

    #[test]
    fn test_submit_cycling_accepts_negative_elevation() {
        let mut app = App::default();
        app.open_form(CLICK);
        let form = app.form.as_mut().unwrap();
        form.toggle_kind();
        form.distance = "27".to_string();
        form.duration = "90".to_string();
        form.elevation = "-120".to_string();
        app.submit_form();

        assert_eq!(app.log.len(), 1);
        assert_eq!(app.log.get(0).unwrap().speed(), Some(18.0));
    }

    #[test]
    fn test_edit_form_is_prefilled() {
        let mut app = app_with_running_workout();
        let id = app.log.get(0).unwrap().id.clone();
        app.open_edit_form(&id);

        assert!(matches!(app.mode, AppMode::Form));
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.kind, ActivityKind::Running);
        assert_eq!(form.distance, "5.2");
        assert_eq!(form.duration, "24");
        assert_eq!(form.cadence, "178");
        assert_eq!(form.editing.as_deref(), Some(id.as_str()));
        assert_eq!(app.cursor_position, "5.2".len());
    }

    #[test]
    fn test_edit_same_kind_mutates_in_place() {
        let mut app = app_with_running_workout();
        let before = app.log.get(0).unwrap().clone();

        app.open_edit_form(&before.id);
        let form = app.form.as_mut().unwrap();
        form.distance = "10".to_string();
        app.submit_form();

        assert_eq!(app.log.len(), 1);
        let after = app.log.get(0).unwrap();
        // Identity survives an in-place edit
        assert_eq!(after.id, before.id);
        assert_eq!(after.date, before.date);
        assert_eq!(after.distance, 10.0);
        // Pace follows the new distance
        assert_eq!(after.pace(), Some(24.0 / 10.0));

        assert_eq!(app.markers.len(), 1);
        assert_eq!(app.markers[0].workout_id, before.id);
        assert_eq!(app.markers[0].popup, after.description());
    }

    #[test]
    fn test_edit_kind_change_replaces_the_record() {
        let mut app = app_with_running_workout();
        let before = app.log.get(0).unwrap().clone();

        app.open_edit_form(&before.id);
        let form = app.form.as_mut().unwrap();
        form.toggle_kind();
        form.distance = "27".to_string();
        form.duration = "90".to_string();
        form.elevation = "523".to_string();
        app.submit_form();

        assert_eq!(app.log.len(), 1);
        let after = app.log.get(0).unwrap();
        // Replacement: fresh record of the other type at the same spot
        assert_ne!(after.id, before.id);
        assert_eq!(after.coords, before.coords);
        assert_eq!(after.kind(), ActivityKind::Cycling);
        assert_eq!(after.speed(), Some(18.0));

        assert_eq!(app.markers.len(), 1);
        assert_eq!(app.markers[0].workout_id, after.id);
        assert_eq!(app.markers[0].kind, ActivityKind::Cycling);
    }

    #[test]
    fn test_edit_validation_failure_changes_nothing() {
        let mut app = app_with_running_workout();
        let before = app.log.get(0).unwrap().clone();

        app.open_edit_form(&before.id);
        let form = app.form.as_mut().unwrap();
        form.duration = "abc".to_string();
        app.submit_form();

        assert!(matches!(app.mode, AppMode::Form));
        assert_eq!(app.log.get(0).unwrap(), &before);
    }

    #[test]
    fn test_delete_workout_removes_record_and_marker() {
        let mut app = app_with_running_workout();
        let id = app.log.get(0).unwrap().id.clone();

        app.delete_workout(&id);

        assert!(app.log.is_empty());
        assert!(app.markers.is_empty());
        assert_eq!(app.selected, 0);
        assert!(app.status_message.as_ref().unwrap().starts_with("Deleted"));
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut app = app_with_running_workout();
        app.open_form(CLICK);
        let form = app.form.as_mut().unwrap();
        form.distance = "3".to_string();
        form.duration = "15".to_string();
        form.cadence = "170".to_string();
        app.submit_form();

        app.selected = 1;
        let id = app.selected_workout().unwrap().id.clone();
        app.delete_workout(&id);

        assert_eq!(app.log.len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_reset_flow() {
        let mut app = app_with_running_workout();

        app.request_reset();
        assert!(matches!(app.mode, AppMode::ConfirmReset));

        app.cancel_reset();
        assert!(matches!(app.mode, AppMode::Normal));
        assert_eq!(app.log.len(), 1);

        app.request_reset();
        app.reset();
        assert!(app.log.is_empty());
        assert!(app.markers.is_empty());
        assert!(matches!(app.mode, AppMode::Normal));
    }

    #[test]
    fn test_focus_selected_pans_map_and_counts_click() {
        let mut app = app_with_running_workout();
        app.map.pan(10, 10);
        app.map.zoom = 8;

        app.focus_selected();

        let workout = app.log.get(0).unwrap();
        assert_eq!(workout.clicks, 1);
        assert_eq!(app.map.center, workout.coords);
        assert_eq!(app.map.zoom, MapView::DEFAULT_ZOOM);
    }

    #[test]
    fn test_displayed_order_is_newest_first() {
        let mut app = app_with_running_workout();
        let first_id = app.log.get(0).unwrap().id.clone();

        app.open_form(Coords { lat: 51.6, lng: -0.2 });
        let form = app.form.as_mut().unwrap();
        form.toggle_kind();
        form.distance = "27".to_string();
        form.duration = "90".to_string();
        form.elevation = "523".to_string();
        app.submit_form();

        let displayed: Vec<&str> = app.displayed().map(|w| w.id.as_str()).collect();
        assert_eq!(displayed.len(), 2);
        assert_eq!(displayed[1], first_id);
        assert_eq!(app.selected_workout().unwrap().kind(), ActivityKind::Cycling);
    }

    #[test]
    fn test_selection_bounds_and_scrolling() {
        let mut app = App::default();
        for i in 0..6 {
            app.open_form(CLICK);
            let form = app.form.as_mut().unwrap();
            form.distance = format!("{}", i + 1);
            form.duration = "10".to_string();
            form.cadence = "170".to_string();
            app.submit_form();
        }
        app.list_rows = 3;

        app.select_previous();
        assert_eq!(app.selected, 0);

        for _ in 0..10 {
            app.select_next();
        }
        assert_eq!(app.selected, 5);
        assert_eq!(app.list_scroll, 3);

        for _ in 0..10 {
            app.select_previous();
        }
        assert_eq!(app.selected, 0);
        assert_eq!(app.list_scroll, 0);
    }

    #[test]
    fn test_set_load_result_rebuilds_markers() {
        let mut app = App::default();
        let loaded = app_with_running_workout().log;

        app.set_load_result(Ok(loaded));

        assert_eq!(app.log.len(), 1);
        assert_eq!(app.markers.len(), 1);
        assert_eq!(app.markers[0].workout_id, app.log.get(0).unwrap().id);
        assert!(app.status_message.as_ref().unwrap().contains("Loaded 1 workout"));
    }

    #[test]
    fn test_set_load_result_failure_keeps_log() {
        let mut app = app_with_running_workout();

        app.set_load_result(Err("disk on fire".to_string()));

        assert_eq!(app.log.len(), 1);
        assert!(app.status_message.as_ref().unwrap().contains("Load failed"));
    }

    #[test]
    fn test_set_save_result_is_quiet_on_success() {
        let mut app = App::default();
        app.status_message = None;

        app.set_save_result(Ok("workouts.json".to_string()));
        assert!(app.status_message.is_none());

        app.set_save_result(Err("read-only".to_string()));
        assert!(app.status_message.as_ref().unwrap().contains("Save failed"));
    }

    #[test]
    fn test_csv_export_mode() {
        let mut app = App::default();
        app.start_csv_export();

        assert!(matches!(app.mode, AppMode::ExportCsv));
        assert_eq!(app.filename_input, "workouts.csv");
        assert_eq!(app.cursor_position, "workouts.csv".len());

        app.filename_input.clear();
        assert_eq!(app.get_csv_export_filename(), "workouts.csv");

        app.set_csv_export_result(Ok("run.csv".to_string()));
        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.status_message.as_ref().unwrap().contains("Exported to run.csv"));
        assert!(app.filename_input.is_empty());
    }

    #[test]
    fn test_map_view_pan_and_zoom() {
        let mut map = MapView::default();
        let start = map.center;

        map.pan(3, 0);
        assert!(map.center.lng > start.lng);
        map.pan(0, -2);
        assert!(map.center.lat > start.lat);

        map.zoom = MAX_ZOOM;
        map.zoom_in();
        assert_eq!(map.zoom, MAX_ZOOM);

        map.zoom = MIN_ZOOM;
        map.zoom_out();
        assert_eq!(map.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_form_field_cycle_and_kind_toggle() {
        let mut form = WorkoutForm::new_at(CLICK);
        assert_eq!(form.field, FormField::Distance);

        form.next_field();
        assert_eq!(form.field, FormField::Duration);
        form.next_field();
        assert_eq!(form.field, FormField::Extra);
        form.next_field();
        assert_eq!(form.field, FormField::Kind);
        form.previous_field();
        assert_eq!(form.field, FormField::Extra);

        assert_eq!(form.extra_label(), "Cadence (spm)");
        form.toggle_kind();
        assert_eq!(form.kind, ActivityKind::Cycling);
        assert_eq!(form.extra_label(), "Elev. gain (m)");
        form.cadence = "178".to_string();
        form.elevation = "523".to_string();
        assert_eq!(form.extra_input(), "523");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(24.0), "24");
        assert_eq!(format_quantity(5.2), "5.2");
        assert_eq!(format_quantity(-120.0), "-120");
    }
}
