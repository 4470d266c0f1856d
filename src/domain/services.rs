//! Domain services for the terminal workout log.
//!
//! This module provides workout construction with input validation,
//! the map projection used to place markers on the terminal map pane,
//! and CSV export of the recorded workouts.

use super::errors::{DomainError, DomainResult};
use super::models::{Activity, ActivityKind, Coords, Workout, WorkoutLog};

/// Smallest zoom level the map view accepts.
pub const MIN_ZOOM: u8 = 3;
/// Largest zoom level the map view accepts.
pub const MAX_ZOOM: u8 = 18;

/// Builds validated workouts from raw form input.
///
/// Distance, duration and cadence must parse as finite positive numbers.
/// Elevation gain only has to be finite, so net-downhill rides are
/// recordable with a negative gain.
///
/// # Examples
///
/// ```
/// use twlog::domain::{ActivityKind, Coords, WorkoutBuilder};
///
/// let coords = Coords { lat: 51.505, lng: -0.09 };
/// let workout = WorkoutBuilder::build(ActivityKind::Running, coords, "5.2", "24", "178").unwrap();
/// assert_eq!(workout.pace(), Some(24.0 / 5.2));
///
/// assert!(WorkoutBuilder::build(ActivityKind::Running, coords, "-1", "24", "178").is_err());
/// assert!(WorkoutBuilder::build(ActivityKind::Cycling, coords, "27", "90", "-120").is_ok());
/// ```
pub struct WorkoutBuilder;

impl WorkoutBuilder {
    /// Parses the form fields and constructs a workout at the given coordinates.
    ///
    /// `extra` is the type-specific field: cadence for running, elevation
    /// gain for cycling.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] naming the offending field when a value
    /// does not parse or fails the positivity check.
    pub fn build(
        kind: ActivityKind,
        coords: Coords,
        distance: &str,
        duration: &str,
        extra: &str,
    ) -> DomainResult<Workout> {
        let distance = Self::positive_number("distance", distance)?;
        let duration = Self::positive_number("duration", duration)?;
        let activity = match kind {
            ActivityKind::Running => Activity::Running {
                cadence: Self::positive_number("cadence", extra)?,
            },
            ActivityKind::Cycling => Activity::Cycling {
                elevation_gain: Self::finite_number("elevation gain", extra)?,
            },
        };
        Ok(Workout::new(coords, distance, duration, activity))
    }

    /// Parses a finite number, trimming surrounding whitespace.
    pub fn finite_number(field: &'static str, raw: &str) -> DomainResult<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| DomainError::NotANumber {
                field,
                value: raw.trim().to_string(),
            })
    }

    /// Parses a finite number and requires it to be strictly positive.
    pub fn positive_number(field: &'static str, raw: &str) -> DomainResult<f64> {
        let value = Self::finite_number(field, raw)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(DomainError::NotPositive { field })
        }
    }
}

/// Maps coordinates to terminal cells and back.
///
/// The projection is a plain equirectangular grid around the view center:
/// at zoom level `z` one column covers `360° / (2^z * 4)` of longitude and
/// one row twice that, compensating the 1:2 aspect of terminal cells.
///
/// # Examples
///
/// ```
/// use twlog::domain::{Coords, MapProjection};
///
/// let center = Coords { lat: 51.505, lng: -0.09 };
/// let projection = MapProjection::new(center, 13, 40, 20);
///
/// // The view center lands in the middle cell
/// assert_eq!(projection.project(center), Some((20, 10)));
/// ```
pub struct MapProjection {
    center: Coords,
    zoom: u8,
    width: u16,
    height: u16,
}

impl MapProjection {
    pub fn new(center: Coords, zoom: u8, width: u16, height: u16) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Degrees of longitude per column and latitude per row at a zoom level.
    pub fn cell_degrees(zoom: u8) -> (f64, f64) {
        let per_col = 360.0 / (f64::from(1u32 << zoom.min(MAX_ZOOM)) * 4.0);
        (per_col, per_col * 2.0)
    }

    /// Projects coordinates to a cell, or `None` when they fall outside
    /// the viewport.
    pub fn project(&self, coords: Coords) -> Option<(u16, u16)> {
        let (per_col, per_row) = Self::cell_degrees(self.zoom);
        let col = f64::from(self.width) / 2.0 + (coords.lng - self.center.lng) / per_col;
        let row = f64::from(self.height) / 2.0 + (self.center.lat - coords.lat) / per_row;
        if col < 0.0 || row < 0.0 || col >= f64::from(self.width) || row >= f64::from(self.height) {
            return None;
        }
        Some((col as u16, row as u16))
    }

    /// Coordinates at the middle of the given cell.
    pub fn unproject(&self, col: u16, row: u16) -> Coords {
        let (per_col, per_row) = Self::cell_degrees(self.zoom);
        Coords {
            lat: self.center.lat - (f64::from(row) + 0.5 - f64::from(self.height) / 2.0) * per_row,
            lng: self.center.lng + (f64::from(col) + 0.5 - f64::from(self.width) / 2.0) * per_col,
        }
    }
}

/// Writes the workout log to a CSV file, one row per workout.
///
/// Derived columns (description, pace, speed) are recomputed at export
/// time; cells for fields the activity type lacks stay empty.
pub struct CsvExporter;

impl CsvExporter {
    pub fn export_to_csv(log: &WorkoutLog, filename: &str) -> Result<String, String> {
        let mut writer = csv::Writer::from_path(filename).map_err(|e| e.to_string())?;
        writer
            .write_record([
                "date",
                "type",
                "description",
                "distance_km",
                "duration_min",
                "pace_min_km",
                "speed_kmh",
                "cadence_spm",
                "elevation_gain_m",
                "lat",
                "lng",
            ])
            .map_err(|e| e.to_string())?;

        for workout in log.iter() {
            let (cadence, elevation) = match workout.activity {
                Activity::Running { cadence } => (cadence.to_string(), String::new()),
                Activity::Cycling { elevation_gain } => (String::new(), elevation_gain.to_string()),
            };
            writer
                .write_record([
                    workout.date.format("%Y-%m-%d %H:%M").to_string(),
                    workout.kind().label().to_string(),
                    workout.description(),
                    workout.distance.to_string(),
                    workout.duration.to_string(),
                    workout.pace().map(|p| format!("{:.1}", p)).unwrap_or_default(),
                    workout.speed().map(|s| format!("{:.1}", s)).unwrap_or_default(),
                    cadence,
                    elevation,
                    workout.coords.lat.to_string(),
                    workout.coords.lng.to_string(),
                ])
                .map_err(|e| e.to_string())?;
        }

        writer.flush().map_err(|e| e.to_string())?;
        Ok(filename.to_string())
    }
}
