use crate::domain::WorkoutLog;
use std::fs;
use std::path::Path;

pub struct WorkoutStore;

impl WorkoutStore {
    pub fn save_workouts(log: &WorkoutLog, filename: &str) -> Result<String, String> {
        match serde_json::to_string_pretty(log) {
            Ok(json) => {
                match fs::write(filename, &json) {
                    Ok(_) => Ok(filename.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
            Err(e) => Err(format!("Serialization failed: {}", e)),
        }
    }

    pub fn load_workouts(filename: &str) -> Result<WorkoutLog, String> {
        // No stored log yet is a normal first start, not an error
        if !Path::new(filename).exists() {
            return Ok(WorkoutLog::default());
        }
        match fs::read_to_string(filename) {
            Ok(content) => {
                match serde_json::from_str::<WorkoutLog>(&content) {
                    Ok(log) => Ok(log),
                    Err(e) => Err(format!("Invalid file format - {}", e)),
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn clear(filename: &str) -> Result<(), String> {
        if !Path::new(filename).exists() {
            return Ok(());
        }
        fs::remove_file(filename).map_err(|e| e.to_string())
    }
}
