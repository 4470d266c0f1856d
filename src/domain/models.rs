use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Serialize for Coords {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.lat)?;
        seq.serialize_element(&self.lng)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Coords {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{SeqAccess, Visitor};
        use std::fmt;

        struct CoordsVisitor;

        impl<'de> Visitor<'de> for CoordsVisitor {
            type Value = Coords;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [lat, lng] pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let lat = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let lng = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                Ok(Coords { lat, lng })
            }
        }

        deserializer.deserialize_seq(CoordsVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Running,
    Cycling,
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::Running => "running",
            ActivityKind::Cycling => "cycling",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ActivityKind::Running => "Running",
            ActivityKind::Cycling => "Cycling",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Running {
        cadence: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
    },
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::Running { .. } => ActivityKind::Running,
            Activity::Cycling { .. } => ActivityKind::Cycling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub date: DateTime<Local>,
    pub coords: Coords,
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub clicks: u32,
    #[serde(flatten)]
    pub activity: Activity,
}

impl Workout {
    pub fn new(coords: Coords, distance: f64, duration: f64, activity: Activity) -> Self {
        let date = Local::now();
        Self {
            id: short_id(&date),
            date,
            coords,
            distance,
            duration,
            clicks: 0,
            activity,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        self.activity.kind()
    }

    /// Pace in min/km, defined for running workouts only.
    pub fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { .. } => Some(self.duration / self.distance),
            Activity::Cycling { .. } => None,
        }
    }

    /// Speed in km/h, defined for cycling workouts only.
    pub fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { .. } => Some(self.distance / (self.duration / 60.0)),
            Activity::Running { .. } => None,
        }
    }

    pub fn description(&self) -> String {
        format!("{} on {}", self.kind().title(), self.date.format("%B %-d"))
    }

    pub fn click(&mut self) {
        self.clicks += 1;
    }
}

fn short_id(date: &DateTime<Local>) -> String {
    // Ids stay unique within a session even when two workouts land in the
    // same millisecond
    static LAST: Mutex<i64> = Mutex::new(0);
    let millis = date.timestamp_millis();
    let mut last = match LAST.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let unique = if millis > *last { millis } else { *last + 1 };
    *last = unique;
    let digits = unique.to_string();
    digits[digits.len().saturating_sub(10)..].to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutLog {
    pub workouts: Vec<Workout>,
}

impl WorkoutLog {
    pub fn add(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Workout> {
        self.workouts.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|workout| workout.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|workout| workout.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|workout| workout.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Workout> {
        let index = self.position(id)?;
        Some(self.workouts.remove(index))
    }

    pub fn clear(&mut self) {
        self.workouts.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Workout> {
        self.workouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_running() -> Workout {
        let mut workout = Workout::new(
            Coords { lat: 51.5, lng: -0.09 },
            5.2,
            24.0,
            Activity::Running { cadence: 178.0 },
        );
        workout.id = "1234567890".to_string();
        workout.date = Local.with_ymd_and_hms(2026, 4, 5, 7, 30, 0).unwrap();
        workout
    }

    fn sample_cycling() -> Workout {
        let mut workout = Workout::new(
            Coords { lat: 51.51, lng: -0.1 },
            27.0,
            90.0,
            Activity::Cycling { elevation_gain: 523.0 },
        );
        workout.id = "0987654321".to_string();
        workout.date = Local.with_ymd_and_hms(2026, 7, 19, 18, 0, 0).unwrap();
        workout
    }

    #[test]
    fn test_running_pace() {
        let workout = sample_running();
        assert_eq!(workout.pace(), Some(24.0 / 5.2));
        assert_eq!(workout.speed(), None);
    }

    #[test]
    fn test_cycling_speed() {
        let workout = sample_cycling();
        assert_eq!(workout.speed(), Some(18.0));
        assert_eq!(workout.pace(), None);
    }

    #[test]
    fn test_description_uses_month_and_day() {
        assert_eq!(sample_running().description(), "Running on April 5");
        assert_eq!(sample_cycling().description(), "Cycling on July 19");
    }

    #[test]
    fn test_click_counter() {
        let mut workout = sample_running();
        assert_eq!(workout.clicks, 0);
        workout.click();
        workout.click();
        assert_eq!(workout.clicks, 2);
    }

    #[test]
    fn test_new_workout_gets_short_id() {
        let workout = Workout::new(
            Coords { lat: 0.0, lng: 0.0 },
            1.0,
            1.0,
            Activity::Running { cadence: 180.0 },
        );
        assert_eq!(workout.id.len(), 10);
        assert!(workout.id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ids_are_unique_within_a_session() {
        let coords = Coords { lat: 0.0, lng: 0.0 };
        let a = Workout::new(coords, 1.0, 1.0, Activity::Running { cadence: 180.0 });
        let b = Workout::new(coords, 1.0, 1.0, Activity::Running { cadence: 180.0 });
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_running_json_shape() {
        let workout = sample_running();
        let value = serde_json::to_value(&workout).unwrap();

        assert_eq!(value["type"], "running");
        assert_eq!(value["cadence"], 178.0);
        assert_eq!(value["distance"], 5.2);
        assert_eq!(value["coords"][0], 51.5);
        assert_eq!(value["coords"][1], -0.09);
        // Derived values never land in the persisted shape
        assert!(value.get("pace").is_none());
        assert!(value.get("speed").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_cycling_json_shape() {
        let workout = sample_cycling();
        let value = serde_json::to_value(&workout).unwrap();

        assert_eq!(value["type"], "cycling");
        assert_eq!(value["elevationGain"], 523.0);
        assert!(value.get("cadence").is_none());
    }

    #[test]
    fn test_workout_round_trip_keeps_identity() {
        let mut workout = sample_running();
        workout.click();

        let json = serde_json::to_string(&workout).unwrap();
        let restored: Workout = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, workout);
        assert_eq!(restored.id, "1234567890");
        assert_eq!(restored.clicks, 1);
    }

    #[test]
    fn test_log_add_find_remove() {
        let mut log = WorkoutLog::default();
        log.add(sample_running());
        log.add(sample_cycling());

        assert_eq!(log.len(), 2);
        assert_eq!(log.position("0987654321"), Some(1));
        assert!(log.find("1234567890").is_some());

        let removed = log.remove("1234567890").unwrap();
        assert_eq!(removed.id, "1234567890");
        assert_eq!(log.len(), 1);
        assert!(log.find("1234567890").is_none());
    }

    #[test]
    fn test_log_clear() {
        let mut log = WorkoutLog::default();
        log.add(sample_running());
        log.clear();
        assert!(log.is_empty());
    }
}
