#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    NotANumber { field: &'static str, value: String },
    NotPositive { field: &'static str },
    WorkoutNotFound(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotANumber { field, value } => {
                write!(f, "{} is not a number: '{}'", field, value)
            }
            DomainError::NotPositive { field } => {
                write!(f, "{} has to be a positive number", field)
            }
            DomainError::WorkoutNotFound(id) => {
                write!(f, "No workout with id {}", id)
            }
        }
    }
}

impl std::error::Error for DomainError {}

pub type DomainResult<T> = Result<T, DomainError>;
