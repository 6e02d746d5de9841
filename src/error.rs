use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchoolError>;

/// Coarse classification used by the shell when rendering failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    NothingToUndo,
    WrongKind,
    DuplicateId,
}

#[derive(Debug, Error, PartialEq)]
pub enum SchoolError {
    #[error("teacher {0} not found")]
    TeacherNotFound(String),
    #[error("student {0} not found")]
    StudentNotFound(String),
    #[error("subject '{subject}' not found for student {student_id}")]
    SubjectNotFound { student_id: String, subject: String },
    #[error("class {0} not found")]
    ClassNotFound(String),
    #[error("grade {0:.2} is outside 0.0..=10.0")]
    InvalidGrade(f64),
    #[error("grading period {0} is outside 1..=4")]
    InvalidPeriod(i64),
    #[error("assessment slot {0} must be 1 or 2")]
    InvalidSlot(i64),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("last history entry is a {0} record, not a grade change")]
    WrongKind(&'static str),
    #[error("teacher id {0} already registered")]
    DuplicateTeacher(String),
    #[error("enrollment id {0} already in use")]
    DuplicateStudent(String),
}

impl SchoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchoolError::TeacherNotFound(_)
            | SchoolError::StudentNotFound(_)
            | SchoolError::SubjectNotFound { .. }
            | SchoolError::ClassNotFound(_) => ErrorKind::NotFound,
            SchoolError::InvalidGrade(_)
            | SchoolError::InvalidPeriod(_)
            | SchoolError::InvalidSlot(_) => ErrorKind::InvalidInput,
            SchoolError::NothingToUndo => ErrorKind::NothingToUndo,
            SchoolError::WrongKind(_) => ErrorKind::WrongKind,
            SchoolError::DuplicateTeacher(_) | SchoolError::DuplicateStudent(_) => {
                ErrorKind::DuplicateId
            }
        }
    }
}
