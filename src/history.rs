use crate::models::{GradingPeriod, Student, Teacher};

/// State of one grading period captured before a grade change.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeSnapshot {
    pub student_id: String,
    pub subject: String,
    /// Zero-based period index.
    pub period: usize,
    pub previous: GradingPeriod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    Grade(GradeSnapshot),
    // Reserved: nothing pushes or restores these yet.
    #[allow(dead_code)]
    TeacherRemoved(Teacher),
    #[allow(dead_code)]
    StudentRemoved(Student),
}

impl UndoRecord {
    pub fn label(&self) -> &'static str {
        match self {
            UndoRecord::Grade(_) => "grade",
            UndoRecord::TeacherRemoved(_) => "teacher-removed",
            UndoRecord::StudentRemoved(_) => "student-removed",
        }
    }
}

/// LIFO stack of reversible changes.
#[derive(Debug, Default)]
pub struct UndoHistory {
    records: Vec<UndoRecord>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    pub fn peek(&self) -> Option<&UndoRecord> {
        self.records.last()
    }

    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.records.pop()
    }

    /// Drops every grade snapshot taken for `student_id`, returning how many
    /// were dropped.
    pub fn discard_student(&mut self, student_id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|record| match record {
            UndoRecord::Grade(snapshot) => snapshot.student_id != student_id,
            _ => true,
        });
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
