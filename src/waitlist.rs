use std::collections::VecDeque;

use crate::models::Student;

/// FIFO queue of students waiting for a seat. The queue owns the students it
/// holds; callers keep at most one membership per student.
#[derive(Debug, Default)]
pub struct Waitlist {
    entries: VecDeque<Student>,
}

impl Waitlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail and returns the 1-based position.
    pub fn enqueue(&mut self, student: Student) -> usize {
        self.entries.push_back(student);
        self.entries.len()
    }

    pub fn dequeue(&mut self) -> Option<Student> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<&Student> {
        self.entries.front()
    }

    /// Waiting students, front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.entries.iter().any(|student| student.id == student_id)
    }

    pub fn unlink_teacher(&mut self, teacher_id: &str) -> usize {
        self.entries
            .iter_mut()
            .map(|student| student.unlink_teacher(teacher_id))
            .sum()
    }
}
