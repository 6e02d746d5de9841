use crate::error::{Result, SchoolError};

pub const PERIODS: usize = 4;
pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 10.0;
pub const PASSING_AVERAGE: f64 = 5.0;

pub const ELEMENTARY_SUBJECTS: [&str; 8] = [
    "Portugues",
    "Matematica",
    "Historia",
    "Geografia",
    "Ciencias",
    "Ingles",
    "Artes",
    "Educacao Fisica",
];

pub const HIGH_SCHOOL_SUBJECTS: [&str; 10] = [
    "Portugues",
    "Matematica",
    "Historia",
    "Geografia",
    "Fisica",
    "Quimica",
    "Biologia",
    "Ingles",
    "Filosofia",
    "Sociologia",
];

/// First grade level taught with the high-school curriculum.
pub const HIGH_SCHOOL_LEVEL: u8 = 10;

pub fn curriculum_for(grade_level: u8) -> &'static [&'static str] {
    if grade_level >= HIGH_SCHOOL_LEVEL {
        &HIGH_SCHOOL_SUBJECTS
    } else {
        &ELEMENTARY_SUBJECTS
    }
}

pub fn class_code_for(grade_level: u8) -> String {
    match grade_level {
        10 => "1EM-A".to_string(),
        11 => "2EM-A".to_string(),
        12 => "3EM-A".to_string(),
        level => format!("{level}ANO-A"),
    }
}

/// Lowercased name with its words joined by dots, for e-mail local parts.
pub fn name_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub department: String,
    pub email: String,
}

impl Teacher {
    pub fn new(id: &str, name: &str, department: &str, staff_domain: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            email: format!("{}.{}@{}", name_slug(name), id.to_lowercase(), staff_domain),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn from_number(slot: i64) -> Result<Self> {
        match slot {
            1 => Ok(Slot::First),
            2 => Ok(Slot::Second),
            other => Err(SchoolError::InvalidSlot(other)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Slot::First => 1,
            Slot::Second => 2,
        }
    }
}

/// Converts a 1-based grading period into an index into `Subject::periods`.
pub fn period_index(period: i64) -> Result<usize> {
    if (1..=PERIODS as i64).contains(&period) {
        Ok((period - 1) as usize)
    } else {
        Err(SchoolError::InvalidPeriod(period))
    }
}

pub fn validate_grade(grade: f64) -> Result<f64> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(grade)
    } else {
        Err(SchoolError::InvalidGrade(grade))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradingPeriod {
    pub first: f64,
    pub second: f64,
    pub average: f64,
}

impl GradingPeriod {
    pub fn score(&self, slot: Slot) -> f64 {
        match slot {
            Slot::First => self.first,
            Slot::Second => self.second,
        }
    }

    /// Writes one assessment score and refreshes the period average.
    pub fn set_score(&mut self, slot: Slot, score: f64) {
        match slot {
            Slot::First => self.first = score,
            Slot::Second => self.second = score,
        }
        self.average = (self.first + self.second) / 2.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub name: String,
    /// Id of the assigned teacher; resolved against the roster on display.
    pub teacher_id: Option<String>,
    pub periods: [GradingPeriod; PERIODS],
    pub final_average: f64,
}

impl Subject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            teacher_id: None,
            periods: [GradingPeriod::default(); PERIODS],
            final_average: 0.0,
        }
    }

    pub fn recompute_final_average(&mut self) -> f64 {
        let total: f64 = self.periods.iter().map(|period| period.average).sum();
        self.final_average = total / PERIODS as f64;
        self.final_average
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub grade_level: u8,
    pub subjects: Vec<Subject>,
}

impl Student {
    /// Creates a student with the curriculum of its grade level. Subjects are
    /// head-inserted, so they list in reverse curriculum order.
    pub fn new(id: &str, name: &str, grade_level: u8, email_domain: &str) -> Self {
        let mut subjects = Vec::new();
        for subject in curriculum_for(grade_level) {
            subjects.insert(0, Subject::new(subject));
        }

        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}.{}@{}", id.to_lowercase(), name_slug(name), email_domain),
            grade_level,
            subjects,
        }
    }

    pub fn subject_mut(&mut self, name: &str) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|subject| subject.name == name)
    }

    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects.iter().map(|subject| subject.name.as_str()).collect()
    }

    /// Mean of all subject final averages, refreshing each final average.
    pub fn overall_average(&mut self) -> f64 {
        if self.subjects.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .subjects
            .iter_mut()
            .map(Subject::recompute_final_average)
            .sum();
        total / self.subjects.len() as f64
    }

    /// Clears every subject reference to `teacher_id`, returning how many were cleared.
    pub fn unlink_teacher(&mut self, teacher_id: &str) -> usize {
        let mut cleared = 0;
        for subject in &mut self.subjects {
            if subject.teacher_id.as_deref() == Some(teacher_id) {
                subject.teacher_id = None;
                cleared += 1;
            }
        }
        cleared
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub code: String,
    pub grade_level: u8,
    pub capacity: usize,
    /// Enrolled students, most recently admitted first.
    pub students: Vec<Student>,
    pub head_teacher_id: Option<String>,
}

impl Class {
    pub fn new(code: &str, grade_level: u8, capacity: usize) -> Self {
        Self {
            code: code.to_string(),
            grade_level,
            capacity,
            students: Vec::new(),
            head_teacher_id: None,
        }
    }

    pub fn enrolled(&self) -> usize {
        self.students.len()
    }

    pub fn has_seat(&self) -> bool {
        self.enrolled() < self.capacity
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    pub fn student_mut(&mut self, id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|student| student.id == id)
    }
}
