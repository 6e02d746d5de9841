use tracing::{debug, info, warn};

use crate::error::{Result, SchoolError};
use crate::models::{Class, Student};
use crate::school::School;
use crate::waitlist::Waitlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Enrolled,
    /// Class was full; the student waits at this 1-based queue position.
    Waitlisted { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub student_id: String,
    pub student_name: String,
    pub class_code: String,
    pub placement: Placement,
    pub class_created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    pub removed: Student,
    pub class_code: String,
    pub promoted: Option<Admission>,
}

/// Seats `student` in `class` when a seat is free, otherwise defers it to the
/// waitlist. Every roster insertion goes through here.
pub fn admit(class: &mut Class, student: Student, queue: &mut Waitlist) -> Admission {
    let student_id = student.id.clone();
    let student_name = student.name.clone();

    let placement = if class.has_seat() {
        class.students.insert(0, student);
        info!(
            "enrolled {} ({}) in {} [{}/{}]",
            student_name,
            student_id,
            class.code,
            class.enrolled(),
            class.capacity
        );
        Placement::Enrolled
    } else {
        let position = queue.enqueue(student);
        warn!(
            "class {} is full, {} ({}) waitlisted at position {}",
            class.code, student_name, student_id, position
        );
        Placement::Waitlisted { position }
    };

    Admission {
        student_id,
        student_name,
        class_code: class.code.clone(),
        placement,
        class_created: false,
    }
}

/// Unlinks a student from `class` and promotes the head of the waitlist into
/// the freed seat.
pub fn withdraw(class: &mut Class, student_id: &str, queue: &mut Waitlist) -> Result<Withdrawal> {
    let position = class
        .students
        .iter()
        .position(|student| student.id == student_id)
        .ok_or_else(|| SchoolError::StudentNotFound(student_id.to_string()))?;

    let removed = class.students.remove(position);
    info!(
        "withdrew {} ({}) from {}, a seat opened",
        removed.name, removed.id, class.code
    );

    let promoted = queue.dequeue().map(|next| {
        debug!("promoting {} ({}) from the waitlist", next.name, next.id);
        admit(class, next, queue)
    });

    Ok(Withdrawal {
        removed,
        class_code: class.code.clone(),
        promoted,
    })
}

impl School {
    /// Creates a student with its curriculum and places it in the class for
    /// its grade level, creating that class on first use.
    pub fn enroll(&mut self, id: &str, name: &str, grade_level: u8) -> Result<Admission> {
        if self.roster.find_student(id).is_some() || self.waitlist.contains(id) {
            return Err(SchoolError::DuplicateStudent(id.to_string()));
        }

        let student = Student::new(id, name, grade_level, &self.config.email_domain);
        let (class, class_created) = self
            .roster
            .class_for_level(grade_level, self.config.class_capacity);
        let mut admission = admit(class, student, &mut self.waitlist);
        admission.class_created = class_created;
        Ok(admission)
    }

    /// Withdraws a student from `class_code`. Grade snapshots taken for the
    /// student are dropped with it, so a later enrollment reusing the id
    /// cannot inherit them through undo.
    pub fn withdraw(&mut self, class_code: &str, student_id: &str) -> Result<Withdrawal> {
        let class = self.roster.class_mut(class_code)?;
        let withdrawal = withdraw(class, student_id, &mut self.waitlist)?;

        let discarded = self.history.discard_student(student_id);
        if discarded > 0 {
            debug!("discarded {} undo record(s) for {}", discarded, student_id);
        }
        Ok(withdrawal)
    }

    /// Withdraws a student from whichever class currently holds it.
    pub fn withdraw_student(&mut self, student_id: &str) -> Result<Withdrawal> {
        let class_code = self
            .roster
            .find_student(student_id)
            .map(|(class, _)| class.code.clone())
            .ok_or_else(|| SchoolError::StudentNotFound(student_id.to_string()))?;
        self.withdraw(&class_code, student_id)
    }
}
