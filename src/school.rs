use tracing::info;

use crate::config::SchoolConfig;
use crate::error::{Result, SchoolError};
use crate::history::{UndoHistory, UndoRecord};
use crate::models::{GradingPeriod, Teacher};
use crate::roster::Roster;
use crate::waitlist::Waitlist;

/// Session state owned by the control loop and handed to every operation.
#[derive(Debug, Default)]
pub struct School {
    pub config: SchoolConfig,
    pub roster: Roster,
    pub waitlist: Waitlist,
    pub history: UndoHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherRemoval {
    pub teacher: Teacher,
    pub cleared_references: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoOutcome {
    pub student_name: String,
    pub subject: String,
    /// One-based period number.
    pub period: usize,
    pub restored: GradingPeriod,
}

impl School {
    pub fn new(config: SchoolConfig) -> Self {
        Self {
            config,
            roster: Roster::new(),
            waitlist: Waitlist::new(),
            history: UndoHistory::new(),
        }
    }

    pub fn create_teacher(&mut self, id: &str, name: &str, department: &str) -> Result<&Teacher> {
        let teacher = Teacher::new(id, name, department, &self.config.staff_email_domain());
        let teacher = self.roster.add_teacher(teacher)?;
        info!("registered teacher {} ({})", teacher.name, teacher.id);
        Ok(teacher)
    }

    /// Removes a teacher after clearing every reference to it, including those
    /// held by waitlisted students.
    pub fn remove_teacher(&mut self, id: &str) -> Result<TeacherRemoval> {
        if self.roster.teacher(id).is_none() {
            return Err(SchoolError::TeacherNotFound(id.to_string()));
        }

        let cleared_references = self.roster.unlink_teacher(id) + self.waitlist.unlink_teacher(id);
        let teacher = self.roster.take_teacher(id)?;
        info!(
            "removed teacher {} ({}), cleared {} references",
            teacher.name, teacher.id, cleared_references
        );

        Ok(TeacherRemoval {
            teacher,
            cleared_references,
        })
    }

    pub fn teachers(&self) -> &[Teacher] {
        self.roster.teachers()
    }

    /// Reverts the most recent grade change. The record is popped only once
    /// the change has been reverted; every failure leaves the history as it was.
    pub fn undo_last(&mut self) -> Result<UndoOutcome> {
        let snapshot = match self.history.peek() {
            None => return Err(SchoolError::NothingToUndo),
            Some(UndoRecord::Grade(snapshot)) => snapshot.clone(),
            Some(other) => return Err(SchoolError::WrongKind(other.label())),
        };

        let student = self
            .roster
            .find_student_mut(&snapshot.student_id)
            .ok_or_else(|| SchoolError::StudentNotFound(snapshot.student_id.clone()))?;
        let student_name = student.name.clone();
        let subject = student
            .subject_mut(&snapshot.subject)
            .ok_or_else(|| SchoolError::SubjectNotFound {
                student_id: snapshot.student_id.clone(),
                subject: snapshot.subject.clone(),
            })?;
        subject.periods[snapshot.period] = snapshot.previous;
        self.history.pop();

        info!(
            "undo: restored {} / {} period {} to {:.2} {:.2} avg {:.2}",
            student_name,
            snapshot.subject,
            snapshot.period + 1,
            snapshot.previous.first,
            snapshot.previous.second,
            snapshot.previous.average
        );

        Ok(UndoOutcome {
            student_name,
            subject: snapshot.subject,
            period: snapshot.period + 1,
            restored: snapshot.previous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn school() -> School {
        School::new(SchoolConfig::default())
    }

    #[test]
    fn removing_teacher_clears_all_subject_references() {
        let mut school = school();
        school.create_teacher("T1", "Carla Dias", "Exatas").unwrap();
        for (id, level) in [("S1", 6), ("S2", 6), ("S3", 10)] {
            school.enroll(id, "Student", level).unwrap();
        }
        let mut linked = 0;
        for id in ["S1", "S2", "S3"] {
            for subject in ["Matematica", "Historia"] {
                if school.assign_teacher(id, subject, "T1") {
                    linked += 1;
                }
            }
        }
        assert_eq!(linked, 6);

        let removal = school.remove_teacher("T1").unwrap();
        assert_eq!(removal.cleared_references, 6);
        assert!(school.roster.teacher("T1").is_none());
        assert!(school
            .roster
            .students()
            .flat_map(|s| s.subjects.iter())
            .all(|subject| subject.teacher_id.is_none()));
    }

    #[test]
    fn removing_teacher_sweeps_waitlisted_students() {
        let mut school = School::new(SchoolConfig::default().with_overrides(Some(0), None));
        school.create_teacher("T1", "Carla Dias", "Exatas").unwrap();
        school.enroll("S1", "Ana", 6).unwrap();
        assert_eq!(school.waitlist.len(), 1);
        // Waitlisted students are only reachable through the queue.
        assert!(!school.assign_teacher("S1", "Matematica", "T1"));

        let mut waiting = school.waitlist.dequeue().unwrap();
        waiting.subject_mut("Matematica").unwrap().teacher_id = Some("T1".to_string());
        school.waitlist.enqueue(waiting);
        let removal = school.remove_teacher("T1").unwrap();
        assert_eq!(removal.cleared_references, 1);
    }

    #[test]
    fn removing_unknown_teacher_is_not_found() {
        let mut school = school();
        let err = school.remove_teacher("ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn undo_on_empty_history_changes_nothing() {
        let mut school = school();
        school.enroll("S1", "Ana", 6).unwrap();
        let before = school.query_grades("S1").unwrap();
        assert_eq!(school.undo_last(), Err(SchoolError::NothingToUndo));
        assert_eq!(school.query_grades("S1").unwrap(), before);
    }

    #[test]
    fn undo_refuses_reserved_records_without_popping() {
        let mut school = school();
        let teacher = Teacher::new("T1", "A", "X", "docente.kolping.edu.br");
        school.history.push(UndoRecord::TeacherRemoved(teacher));
        assert_eq!(
            school.undo_last(),
            Err(SchoolError::WrongKind("teacher-removed"))
        );
        assert_eq!(school.history.len(), 1);
    }

    #[test]
    fn failed_undo_keeps_the_record() {
        let mut school = school();
        school.enroll("S1", "Ana", 6).unwrap();
        school.enter_grade("S1", "Matematica", 1, 1, 7.0).unwrap();
        // Move the graded student out of the roster without going through
        // withdrawal, which would also drop the record.
        let class = school.roster.class_mut("6ANO-A").unwrap();
        let student = class.students.remove(0);

        assert_eq!(
            school.undo_last(),
            Err(SchoolError::StudentNotFound("S1".to_string()))
        );
        assert_eq!(school.history.len(), 1);

        school.roster.class_mut("6ANO-A").unwrap().students.insert(0, student);
        let outcome = school.undo_last().unwrap();
        assert_eq!(outcome.restored, GradingPeriod::default());
        assert!(school.history.is_empty());
    }
}
