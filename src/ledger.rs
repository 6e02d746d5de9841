use tracing::{info, warn};

use crate::error::{Result, SchoolError};
use crate::history::{GradeSnapshot, UndoRecord};
use crate::models::{period_index, validate_grade, GradingPeriod, Slot, PERIODS};
use crate::school::School;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeAction {
    Enter,
    Edit,
    Clear,
}

impl GradeAction {
    pub fn verb(self) -> &'static str {
        match self {
            GradeAction::Enter => "entered",
            GradeAction::Edit => "edited",
            GradeAction::Clear => "cleared",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeChange {
    pub action: GradeAction,
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    pub period: usize,
    pub slot: Slot,
    pub previous: f64,
    pub current: f64,
    pub period_average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGrades {
    pub name: String,
    pub periods: [GradingPeriod; PERIODS],
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeSheet {
    pub student_id: String,
    pub student_name: String,
    pub class_code: String,
    pub subjects: Vec<SubjectGrades>,
}

fn validate_change(
    action: GradeAction,
    period: i64,
    slot: i64,
    score: f64,
) -> Result<(f64, usize, Slot)> {
    let score = match action {
        GradeAction::Clear => 0.0,
        GradeAction::Enter | GradeAction::Edit => validate_grade(score)?,
    };
    Ok((score, period_index(period)?, Slot::from_number(slot)?))
}

impl School {
    pub fn enter_grade(
        &mut self,
        student_id: &str,
        subject: &str,
        period: i64,
        slot: i64,
        score: f64,
    ) -> Result<GradeChange> {
        self.apply_grade(GradeAction::Enter, student_id, subject, period, slot, score)
    }

    pub fn edit_grade(
        &mut self,
        student_id: &str,
        subject: &str,
        period: i64,
        slot: i64,
        score: f64,
    ) -> Result<GradeChange> {
        self.apply_grade(GradeAction::Edit, student_id, subject, period, slot, score)
    }

    /// Resets one assessment score to zero.
    pub fn clear_grade(
        &mut self,
        student_id: &str,
        subject: &str,
        period: i64,
        slot: i64,
    ) -> Result<GradeChange> {
        self.apply_grade(GradeAction::Clear, student_id, subject, period, slot, 0.0)
    }

    // All validation and lookups happen before the snapshot is pushed, and the
    // snapshot is pushed before the period is touched.
    fn apply_grade(
        &mut self,
        action: GradeAction,
        student_id: &str,
        subject_name: &str,
        period: i64,
        slot: i64,
        score: f64,
    ) -> Result<GradeChange> {
        let (score, index, slot) = validate_change(action, period, slot, score)
            .inspect_err(|err| warn!("rejected grade change for {}: {}", student_id, err))?;

        let student = self
            .roster
            .find_student_mut(student_id)
            .ok_or_else(|| SchoolError::StudentNotFound(student_id.to_string()))?;
        let student_name = student.name.clone();
        let subject = student
            .subject_mut(subject_name)
            .ok_or_else(|| SchoolError::SubjectNotFound {
                student_id: student_id.to_string(),
                subject: subject_name.to_string(),
            })?;
        let grading_period = &mut subject.periods[index];

        self.history.push(UndoRecord::Grade(GradeSnapshot {
            student_id: student_id.to_string(),
            subject: subject_name.to_string(),
            period: index,
            previous: *grading_period,
        }));

        let previous = grading_period.score(slot);
        grading_period.set_score(slot, score);

        info!(
            "grade {}: {} / {} period {} slot {}: {:.2} -> {:.2} (avg {:.2})",
            action.verb(),
            student_name,
            subject_name,
            index + 1,
            slot.number(),
            previous,
            score,
            grading_period.average
        );

        Ok(GradeChange {
            action,
            student_id: student_id.to_string(),
            student_name,
            subject: subject_name.to_string(),
            period: index + 1,
            slot,
            previous,
            current: score,
            period_average: grading_period.average,
        })
    }

    pub fn query_grades(&self, student_id: &str) -> Result<GradeSheet> {
        let (class, student) = self
            .roster
            .find_student(student_id)
            .ok_or_else(|| SchoolError::StudentNotFound(student_id.to_string()))?;

        Ok(GradeSheet {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            class_code: class.code.clone(),
            subjects: student
                .subjects
                .iter()
                .map(|subject| SubjectGrades {
                    name: subject.name.clone(),
                    periods: subject.periods,
                })
                .collect(),
        })
    }

    pub fn subject_names(&self, student_id: &str) -> Result<Vec<String>> {
        let (_, student) = self
            .roster
            .find_student(student_id)
            .ok_or_else(|| SchoolError::StudentNotFound(student_id.to_string()))?;
        Ok(student.subject_names().into_iter().map(String::from).collect())
    }

    /// Links a teacher to one subject of an enrolled student. Does nothing when
    /// the student, the subject or the teacher is unknown.
    pub fn assign_teacher(&mut self, student_id: &str, subject: &str, teacher_id: &str) -> bool {
        if self.roster.teacher(teacher_id).is_none() {
            return false;
        }
        let Some(subject) = self
            .roster
            .find_student_mut(student_id)
            .and_then(|student| student.subject_mut(subject))
        else {
            return false;
        };
        subject.teacher_id = Some(teacher_id.to_string());
        true
    }

    /// Links a teacher to a subject for every student enrolled in a class,
    /// returning how many subjects were linked.
    pub fn assign_teacher_to_class(
        &mut self,
        class_code: &str,
        subject: &str,
        teacher_id: &str,
    ) -> Result<usize> {
        if self.roster.teacher(teacher_id).is_none() {
            return Err(SchoolError::TeacherNotFound(teacher_id.to_string()));
        }
        let class = self.roster.class_mut(class_code)?;

        let mut linked = 0;
        for student in &mut class.students {
            if let Some(entry) = student.subject_mut(subject) {
                entry.teacher_id = Some(teacher_id.to_string());
                linked += 1;
            }
        }
        info!(
            "linked teacher {} to '{}' for {} student(s) of {}",
            teacher_id, subject, linked, class_code
        );
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchoolConfig;
    use crate::error::ErrorKind;

    fn school_with_student() -> School {
        let mut school = School::new(SchoolConfig::default());
        school.enroll("S1", "Ana Souza", 6).unwrap();
        school
    }

    fn period(school: &School, subject: &str, period: usize) -> GradingPeriod {
        school
            .roster
            .find_student("S1")
            .unwrap()
            .1
            .subjects
            .iter()
            .find(|s| s.name == subject)
            .unwrap()
            .periods[period]
    }

    #[test]
    fn first_score_averages_against_empty_slot() {
        let mut school = school_with_student();
        let change = school.enter_grade("S1", "Matematica", 1, 1, 7.0).unwrap();
        assert_eq!(change.previous, 0.0);
        assert_eq!(change.current, 7.0);
        assert_eq!(change.period_average, 3.5);

        let outcome = school.undo_last().unwrap();
        assert_eq!(outcome.period, 1);
        assert_eq!(period(&school, "Matematica", 0), GradingPeriod::default());
    }

    #[test]
    fn edit_then_undo_restores_prior_period() {
        let mut school = school_with_student();
        school.enter_grade("S1", "Historia", 2, 1, 6.0).unwrap();
        school.enter_grade("S1", "Historia", 2, 2, 8.0).unwrap();
        let before = school.query_grades("S1").unwrap();

        let change = school.edit_grade("S1", "Historia", 2, 2, 4.0).unwrap();
        assert_eq!(change.previous, 8.0);
        assert_eq!(change.period_average, 5.0);

        school.undo_last().unwrap();
        assert_eq!(school.query_grades("S1").unwrap(), before);
        assert_eq!(
            period(&school, "Historia", 1),
            GradingPeriod {
                first: 6.0,
                second: 8.0,
                average: 7.0
            }
        );
    }

    #[test]
    fn out_of_range_grades_push_nothing() {
        let mut school = school_with_student();
        for score in [-1.0, 11.0] {
            let err = school.enter_grade("S1", "Matematica", 1, 1, score).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert!(school.history.is_empty());
        assert_eq!(period(&school, "Matematica", 0), GradingPeriod::default());
    }

    #[test]
    fn bad_period_or_slot_is_invalid_input() {
        let mut school = school_with_student();
        assert_eq!(
            school.edit_grade("S1", "Matematica", 5, 1, 5.0),
            Err(SchoolError::InvalidPeriod(5))
        );
        assert_eq!(
            school.clear_grade("S1", "Matematica", 1, 3),
            Err(SchoolError::InvalidSlot(3))
        );
        assert!(school.history.is_empty());
    }

    #[test]
    fn unknown_student_or_subject_is_not_found() {
        let mut school = school_with_student();
        assert_eq!(
            school.enter_grade("ghost", "Matematica", 1, 1, 5.0),
            Err(SchoolError::StudentNotFound("ghost".to_string()))
        );
        let err = school.enter_grade("S1", "Filosofia", 1, 1, 5.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(school.history.is_empty());
    }

    #[test]
    fn clear_resets_slot_and_is_undoable() {
        let mut school = school_with_student();
        school.enter_grade("S1", "Artes", 4, 2, 9.0).unwrap();
        let change = school.clear_grade("S1", "Artes", 4, 2).unwrap();
        assert_eq!(change.previous, 9.0);
        assert_eq!(change.period_average, 0.0);

        school.undo_last().unwrap();
        assert_eq!(period(&school, "Artes", 3).second, 9.0);
        school.undo_last().unwrap();
        assert_eq!(period(&school, "Artes", 3), GradingPeriod::default());
        assert_eq!(school.undo_last(), Err(SchoolError::NothingToUndo));
    }

    #[test]
    fn assignment_is_silent_for_missing_references() {
        let mut school = school_with_student();
        school.create_teacher("T1", "Carla Dias", "Exatas").unwrap();
        assert!(!school.assign_teacher("ghost", "Matematica", "T1"));
        assert!(!school.assign_teacher("S1", "Matematica", "ghost"));
        assert!(!school.assign_teacher("S1", "Astronomia", "T1"));
        assert!(school.assign_teacher("S1", "Matematica", "T1"));
        assert_eq!(
            school
                .roster
                .find_student("S1")
                .unwrap()
                .1
                .subjects
                .iter()
                .find(|s| s.name == "Matematica")
                .unwrap()
                .teacher_id
                .as_deref(),
            Some("T1")
        );
    }

    #[test]
    fn class_assignment_links_every_enrolled_student() {
        let mut school = school_with_student();
        school.enroll("S2", "Bia", 6).unwrap();
        school.create_teacher("T1", "Carla Dias", "Exatas").unwrap();
        assert_eq!(
            school.assign_teacher_to_class("6ANO-A", "Ciencias", "T1"),
            Ok(2)
        );
        assert_eq!(
            school.assign_teacher_to_class("6ANO-A", "Ciencias", "ghost"),
            Err(SchoolError::TeacherNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn query_lists_every_subject_and_period() {
        let school = school_with_student();
        let sheet = school.query_grades("S1").unwrap();
        assert_eq!(sheet.class_code, "6ANO-A");
        assert_eq!(sheet.subjects.len(), 8);
        assert!(sheet.subjects.iter().all(|s| s.periods.len() == PERIODS));
        assert_eq!(school.subject_names("S1").unwrap().len(), 8);
    }
}
