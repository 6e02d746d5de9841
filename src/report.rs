use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, SchoolError};
use crate::models::{PASSING_AVERAGE, PERIODS};
use crate::school::School;

pub const NO_TEACHER: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectLine {
    pub name: String,
    pub final_average: f64,
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub student_id: String,
    pub student_name: String,
    pub email: String,
    pub class_code: String,
    pub subjects: Vec<SubjectLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectClosing {
    pub name: String,
    pub period_averages: [f64; PERIODS],
    pub final_average: f64,
    pub below_passing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentClosing {
    pub student_id: String,
    pub student_name: String,
    pub overall_average: f64,
    pub passed: bool,
    pub subjects: Vec<SubjectClosing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassClosingReport {
    pub class_code: String,
    pub grade_level: u8,
    pub enrolled: usize,
    pub capacity: usize,
    pub students: Vec<StudentClosing>,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * passed as f64 / total as f64
    }
}

impl School {
    /// Builds a student's report card. Every call recomputes and stores each
    /// subject's final average.
    pub fn student_report(&mut self, student_id: &str) -> Result<StudentReport> {
        let not_found = || SchoolError::StudentNotFound(student_id.to_string());

        let student = self.roster.find_student_mut(student_id).ok_or_else(not_found)?;
        for subject in &mut student.subjects {
            subject.recompute_final_average();
        }

        let (class, student) = self.roster.find_student(student_id).ok_or_else(not_found)?;
        let subjects = student
            .subjects
            .iter()
            .map(|subject| SubjectLine {
                name: subject.name.clone(),
                final_average: subject.final_average,
                teacher: subject
                    .teacher_id
                    .as_deref()
                    .and_then(|id| self.roster.teacher(id))
                    .map(|teacher| teacher.name.clone()),
            })
            .collect();

        Ok(StudentReport {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            email: student.email.clone(),
            class_code: class.code.clone(),
            subjects,
        })
    }

    /// Closes a class: overall averages per student, pass/fail split and pass
    /// rate. An empty class yields a zero pass rate.
    pub fn class_closing_report(&mut self, class_code: &str) -> Result<ClassClosingReport> {
        let class = self.roster.class_mut(class_code)?;

        let mut students = Vec::with_capacity(class.students.len());
        for student in &mut class.students {
            let overall_average = student.overall_average();
            students.push(StudentClosing {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                overall_average,
                passed: overall_average >= PASSING_AVERAGE,
                subjects: student
                    .subjects
                    .iter()
                    .map(|subject| SubjectClosing {
                        name: subject.name.clone(),
                        period_averages: subject.periods.map(|period| period.average),
                        final_average: subject.final_average,
                        below_passing: subject.final_average < PASSING_AVERAGE,
                    })
                    .collect(),
            });
        }

        let passed = students.iter().filter(|student| student.passed).count();
        let failed = students.len() - passed;

        Ok(ClassClosingReport {
            class_code: class.code.clone(),
            grade_level: class.grade_level,
            enrolled: class.enrolled(),
            capacity: class.capacity,
            pass_rate: pass_rate(passed, students.len()),
            students,
            passed,
            failed,
        })
    }
}

pub fn build_student_report(report: &StudentReport, generated: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Report Card: {} ({})", report.student_name, report.student_id);
    let _ = writeln!(
        output,
        "Class {} | {} | generated {}",
        report.class_code, report.email, generated
    );
    let _ = writeln!(output);

    if report.subjects.is_empty() {
        let _ = writeln!(output, "No subjects on record.");
    }
    for subject in &report.subjects {
        let _ = writeln!(
            output,
            "- {:<15} | final average {:>5.2} | teacher: {}",
            subject.name,
            subject.final_average,
            subject.teacher.as_deref().unwrap_or(NO_TEACHER)
        );
    }

    output
}

pub fn build_closing_report(report: &ClassClosingReport, generated: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Closing Report: {}", report.class_code);
    let _ = writeln!(
        output,
        "Grade level {} | {} / {} seats | generated {}",
        report.grade_level, report.enrolled, report.capacity, generated
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if report.students.is_empty() {
        let _ = writeln!(output, "No students enrolled in this class.");
    }
    for student in &report.students {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "### {} ({}) average {:.2} [{}]",
            student.student_name,
            student.student_id,
            student.overall_average,
            if student.passed { "PASSED" } else { "FAILED" }
        );
        for subject in &student.subjects {
            let periods = subject
                .period_averages
                .iter()
                .enumerate()
                .map(|(index, average)| format!("P{}:{:.1}", index + 1, average))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(
                output,
                "- {:<15} | {} | final {:.2}{}",
                subject.name,
                periods,
                subject.final_average,
                if subject.below_passing { " [!]" } else { "" }
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(
        output,
        "Passed: {} | Failed: {} | Total: {}",
        report.passed,
        report.failed,
        report.passed + report.failed
    );
    let _ = writeln!(output, "Pass rate: {:.1}%", report.pass_rate);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchoolConfig;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    fn fill_subject(school: &mut School, student: &str, subject: &str, score: f64) {
        for period in 1..=4 {
            for slot in 1..=2 {
                school.enter_grade(student, subject, period, slot, score).unwrap();
            }
        }
    }

    #[test]
    fn student_report_recomputes_final_averages() {
        let mut school = School::new(SchoolConfig::default());
        school.enroll("S1", "Ana Souza", 6).unwrap();
        fill_subject(&mut school, "S1", "Matematica", 8.0);

        let report = school.student_report("S1").unwrap();
        let math = report
            .subjects
            .iter()
            .find(|line| line.name == "Matematica")
            .unwrap();
        assert_eq!(math.final_average, 8.0);
        assert_eq!(math.teacher, None);

        school.edit_grade("S1", "Matematica", 1, 1, 0.0).unwrap();
        let report = school.student_report("S1").unwrap();
        let math = report
            .subjects
            .iter()
            .find(|line| line.name == "Matematica")
            .unwrap();
        assert_eq!(math.final_average, 7.0);
    }

    #[test]
    fn student_report_names_assigned_teacher() {
        let mut school = School::new(SchoolConfig::default());
        school.enroll("S1", "Ana Souza", 6).unwrap();
        school.create_teacher("T1", "Carla Dias", "Exatas").unwrap();
        school.assign_teacher("S1", "Ciencias", "T1");

        let report = school.student_report("S1").unwrap();
        let rendered = build_student_report(&report, date());
        assert!(rendered.contains("Ciencias"));
        assert!(rendered.contains("teacher: Carla Dias"));
        assert!(rendered.contains("teacher: N/A"));
    }

    #[test]
    fn student_report_for_unknown_student_is_not_found() {
        let mut school = School::new(SchoolConfig::default());
        assert_eq!(
            school.student_report("ghost"),
            Err(SchoolError::StudentNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn closing_report_splits_pass_and_fail() {
        let mut school = School::new(SchoolConfig::default());
        school.enroll("S1", "Ana", 6).unwrap();
        school.enroll("S2", "Bia", 6).unwrap();
        for subject in school.subject_names("S1").unwrap() {
            fill_subject(&mut school, "S1", &subject, 6.0);
        }

        let report = school.class_closing_report("6ANO-A").unwrap();
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pass_rate, 50.0);

        let ana = report.students.iter().find(|s| s.student_id == "S1").unwrap();
        assert!(ana.passed);
        assert_eq!(ana.overall_average, 6.0);
        let bia = report.students.iter().find(|s| s.student_id == "S2").unwrap();
        assert!(bia.subjects.iter().all(|subject| subject.below_passing));

        let rendered = build_closing_report(&report, date());
        assert!(rendered.contains("[PASSED]"));
        assert!(rendered.contains("[FAILED]"));
        assert!(rendered.contains("Pass rate: 50.0%"));
    }

    #[test]
    fn closing_report_on_empty_class_has_zero_rate() {
        let mut school = School::new(SchoolConfig::default());
        school.enroll("S1", "Ana", 6).unwrap();
        school.withdraw("6ANO-A", "S1").unwrap();

        let report = school.class_closing_report("6ANO-A").unwrap();
        assert_eq!(report.students.len(), 0);
        assert_eq!(report.pass_rate, 0.0);
        assert!(build_closing_report(&report, date()).contains("Pass rate: 0.0%"));
    }

    #[test]
    fn closing_report_for_unknown_class_is_not_found() {
        let mut school = School::new(SchoolConfig::default());
        assert_eq!(
            school.class_closing_report("9ANO-A").unwrap_err(),
            SchoolError::ClassNotFound("9ANO-A".to_string())
        );
    }

    #[test]
    fn pass_rate_guards_empty_totals() {
        assert_eq!(pass_rate(0, 0), 0.0);
        assert_eq!(pass_rate(3, 4), 75.0);
    }
}
