use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::enrollment::{Admission, Placement, Withdrawal};
use crate::error::{ErrorKind, SchoolError};
use crate::ledger::{GradeChange, GradeSheet};
use crate::report;
use crate::school::School;

const PROMPT: &str = "school> ";

#[derive(Parser, Debug)]
#[command(name = "school", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Register, remove or list teachers
    Teacher {
        #[command(subcommand)]
        action: TeacherAction,
    },
    /// Enroll a new student into the class for its grade level
    Enroll {
        id: String,
        name: String,
        grade_level: u8,
    },
    /// Withdraw a student and promote the head of the waitlist
    Withdraw {
        id: String,
        #[arg(long)]
        class: Option<String>,
    },
    /// List classes with their occupancy
    Classes,
    /// Class settings
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },
    /// Link a teacher to one subject of a student
    Assign {
        student: String,
        subject: String,
        teacher: String,
    },
    /// Link a teacher to a subject for every student of a class
    AssignClass {
        class: String,
        subject: String,
        teacher: String,
    },
    /// List a student's subjects
    Subjects {
        student: String,
        /// Only look the student up in this class
        #[arg(long)]
        class: Option<String>,
    },
    /// Enter, edit, clear or show grades
    Grade {
        #[command(subcommand)]
        action: GradeAction,
    },
    /// Revert the most recent grade change
    Undo,
    /// Show the waitlist, front first
    Waitlist,
    /// Student report card or class closing report
    Report {
        #[command(subcommand)]
        target: ReportTarget,
    },
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
enum TeacherAction {
    Add {
        id: String,
        name: String,
        department: String,
    },
    Remove {
        id: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum ClassAction {
    /// Set the head teacher of a class
    Head { class: String, teacher: String },
}

#[derive(Subcommand, Debug)]
enum GradeAction {
    Enter {
        student: String,
        subject: String,
        #[arg(allow_negative_numbers = true)]
        period: i64,
        #[arg(allow_negative_numbers = true)]
        slot: i64,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    Edit {
        student: String,
        subject: String,
        #[arg(allow_negative_numbers = true)]
        period: i64,
        #[arg(allow_negative_numbers = true)]
        slot: i64,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    Clear {
        student: String,
        subject: String,
        #[arg(allow_negative_numbers = true)]
        period: i64,
        #[arg(allow_negative_numbers = true)]
        slot: i64,
    },
    Show {
        student: String,
    },
}

#[derive(Subcommand, Debug)]
enum ReportTarget {
    Student {
        id: String,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Class {
        code: String,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Splits a command line into words, honouring single and double quotes.
pub fn split_line(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        anyhow::bail!("unterminated {open} quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not found",
        ErrorKind::InvalidInput => "invalid input",
        ErrorKind::NothingToUndo => "nothing to undo",
        ErrorKind::WrongKind => "wrong kind",
        ErrorKind::DuplicateId => "duplicate id",
    }
}

/// Presentation layer over a `School` session.
pub struct Shell<W: Write> {
    pub school: School,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(school: School, out: W) -> Self {
        Self { school, out }
    }

    pub fn into_parts(self) -> (School, W) {
        (self.school, self.out)
    }

    /// Runs one command line. Failures are printed and the session continues;
    /// only errors writing to the output are returned.
    pub fn execute_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }

        let words = match split_line(line) {
            Ok(words) => words,
            Err(err) => {
                writeln!(self.out, "error: {err}")?;
                return Ok(Flow::Continue);
            }
        };
        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(err) => {
                write!(self.out, "{}", err.render())?;
                return Ok(Flow::Continue);
            }
        };
        debug!("executing {:?}", parsed.command);

        match self.dispatch(parsed.command) {
            Ok(flow) => Ok(flow),
            Err(err) => match err.downcast::<SchoolError>() {
                Ok(school_err) => {
                    writeln!(
                        self.out,
                        "error ({}): {}",
                        kind_label(school_err.kind()),
                        school_err
                    )?;
                    Ok(Flow::Continue)
                }
                Err(other) => {
                    writeln!(self.out, "error: {other:#}")?;
                    Ok(Flow::Continue)
                }
            },
        }
    }

    pub fn run<R: BufRead>(&mut self, input: R, interactive: bool) -> anyhow::Result<()> {
        if interactive {
            self.prompt()?;
        }
        for line in input.lines() {
            let line = line.context("failed to read command")?;
            if !interactive && !line.trim().is_empty() && !line.trim().starts_with('#') {
                writeln!(self.out, "{PROMPT}{}", line.trim())?;
            }
            if self.execute_line(&line)? == Flow::Quit {
                return Ok(());
            }
            if interactive {
                self.prompt()?;
            }
        }
        Ok(())
    }

    pub fn run_script(&mut self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open script {}", path.display()))?;
        self.run(std::io::BufReader::new(file), false)
    }

    fn prompt(&mut self) -> anyhow::Result<()> {
        write!(self.out, "{PROMPT}")?;
        self.out.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        match command {
            ShellCommand::Teacher { action } => self.teacher(action)?,
            ShellCommand::Enroll {
                id,
                name,
                grade_level,
            } => {
                let admission = self.school.enroll(&id, &name, grade_level)?;
                self.print_admission(&admission)?;
            }
            ShellCommand::Withdraw { id, class } => {
                let withdrawal = match class {
                    Some(class) => self.school.withdraw(&class, &id)?,
                    None => self.school.withdraw_student(&id)?,
                };
                self.print_withdrawal(&withdrawal)?;
            }
            ShellCommand::Classes => self.print_classes()?,
            ShellCommand::Class {
                action: ClassAction::Head { class, teacher },
            } => {
                self.school.roster.set_head_teacher(&class, &teacher)?;
                writeln!(self.out, "{teacher} is now head teacher of {class}.")?;
            }
            ShellCommand::Assign {
                student,
                subject,
                teacher,
            } => {
                if self.school.assign_teacher(&student, &subject, &teacher) {
                    writeln!(self.out, "Linked {teacher} to {subject} for {student}.")?;
                } else {
                    writeln!(self.out, "Nothing linked.")?;
                }
            }
            ShellCommand::AssignClass {
                class,
                subject,
                teacher,
            } => {
                let linked = self
                    .school
                    .assign_teacher_to_class(&class, &subject, &teacher)?;
                writeln!(
                    self.out,
                    "Linked {teacher} to '{subject}' for {linked} student(s) of {class}."
                )?;
            }
            ShellCommand::Subjects { student, class } => {
                let names: Vec<String> = match class {
                    Some(class) => self
                        .school
                        .roster
                        .student_in_class(&class, &student)
                        .map(|found| found.subject_names().into_iter().map(String::from).collect())
                        .ok_or_else(|| SchoolError::StudentNotFound(student.clone()))?,
                    None => self.school.subject_names(&student)?,
                };
                writeln!(self.out, "Subjects for {student}:")?;
                for (index, name) in names.iter().enumerate() {
                    writeln!(self.out, "  {}. {}", index + 1, name)?;
                }
            }
            ShellCommand::Grade { action } => self.grade(action)?,
            ShellCommand::Undo => {
                let outcome = self.school.undo_last()?;
                writeln!(
                    self.out,
                    "Restored {} | {} | period {} -> first {:.2} second {:.2} average {:.2}",
                    outcome.student_name,
                    outcome.subject,
                    outcome.period,
                    outcome.restored.first,
                    outcome.restored.second,
                    outcome.restored.average
                )?;
                if !self.school.history.is_empty() {
                    writeln!(self.out, "{} earlier change(s) can still be undone.", self.school.history.len())?;
                }
            }
            ShellCommand::Waitlist => self.print_waitlist()?,
            ShellCommand::Report { target } => self.report(target)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn teacher(&mut self, action: TeacherAction) -> anyhow::Result<()> {
        match action {
            TeacherAction::Add {
                id,
                name,
                department,
            } => {
                let teacher = self.school.create_teacher(&id, &name, &department)?;
                writeln!(
                    self.out,
                    "Registered {} ({}) <{}>.",
                    teacher.name, teacher.id, teacher.email
                )?;
            }
            TeacherAction::Remove { id } => {
                let removal = self.school.remove_teacher(&id)?;
                writeln!(
                    self.out,
                    "Removed {} ({}); {} reference(s) cleared.",
                    removal.teacher.name, removal.teacher.id, removal.cleared_references
                )?;
            }
            TeacherAction::List => {
                let teachers = self.school.teachers();
                if teachers.is_empty() {
                    writeln!(self.out, "No teachers registered.")?;
                }
                for teacher in teachers {
                    writeln!(
                        self.out,
                        "{:<10} | {:<20} | {:<12} | {}",
                        teacher.id, teacher.name, teacher.department, teacher.email
                    )?;
                }
            }
        }
        Ok(())
    }

    fn grade(&mut self, action: GradeAction) -> anyhow::Result<()> {
        let change = match action {
            GradeAction::Enter {
                student,
                subject,
                period,
                slot,
                score,
            } => self
                .school
                .enter_grade(&student, &subject, period, slot, score)?,
            GradeAction::Edit {
                student,
                subject,
                period,
                slot,
                score,
            } => self
                .school
                .edit_grade(&student, &subject, period, slot, score)?,
            GradeAction::Clear {
                student,
                subject,
                period,
                slot,
            } => self.school.clear_grade(&student, &subject, period, slot)?,
            GradeAction::Show { student } => {
                let sheet = self.school.query_grades(&student)?;
                return self.print_grade_sheet(&sheet);
            }
        };
        self.print_grade_change(&change)
    }

    fn report(&mut self, target: ReportTarget) -> anyhow::Result<()> {
        let generated = Utc::now().date_naive();
        let (json, out, markdown) = match target {
            ReportTarget::Student { id, json, out } => {
                let card = self.school.student_report(&id)?;
                if json {
                    (Some(serde_json::to_string_pretty(&card)?), out, None)
                } else {
                    (None, out, Some(report::build_student_report(&card, generated)))
                }
            }
            ReportTarget::Class { code, json, out } => {
                let closing = self.school.class_closing_report(&code)?;
                if json {
                    (Some(serde_json::to_string_pretty(&closing)?), out, None)
                } else {
                    (None, out, Some(report::build_closing_report(&closing, generated)))
                }
            }
        };

        let body = json.or(markdown).unwrap_or_default();
        match out {
            Some(path) => {
                std::fs::write(&path, &body)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                writeln!(self.out, "Report written to {}.", path.display())?;
            }
            None => writeln!(self.out, "{}", body.trim_end())?,
        }
        Ok(())
    }

    fn print_admission(&mut self, admission: &Admission) -> anyhow::Result<()> {
        if admission.class_created {
            writeln!(self.out, "Created class {}.", admission.class_code)?;
        }
        match admission.placement {
            Placement::Enrolled => writeln!(
                self.out,
                "Enrolled {} ({}) in {}.",
                admission.student_name, admission.student_id, admission.class_code
            )?,
            Placement::Waitlisted { position } => writeln!(
                self.out,
                "Class {} is full: {} ({}) waitlisted at position {}.",
                admission.class_code, admission.student_name, admission.student_id, position
            )?,
        }
        Ok(())
    }

    fn print_withdrawal(&mut self, withdrawal: &Withdrawal) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "Withdrew {} ({}) from {}.",
            withdrawal.removed.name, withdrawal.removed.id, withdrawal.class_code
        )?;
        if let Some(promoted) = &withdrawal.promoted {
            write!(self.out, "Promoted from waitlist: ")?;
            self.print_admission(promoted)?;
        }
        Ok(())
    }

    fn print_classes(&mut self) -> anyhow::Result<()> {
        let classes = self.school.roster.classes();
        if classes.is_empty() {
            writeln!(self.out, "No classes yet.")?;
        }
        for class in classes {
            let head = class
                .head_teacher_id
                .as_deref()
                .and_then(|id| self.school.roster.teacher(id))
                .map(|teacher| teacher.name.as_str())
                .unwrap_or(report::NO_TEACHER);
            writeln!(
                self.out,
                "{:<8} | level {:>2} | {}/{} seats | head: {}",
                class.code,
                class.grade_level,
                class.enrolled(),
                class.capacity,
                head
            )?;
        }
        Ok(())
    }

    fn print_waitlist(&mut self) -> anyhow::Result<()> {
        if self.school.waitlist.is_empty() {
            writeln!(self.out, "Waitlist is empty.")?;
            return Ok(());
        }
        writeln!(
            self.out,
            "Waitlist ({} waiting):",
            self.school.waitlist.len()
        )?;
        if let Some(next) = self.school.waitlist.peek() {
            writeln!(self.out, "Next seat goes to {} ({}).", next.name, next.id)?;
        }
        for (index, student) in self.school.waitlist.iter().enumerate() {
            writeln!(
                self.out,
                "{:>3}. {:<20} | {} | level {}",
                index + 1,
                student.name,
                student.id,
                student.grade_level
            )?;
        }
        Ok(())
    }

    fn print_grade_change(&mut self, change: &GradeChange) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "Grade {}: {} | {} | period {} slot {}: {:.2} -> {:.2} | period average {:.2}",
            change.action.verb(),
            change.student_name,
            change.subject,
            change.period,
            change.slot.number(),
            change.previous,
            change.current,
            change.period_average
        )?;
        Ok(())
    }

    fn print_grade_sheet(&mut self, sheet: &GradeSheet) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "Grades for {} ({}) in {}:",
            sheet.student_name, sheet.student_id, sheet.class_code
        )?;
        for subject in &sheet.subjects {
            let periods = subject
                .periods
                .iter()
                .enumerate()
                .map(|(index, period)| {
                    format!(
                        "P{}[{:.1} {:.1} avg {:.1}]",
                        index + 1,
                        period.first,
                        period.second,
                        period.average
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(self.out, "{:<15} | {}", subject.name, periods)?;
        }
        Ok(())
    }
}
