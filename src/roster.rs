use tracing::debug;

use crate::error::{Result, SchoolError};
use crate::models::{class_code_for, Class, Student, Teacher};

/// Teachers and classes of the session. Both collections are head-insert:
/// the most recently created entry lists first.
#[derive(Debug, Default)]
pub struct Roster {
    teachers: Vec<Teacher>,
    classes: Vec<Class>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_teacher(&mut self, teacher: Teacher) -> Result<&Teacher> {
        if self.teacher(&teacher.id).is_some() {
            return Err(SchoolError::DuplicateTeacher(teacher.id));
        }
        self.teachers.insert(0, teacher);
        Ok(&self.teachers[0])
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|teacher| teacher.id == id)
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// Clears every subject and head-teacher reference to `teacher_id` held by
    /// enrolled students and classes. Must run before `take_teacher`.
    pub fn unlink_teacher(&mut self, teacher_id: &str) -> usize {
        let mut cleared = 0;
        for class in &mut self.classes {
            if class.head_teacher_id.as_deref() == Some(teacher_id) {
                class.head_teacher_id = None;
                cleared += 1;
            }
            for student in &mut class.students {
                cleared += student.unlink_teacher(teacher_id);
            }
        }
        debug!("cleared {} references to teacher {}", cleared, teacher_id);
        cleared
    }

    pub fn take_teacher(&mut self, id: &str) -> Result<Teacher> {
        let position = self
            .teachers
            .iter()
            .position(|teacher| teacher.id == id)
            .ok_or_else(|| SchoolError::TeacherNotFound(id.to_string()))?;
        Ok(self.teachers.remove(position))
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn class(&self, code: &str) -> Option<&Class> {
        self.classes.iter().find(|class| class.code == code)
    }

    pub fn class_mut(&mut self, code: &str) -> Result<&mut Class> {
        self.classes
            .iter_mut()
            .find(|class| class.code == code)
            .ok_or_else(|| SchoolError::ClassNotFound(code.to_string()))
    }

    /// Returns the class for `grade_level`, creating the default class for it
    /// when none exists yet. The flag reports whether a class was created.
    pub fn class_for_level(&mut self, grade_level: u8, capacity: usize) -> (&mut Class, bool) {
        match self.classes.iter().position(|class| class.grade_level == grade_level) {
            Some(position) => (&mut self.classes[position], false),
            None => {
                let code = class_code_for(grade_level);
                debug!("creating class {} with {} seats", code, capacity);
                self.classes.insert(0, Class::new(&code, grade_level, capacity));
                (&mut self.classes[0], true)
            }
        }
    }

    pub fn set_head_teacher(&mut self, class_code: &str, teacher_id: &str) -> Result<()> {
        if self.teacher(teacher_id).is_none() {
            return Err(SchoolError::TeacherNotFound(teacher_id.to_string()));
        }
        self.class_mut(class_code)?.head_teacher_id = Some(teacher_id.to_string());
        Ok(())
    }

    pub fn student_in_class(&self, class_code: &str, student_id: &str) -> Option<&Student> {
        self.class(class_code)?.student(student_id)
    }

    /// Looks an enrolled student up across every class.
    pub fn find_student(&self, student_id: &str) -> Option<(&Class, &Student)> {
        self.classes.iter().find_map(|class| {
            class
                .student(student_id)
                .map(|student| (class, student))
        })
    }

    pub fn find_student_mut(&mut self, student_id: &str) -> Option<&mut Student> {
        self.classes
            .iter_mut()
            .find_map(|class| class.student_mut(student_id))
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.classes.iter().flat_map(|class| class.students.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "kolping.edu.br";

    #[test]
    fn rejects_duplicate_teacher_ids() {
        let mut roster = Roster::new();
        roster
            .add_teacher(Teacher::new("T1", "Carla Dias", "Exatas", DOMAIN))
            .unwrap();
        let err = roster
            .add_teacher(Teacher::new("T1", "Other", "Humanas", DOMAIN))
            .unwrap_err();
        assert_eq!(err, SchoolError::DuplicateTeacher("T1".to_string()));
        assert_eq!(roster.teachers().len(), 1);
    }

    #[test]
    fn teachers_list_newest_first() {
        let mut roster = Roster::new();
        roster.add_teacher(Teacher::new("T1", "A", "X", DOMAIN)).unwrap();
        roster.add_teacher(Teacher::new("T2", "B", "Y", DOMAIN)).unwrap();
        let ids: Vec<_> = roster.teachers().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
    }

    #[test]
    fn creates_default_class_once_per_level() {
        let mut roster = Roster::new();
        let (class, created) = roster.class_for_level(11, 5);
        assert!(created);
        assert_eq!(class.code, "2EM-A");
        assert_eq!(class.capacity, 5);

        let (_, created) = roster.class_for_level(11, 5);
        assert!(!created);
        assert_eq!(roster.classes().len(), 1);
    }

    #[test]
    fn unlink_clears_subjects_and_head_teacher() {
        let mut roster = Roster::new();
        roster.add_teacher(Teacher::new("T1", "A", "X", DOMAIN)).unwrap();
        let (class, _) = roster.class_for_level(6, 5);
        let mut student = Student::new("S1", "Ana", 6, DOMAIN);
        student.subject_mut("Matematica").unwrap().teacher_id = Some("T1".to_string());
        student.subject_mut("Ciencias").unwrap().teacher_id = Some("T1".to_string());
        class.students.push(student);
        roster.set_head_teacher("6ANO-A", "T1").unwrap();

        assert_eq!(roster.unlink_teacher("T1"), 3);
        assert!(roster.class("6ANO-A").unwrap().head_teacher_id.is_none());
        assert!(roster
            .students()
            .flat_map(|s| s.subjects.iter())
            .all(|subject| subject.teacher_id.is_none()));
    }

    #[test]
    fn finds_students_in_any_class() {
        let mut roster = Roster::new();
        roster
            .class_for_level(6, 5)
            .0
            .students
            .push(Student::new("S1", "Ana", 6, DOMAIN));
        roster
            .class_for_level(7, 5)
            .0
            .students
            .push(Student::new("S2", "Bia", 7, DOMAIN));

        let (class, student) = roster.find_student("S2").unwrap();
        assert_eq!(class.code, "7ANO-A");
        assert_eq!(student.name, "Bia");
        assert!(roster.student_in_class("6ANO-A", "S2").is_none());
        assert!(roster.find_student("missing").is_none());
    }

    #[test]
    fn head_teacher_requires_known_teacher() {
        let mut roster = Roster::new();
        roster.class_for_level(6, 5);
        assert_eq!(
            roster.set_head_teacher("6ANO-A", "ghost"),
            Err(SchoolError::TeacherNotFound("ghost".to_string()))
        );
    }
}
