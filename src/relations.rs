//! Navigational relations over the schema.
//!
//! Nothing here is stored. `lecturer_id` and `student_id` are matched by
//! value against `user_id`; a reference with no matching row resolves to
//! `None` or an empty list.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{classes, courses, enrollments, lecturers, students, waitlist};
use crate::models::{Class, Course, Enrollment, Lecturer, Student, WaitlistEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Serialize)]
pub struct RelationDef {
    pub table: &'static str,
    pub name: &'static str,
    pub target: &'static str,
    pub cardinality: Cardinality,
    /// Join columns as `(column on table, column on target)`.
    pub join: (&'static str, &'static str),
    /// Backed by a foreign key.
    pub enforced: bool,
}

const fn rel(
    table: &'static str,
    name: &'static str,
    target: &'static str,
    cardinality: Cardinality,
    join: (&'static str, &'static str),
    enforced: bool,
) -> RelationDef {
    RelationDef {
        table,
        name,
        target,
        cardinality,
        join,
        enforced,
    }
}

pub static RELATIONS: [RelationDef; 12] = [
    rel("courses", "classes", "classes", Cardinality::Many, ("id", "course_id"), true),
    rel("courses", "waitlist", "waitlist", Cardinality::Many, ("id", "course_id"), true),
    rel("classes", "course", "courses", Cardinality::One, ("course_id", "id"), true),
    rel("classes", "enrollments", "enrollments", Cardinality::Many, ("id", "class_id"), true),
    rel("classes", "lecturer", "lecturers", Cardinality::One, ("lecturer_id", "user_id"), false),
    rel("enrollments", "class", "classes", Cardinality::One, ("class_id", "id"), true),
    rel("enrollments", "student", "students", Cardinality::One, ("student_id", "user_id"), false),
    rel("waitlist", "course", "courses", Cardinality::One, ("course_id", "id"), true),
    rel("waitlist", "student", "students", Cardinality::One, ("student_id", "user_id"), false),
    rel("lecturers", "classes", "classes", Cardinality::Many, ("user_id", "lecturer_id"), false),
    rel("students", "enrollments", "enrollments", Cardinality::Many, ("user_id", "student_id"), false),
    rel("students", "waitlist_entries", "waitlist", Cardinality::Many, ("user_id", "student_id"), false),
];

pub fn relations_of(table: &str) -> impl Iterator<Item = &'static RelationDef> {
    RELATIONS.iter().filter(move |r| r.table == table)
}

pub fn relation(table: &str, name: &str) -> Option<&'static RelationDef> {
    relations_of(table).find(|r| r.name == name)
}

pub async fn course_classes(db: &SqlitePool, course: &Course) -> Result<Vec<Class>, sqlx::Error> {
    classes::list_classes_by_course(db, course.id).await
}

pub async fn course_waitlist(
    db: &SqlitePool,
    course: &Course,
) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
    waitlist::list_waitlist_by_course(db, course.id).await
}

pub async fn class_course(db: &SqlitePool, class: &Class) -> Result<Option<Course>, sqlx::Error> {
    courses::find_course_by_id(db, class.course_id).await
}

pub async fn class_enrollments(db: &SqlitePool, class: &Class) -> Result<Vec<Enrollment>, sqlx::Error> {
    enrollments::list_enrollments_by_class(db, class.id).await
}

pub async fn class_lecturer(db: &SqlitePool, class: &Class) -> Result<Option<Lecturer>, sqlx::Error> {
    match class.lecturer_id.as_deref() {
        Some(user_id) => lecturers::find_lecturer_by_user_id(db, user_id).await,
        None => Ok(None),
    }
}

pub async fn enrollment_class(
    db: &SqlitePool,
    enrollment: &Enrollment,
) -> Result<Option<Class>, sqlx::Error> {
    classes::find_class_by_id(db, enrollment.class_id).await
}

pub async fn enrollment_student(
    db: &SqlitePool,
    enrollment: &Enrollment,
) -> Result<Option<Student>, sqlx::Error> {
    students::find_student_by_user_id(db, &enrollment.student_id).await
}

pub async fn waitlist_course(
    db: &SqlitePool,
    entry: &WaitlistEntry,
) -> Result<Option<Course>, sqlx::Error> {
    courses::find_course_by_id(db, entry.course_id).await
}

pub async fn waitlist_student(
    db: &SqlitePool,
    entry: &WaitlistEntry,
) -> Result<Option<Student>, sqlx::Error> {
    students::find_student_by_user_id(db, &entry.student_id).await
}

pub async fn lecturer_classes(db: &SqlitePool, lecturer: &Lecturer) -> Result<Vec<Class>, sqlx::Error> {
    classes::list_classes_by_lecturer(db, &lecturer.user_id).await
}

pub async fn student_enrollments(
    db: &SqlitePool,
    student: &Student,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    enrollments::list_enrollments_by_student(db, &student.user_id).await
}

pub async fn student_waitlist_entries(
    db: &SqlitePool,
    student: &Student,
) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
    waitlist::list_waitlist_by_student(db, &student.user_id).await
}

/// A course with its direct relations.
#[derive(Debug, Serialize)]
pub struct CourseGraph {
    pub course: Course,
    pub classes: Vec<Class>,
    pub waitlist: Vec<WaitlistEntry>,
}

/// A class with its direct relations.
#[derive(Debug, Serialize)]
pub struct ClassGraph {
    pub class: Class,
    pub course: Option<Course>,
    pub enrollments: Vec<Enrollment>,
    pub lecturer: Option<Lecturer>,
}

pub async fn load_course_graph(db: &SqlitePool, id: i64) -> Result<Option<CourseGraph>, sqlx::Error> {
    let Some(course) = courses::find_course_by_id(db, id).await? else {
        return Ok(None);
    };

    let classes = course_classes(db, &course).await?;
    let waitlist = course_waitlist(db, &course).await?;

    Ok(Some(CourseGraph {
        course,
        classes,
        waitlist,
    }))
}

pub async fn load_class_graph(db: &SqlitePool, id: i64) -> Result<Option<ClassGraph>, sqlx::Error> {
    let Some(class) = classes::find_class_by_id(db, id).await? else {
        return Ok(None);
    };

    let course = class_course(db, &class).await?;
    let enrollments = class_enrollments(db, &class).await?;
    let lecturer = class_lecturer(db, &class).await?;

    Ok(Some(ClassGraph {
        class,
        course,
        enrollments,
        lecturer,
    }))
}
