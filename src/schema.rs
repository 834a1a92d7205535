//! Declarative constraint catalog for the `academic` namespace.
//!
//! Every table is described by its unique indexes, foreign keys and
//! enumeration-typed columns. The store consults this catalog for its
//! pre-write validation pass and to translate engine errors back into
//! index names.

use crate::error::StoreError;

/// Schema namespace the six tables belong to.
pub const NAMESPACE: &str = "academic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    Cascade,
}

#[derive(Debug)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub parent_table: &'static str,
    pub parent_column: &'static str,
    pub on_delete: OnDelete,
}

#[derive(Debug)]
pub struct EnumDomain {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

impl EnumDomain {
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value)
    }

    /// Error for a value outside the domain.
    pub fn reject(&self, value: &str) -> StoreError {
        StoreError::Domain(format!(
            "invalid {} value '{}', expected one of: {}",
            self.name,
            value,
            self.values.join(", ")
        ))
    }
}

#[derive(Debug)]
pub struct EnumColumn {
    pub column: &'static str,
    pub domain: &'static EnumDomain,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub unique_indexes: &'static [UniqueIndex],
    pub foreign_keys: &'static [ForeignKey],
    pub enum_columns: &'static [EnumColumn],
    pub has_updated_at: bool,
}

impl TableDef {
    pub fn foreign_key(&self, column: &str) -> Option<&'static ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    pub fn enum_domain(&self, column: &str) -> Option<&'static EnumDomain> {
        self.enum_columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.domain)
    }

    /// Qualified name, e.g. `academic.courses`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", NAMESPACE, self.name)
    }
}

pub static CLASS_STATUS: EnumDomain = EnumDomain {
    name: "class_status",
    values: &[
        "planned",
        "open_enrollment",
        "closed_enrollment",
        "in_progress",
        "finished",
        "cancelled",
    ],
};

pub static ENROLLMENT_STATUS: EnumDomain = EnumDomain {
    name: "enrollment_status",
    values: &[
        "waitlist",
        "pending_payment",
        "enrolled",
        "completed",
        "dropped",
        "cancelled",
    ],
};

pub static COURSES: TableDef = TableDef {
    name: "courses",
    unique_indexes: &[UniqueIndex {
        name: "courses_code_uidx",
        table: "courses",
        columns: &["code"],
    }],
    foreign_keys: &[],
    enum_columns: &[],
    has_updated_at: true,
};

pub static CLASSES: TableDef = TableDef {
    name: "classes",
    unique_indexes: &[UniqueIndex {
        name: "classes_code_uidx",
        table: "classes",
        columns: &["code"],
    }],
    foreign_keys: &[ForeignKey {
        table: "classes",
        column: "course_id",
        parent_table: "courses",
        parent_column: "id",
        on_delete: OnDelete::Restrict,
    }],
    enum_columns: &[EnumColumn {
        column: "status",
        domain: &CLASS_STATUS,
    }],
    has_updated_at: true,
};

pub static ENROLLMENTS: TableDef = TableDef {
    name: "enrollments",
    unique_indexes: &[UniqueIndex {
        name: "enrollments_class_student_uidx",
        table: "enrollments",
        columns: &["class_id", "student_id"],
    }],
    foreign_keys: &[ForeignKey {
        table: "enrollments",
        column: "class_id",
        parent_table: "classes",
        parent_column: "id",
        on_delete: OnDelete::Restrict,
    }],
    enum_columns: &[EnumColumn {
        column: "status",
        domain: &ENROLLMENT_STATUS,
    }],
    has_updated_at: true,
};

pub static WAITLIST: TableDef = TableDef {
    name: "waitlist",
    unique_indexes: &[UniqueIndex {
        name: "waitlist_course_student_uidx",
        table: "waitlist",
        columns: &["course_id", "student_id"],
    }],
    foreign_keys: &[ForeignKey {
        table: "waitlist",
        column: "course_id",
        parent_table: "courses",
        parent_column: "id",
        on_delete: OnDelete::Cascade,
    }],
    enum_columns: &[],
    has_updated_at: false,
};

pub static LECTURERS: TableDef = TableDef {
    name: "lecturers",
    unique_indexes: &[
        UniqueIndex {
            name: "lecturers_userId_uidx",
            table: "lecturers",
            columns: &["user_id"],
        },
        UniqueIndex {
            name: "lecturers_employeeCode_uidx",
            table: "lecturers",
            columns: &["employee_code"],
        },
    ],
    foreign_keys: &[],
    enum_columns: &[],
    has_updated_at: true,
};

pub static STUDENTS: TableDef = TableDef {
    name: "students",
    unique_indexes: &[
        UniqueIndex {
            name: "students_userId_uidx",
            table: "students",
            columns: &["user_id"],
        },
        UniqueIndex {
            name: "students_studentCode_uidx",
            table: "students",
            columns: &["student_code"],
        },
    ],
    foreign_keys: &[],
    enum_columns: &[],
    has_updated_at: true,
};

pub static TABLES: [&TableDef; 6] = [
    &COURSES,
    &CLASSES,
    &ENROLLMENTS,
    &WAITLIST,
    &LECTURERS,
    &STUDENTS,
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}

/// Finds the unique index covering exactly `columns` on `table`.
pub fn unique_index_on(table: &str, columns: &[&str]) -> Option<&'static UniqueIndex> {
    self::table(table)?
        .unique_indexes
        .iter()
        .find(|idx| idx.columns == columns)
}

/// Foreign keys in other tables that point at `parent_table`.
pub fn dependents_of(parent_table: &str) -> impl Iterator<Item = &'static ForeignKey> {
    TABLES
        .iter()
        .flat_map(|t| t.foreign_keys.iter())
        .filter(move |fk| fk.parent_table == parent_table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_dependents_split_by_action() {
        let deps: Vec<_> = dependents_of("courses").collect();
        assert_eq!(deps.len(), 2);

        let restrict = deps.iter().find(|fk| fk.table == "classes").unwrap();
        assert_eq!(restrict.on_delete, OnDelete::Restrict);

        let cascade = deps.iter().find(|fk| fk.table == "waitlist").unwrap();
        assert_eq!(cascade.on_delete, OnDelete::Cascade);
    }

    #[test]
    fn test_unique_index_lookup_by_columns() {
        let idx = unique_index_on("enrollments", &["class_id", "student_id"]).unwrap();
        assert_eq!(idx.name, "enrollments_class_student_uidx");

        assert!(unique_index_on("enrollments", &["student_id"]).is_none());
        assert!(unique_index_on("nope", &["code"]).is_none());
    }

    #[test]
    fn test_enum_domain_reject_lists_values() {
        assert!(CLASS_STATUS.contains("in_progress"));
        assert!(!CLASS_STATUS.contains("archived"));

        match CLASS_STATUS.reject("archived") {
            StoreError::Domain(msg) => {
                assert!(msg.contains("class_status"));
                assert!(msg.contains("archived"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_only_waitlist_lacks_updated_at() {
        let without: Vec<_> = TABLES
            .iter()
            .filter(|t| !t.has_updated_at)
            .map(|t| t.name)
            .collect();
        assert_eq!(without, vec!["waitlist"]);
        assert_eq!(WAITLIST.qualified_name(), "academic.waitlist");
    }

    #[test]
    fn test_status_columns_carry_their_domains() {
        assert_eq!(CLASSES.enum_domain("status").unwrap().name, "class_status");
        assert_eq!(ENROLLMENTS.enum_domain("status").unwrap().name, "enrollment_status");
        assert!(COURSES.enum_domain("status").is_none());
    }
}
