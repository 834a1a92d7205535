pub mod class;
pub mod course;
pub mod enrollment;
pub mod lecturer;
pub mod status;
pub mod student;
pub mod waitlist;

pub use class::{Class, NewClass, UpdateClass};
pub use course::{Course, NewCourse, UpdateCourse};
pub use enrollment::{Enrollment, NewEnrollment, UpdateEnrollment};
pub use lecturer::{Lecturer, NewLecturer, UpdateLecturer};
pub use status::{ClassStatus, EnrollmentStatus};
pub use student::{NewStudent, Student, UpdateStudent};
pub use waitlist::{NewWaitlistEntry, UpdateWaitlistEntry, WaitlistEntry};
