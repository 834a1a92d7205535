use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::schema::{CLASS_STATUS, ENROLLMENT_STATUS};

/// Lifecycle of a class. Transitions are informative only; the store
/// persists any legal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ClassStatus {
    #[default]
    Planned,
    OpenEnrollment,
    ClosedEnrollment,
    InProgress,
    Finished,
    Cancelled,
}

impl ClassStatus {
    pub const ALL: [ClassStatus; 6] = [
        ClassStatus::Planned,
        ClassStatus::OpenEnrollment,
        ClassStatus::ClosedEnrollment,
        ClassStatus::InProgress,
        ClassStatus::Finished,
        ClassStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Planned => "planned",
            ClassStatus::OpenEnrollment => "open_enrollment",
            ClassStatus::ClosedEnrollment => "closed_enrollment",
            ClassStatus::InProgress => "in_progress",
            ClassStatus::Finished => "finished",
            ClassStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClassStatus::Finished | ClassStatus::Cancelled)
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CLASS_STATUS.reject(s))
    }
}

/// Lifecycle of an enrollment. `dropped` and `cancelled` may follow any
/// non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Waitlist,
    PendingPayment,
    Enrolled,
    Completed,
    Dropped,
    Cancelled,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 6] = [
        EnrollmentStatus::Waitlist,
        EnrollmentStatus::PendingPayment,
        EnrollmentStatus::Enrolled,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Dropped,
        EnrollmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Waitlist => "waitlist",
            EnrollmentStatus::PendingPayment => "pending_payment",
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::Completed | EnrollmentStatus::Dropped | EnrollmentStatus::Cancelled
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ENROLLMENT_STATUS.reject(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_domains_match_enums() {
        let class: Vec<_> = ClassStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(class, CLASS_STATUS.values);

        let enrollment: Vec<_> = EnrollmentStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(enrollment, ENROLLMENT_STATUS.values);
    }

    #[test]
    fn test_unknown_status_is_domain_error() {
        let err = "archived".parse::<ClassStatus>().unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));

        let err = "Enrolled".parse::<EnrollmentStatus>().unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ClassStatus::Cancelled.is_terminal());
        assert!(!ClassStatus::InProgress.is_terminal());
        assert!(EnrollmentStatus::Dropped.is_terminal());
        assert!(!EnrollmentStatus::PendingPayment.is_terminal());
    }
}
