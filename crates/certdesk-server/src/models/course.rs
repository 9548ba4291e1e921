//! Course catalogue outcomes.

/// Outcome of inserting a course.
///
/// A duplicate name is a distinct signal, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseInsert {
    Created,
    Duplicate,
}
