use crate::student::{GradeStatus, Student};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub class_name: String,
    pub total_students: usize,
    /// Mean of per-student averages, not weighted by subject count.
    pub average_class_score: f64,
    pub pass_count: usize,
    pub fail_count: usize,
}

/// Up to `n` students ranked by descending average. The sort is stable, so
/// students with equal averages keep their insertion order.
pub fn top_students(students: &[Student], n: usize) -> Vec<&Student> {
    let mut ranked: Vec<&Student> = students.iter().collect();
    ranked.sort_by(|a, b| {
        b.average()
            .partial_cmp(&a.average())
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// Exact, case-sensitive class match, original order preserved.
pub fn students_in_class<'a>(students: &'a [Student], class_name: &str) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| s.class_name() == class_name)
        .collect()
}

pub fn class_statistics(class_name: &str, students: &[Student]) -> ClassStatistics {
    let members = students_in_class(students, class_name);
    if members.is_empty() {
        return ClassStatistics {
            class_name: class_name.to_string(),
            total_students: 0,
            average_class_score: 0.0,
            pass_count: 0,
            fail_count: 0,
        };
    }

    let total: f64 = members.iter().map(|s| s.average()).sum();
    let pass_count = members
        .iter()
        .filter(|s| s.status() == GradeStatus::Pass)
        .count();

    ClassStatistics {
        class_name: class_name.to_string(),
        total_students: members.len(),
        average_class_score: total / members.len() as f64,
        pass_count,
        fail_count: members.len() - pass_count,
    }
}
