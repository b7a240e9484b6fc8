use std::io::Write;

use serde::Serialize;

use super::domain::{EvaluationStatus, StudentEvaluation};

#[derive(Debug)]
pub enum GradebookError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for GradebookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradebookError::Io(err) => write!(f, "failed to write gradebook: {}", err),
            GradebookError::Csv(err) => write!(f, "failed to encode gradebook row: {}", err),
        }
    }
}

impl std::error::Error for GradebookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GradebookError::Io(err) => Some(err),
            GradebookError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for GradebookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for GradebookError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

const GRADEBOOK_HEADER: [&str; 9] = [
    "evaluation_id",
    "assignment_id",
    "student_id",
    "evaluator_name",
    "peer_name",
    "date",
    "average_rating",
    "teacher_grade",
    "teacher_comments",
];

#[derive(Debug, Serialize)]
struct GradebookRow<'a> {
    evaluation_id: &'a str,
    assignment_id: &'a str,
    student_id: &'a str,
    evaluator_name: &'a str,
    peer_name: &'a str,
    date: String,
    average_rating: f64,
    teacher_grade: u8,
    teacher_comments: &'a str,
}

/// Write the header and one CSV row per graded evaluation, returning how many
/// rows were written. The header is present even when nothing is graded.
pub fn write_gradebook<W: Write>(
    evaluations: &[StudentEvaluation],
    writer: W,
) -> Result<usize, GradebookError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(GRADEBOOK_HEADER)?;
    let mut written = 0;

    for evaluation in evaluations {
        let Some(teacher_grade) = evaluation.teacher_grade else {
            continue;
        };
        if evaluation.status != EvaluationStatus::Graded {
            continue;
        }

        csv_writer.serialize(GradebookRow {
            evaluation_id: &evaluation.id.0,
            assignment_id: &evaluation.assignment_id,
            student_id: &evaluation.student_id,
            evaluator_name: &evaluation.evaluator_name,
            peer_name: &evaluation.peer_name,
            date: evaluation.date.format("%Y-%m-%d").to_string(),
            average_rating: evaluation.average_rating(),
            teacher_grade,
            teacher_comments: evaluation.teacher_comments.as_deref().unwrap_or_default(),
        })?;
        written += 1;
    }

    csv_writer.flush()?;
    Ok(written)
}
