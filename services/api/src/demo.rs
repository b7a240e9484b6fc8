use crate::infra::{build_service, in_memory_service, AppBlobStore};
use chrono::{Local, NaiveDate};
use clap::Args;
use peer_review::config::AppConfig;
use peer_review::error::AppError;
use peer_review::workflows::evaluations::router::SUGGESTIONS_UNAVAILABLE;
use peer_review::workflows::evaluations::{
    write_gradebook, CriteriaRatings, EvaluationAnalytics, EvaluationDraft, EvaluationRecord,
    EvaluationSubmission, GradeDecision, QualityScorer,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct SuggestArgs {
    /// JSON file holding `criteria`, `strengths`, `areasForImprovement`
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Also print the advisory grade a reviewer would see
    #[arg(long)]
    pub(crate) grade: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Destination CSV file (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date stamped on the sample evaluations (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Stop after the review step and skip grading.
    #[arg(long)]
    pub(crate) skip_grading: bool,
}

pub(crate) fn run_suggest(args: SuggestArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let draft: EvaluationDraft = serde_json::from_str(&raw)?;
    let scorer = QualityScorer::new();

    let result = if args.grade {
        scorer.review_draft(&draft)
    } else {
        scorer.suggest_draft(&draft)
    };

    let result = match result {
        Ok(result) => result,
        Err(err) => {
            println!("{SUGGESTIONS_UNAVAILABLE}");
            return Err(err.into());
        }
    };

    println!("Quality suggestions");
    for suggestion in &result.suggestions {
        println!("- {suggestion}");
    }
    if let Some(grade) = result.suggested_grade {
        println!("Suggested grade: {grade}/100");
    }
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = AppBlobStore::from_config(&config)?;
    let service = build_service(&config, store);
    let evaluations = service.list(None)?;

    let written = match args.output {
        Some(path) => {
            let file = BufWriter::new(File::create(&path)?);
            let written = write_gradebook(&evaluations, file)?;
            println!("Wrote {written} graded evaluations to {}", path.display());
            written
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let written = write_gradebook(&evaluations, &mut handle)?;
            handle.flush()?;
            written
        }
    };

    if written == 0 {
        eprintln!("No graded evaluations to export");
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, skip_grading } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let service = in_memory_service();

    println!("Peer evaluation demo ({date})");
    println!("\nStudent submissions");
    let mut submitted = Vec::new();
    for submission in sample_submissions(date)? {
        let evaluation = service.submit(submission)?;
        println!(
            "- {} -> {} by {} (average {:.1})",
            evaluation.id,
            evaluation.peer_name,
            evaluation.evaluator_name,
            evaluation.average_rating()
        );
        for suggestion in &evaluation.ai_suggestions {
            println!("    * {suggestion}");
        }
        submitted.push(evaluation);
    }

    println!("\nTeacher review");
    for evaluation in &submitted {
        let insights = service.review(&evaluation.id)?;
        println!(
            "- {} [{}] suggested grade {}/100: {}",
            insights.evaluation_id,
            insights.status,
            insights.suggested_grade,
            insights.grade_rationale
        );
        for finding in insights.findings.iter().filter(|finding| finding.concern) {
            println!("    ! {}", finding.detail);
        }

        if !skip_grading {
            let graded = service.grade(
                &evaluation.id,
                GradeDecision {
                    grade: i64::from(insights.suggested_grade),
                    comments: "Accepted suggested grade".to_string(),
                },
            )?;
            println!(
                "    graded {} -> {}",
                graded.teacher_grade.unwrap_or_default(),
                graded.status.label()
            );
        }
    }

    let analytics = service.analytics()?;
    render_analytics(&analytics);

    if !skip_grading {
        println!("\nGradebook");
        let evaluations = service.list(None)?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write_gradebook(&evaluations, &mut handle)?;
        handle.flush()?;
    }

    Ok(())
}

fn render_analytics(analytics: &EvaluationAnalytics) {
    println!("\nAnalytics");
    println!(
        "- {} evaluations across {} peers | average score {:.2}",
        analytics.total_evaluations, analytics.unique_peers, analytics.average_score
    );
    println!(
        "- status: {} submitted | {} reviewed | {} graded",
        analytics.status.submitted, analytics.status.reviewed, analytics.status.graded
    );
    if let Some(grade) = analytics.average_teacher_grade {
        println!("- average teacher grade {grade:.2}");
    }
    println!("Criteria averages:");
    for criterion in &analytics.criteria {
        println!("  - {}: {:.2}", criterion.label, criterion.average);
    }
    if let Some(top) = &analytics.top_performer {
        println!(
            "Top performer: {} ({:.2} over {} evaluations)",
            top.peer_name, top.average, top.evaluations
        );
    }
}

fn sample_submissions(date: NaiveDate) -> Result<Vec<EvaluationSubmission>, AppError> {
    let samples = [
        (
            "Michael Chen",
            "Emma Williams",
            CriteriaRatings::new(5, 4, 5, 4, 5)?,
            "Excellent technical skills and leadership. Emma consistently guides the team through complex problems, for example during the database migration.",
            "Could improve on delegating tasks to team members so that others get more ownership of the work.",
            "Great team player overall.",
        ),
        (
            "Sarah Johnson",
            "Michael Chen",
            CriteriaRatings::new(4, 5, 4, 5, 4)?,
            "Outstanding problem-solving abilities and communication skills.",
            "Could take on more leadership responsibilities.",
            "Very reliable team member.",
        ),
        (
            "Alex Rodriguez",
            "Emma Williams",
            CriteriaRatings::uniform(3)?,
            "Helpful.",
            "More updates.",
            "",
        ),
    ];

    Ok(samples
        .into_iter()
        .enumerate()
        .map(
            |(index, (evaluator, peer, criteria, strengths, improvements, comments))| {
                let record = EvaluationRecord {
                    criteria,
                    strengths: strengths.to_string(),
                    areas_for_improvement: improvements.to_string(),
                    additional_comments: comments.to_string(),
                };
                EvaluationSubmission {
                    assignment_id: "assign-1".to_string(),
                    student_id: format!("student-{}", index + 1),
                    evaluator_name: evaluator.to_string(),
                    peer_name: peer.to_string(),
                    date: Some(date),
                    draft: EvaluationDraft::from(&record),
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_submissions_are_accepted_by_the_service() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 10).expect("valid date");
        let service: std::sync::Arc<crate::infra::AppEvaluationService> = in_memory_service();

        for submission in sample_submissions(date).expect("samples build") {
            let stored = service.submit(submission).expect("sample accepted");
            assert_eq!(stored.date, date);
        }

        let analytics = service.analytics().expect("analytics");
        assert_eq!(analytics.total_evaluations, 3);
        assert_eq!(analytics.unique_peers, 2);
    }

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 12, 10),
            skip_grading: false,
        })
        .expect("demo completes");
    }

    #[test]
    fn suggest_reports_invalid_criteria() {
        let path = std::env::temp_dir().join(format!(
            "peer-review-suggest-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"criteria": {"teamwork": 9}, "strengths": "Great"}"#,
        )
        .expect("write fixture");

        let result = run_suggest(SuggestArgs {
            input: path.clone(),
            grade: true,
        });

        assert!(matches!(result, Err(AppError::Evaluation(_))));
        std::fs::remove_file(&path).ok();
    }
}
