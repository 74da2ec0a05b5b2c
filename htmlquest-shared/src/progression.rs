/// Lesson navigation gate and quiz grading
///
/// A learner may open lesson N+1 only after passing the quiz of lesson N. The
/// gate is evaluated on the server for every content and quiz request; the
/// `can_advance` flag in [`LessonNav`] is what clients use to enable "Next".
///
/// The first lesson is always open. Supervisors and admins bypass the gate.
///
/// # Example
///
/// ```
/// use htmlquest_shared::models::lesson::QuizQuestion;
/// use htmlquest_shared::progression::grade_quiz;
///
/// let quiz = vec![
///     QuizQuestion { prompt: "a".into(), options: vec!["x".into(), "y".into()], answer: 0 },
///     QuizQuestion { prompt: "b".into(), options: vec!["x".into(), "y".into()], answer: 1 },
/// ];
///
/// let grade = grade_quiz(&quiz, &[0, 1]).unwrap();
/// assert_eq!(grade.score, 100);
/// assert!(grade.passed);
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::middleware::AuthContext;
use crate::models::lesson::{Lesson, LessonNeighbours, LessonSummary, QuizQuestion};
use crate::models::progress::LessonProgress;

/// Minimum quiz score (percent) that passes a lesson
pub const QUIZ_PASS_SCORE: i32 = 70;

#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("Lesson not found")]
    LessonNotFound,

    #[error("Finish the quiz of \"{blocking_title}\" before opening this lesson")]
    Locked {
        blocking_lesson: Uuid,
        blocking_title: String,
    },

    #[error("This lesson has no quiz")]
    NoQuiz,

    #[error("Expected {expected} answers, got {actual}")]
    AnswerCount { expected: usize, actual: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of the gate for one lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Open,
    Locked { blocking_lesson: LessonSummary },
}

/// Decides whether a learner may open a lesson.
///
/// `previous` is the lesson immediately before it together with the learner's
/// progress row for that lesson (absent when never visited).
pub fn decide(
    auth: &AuthContext,
    previous: Option<(LessonSummary, Option<&LessonProgress>)>,
) -> GateDecision {
    if auth.role.bypasses_lesson_gate() {
        return GateDecision::Open;
    }

    match previous {
        None => GateDecision::Open,
        Some((_, Some(progress))) if progress.quiz_passed => GateDecision::Open,
        Some((blocking_lesson, _)) => GateDecision::Locked { blocking_lesson },
    }
}

/// Result of grading one quiz attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizGrade {
    pub correct: usize,
    pub total: usize,
    /// Rounded percentage, 0-100
    pub score: i32,
    pub passed: bool,
}

/// Grades `answers` (option indices, one per question, in order).
pub fn grade_quiz(questions: &[QuizQuestion], answers: &[usize]) -> Result<QuizGrade, ProgressionError> {
    if questions.is_empty() {
        return Err(ProgressionError::NoQuiz);
    }
    if answers.len() != questions.len() {
        return Err(ProgressionError::AnswerCount {
            expected: questions.len(),
            actual: answers.len(),
        });
    }

    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.answer == **a)
        .count();
    let total = questions.len();
    let score = ((correct * 100) as f64 / total as f64).round() as i32;

    Ok(QuizGrade {
        correct,
        total,
        score,
        passed: score >= QUIZ_PASS_SCORE,
    })
}

/// Navigation pointers for one lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonNav {
    pub lesson_id: Uuid,
    pub prev: Option<Uuid>,
    pub next: Option<Uuid>,
    pub quiz_passed: bool,
    /// True iff the quiz is passed and a next lesson exists
    pub can_advance: bool,
}

pub fn build_nav(
    auth: &AuthContext,
    lesson_id: Uuid,
    neighbours: LessonNeighbours,
    progress: Option<&LessonProgress>,
) -> LessonNav {
    let quiz_passed = progress.map(|p| p.quiz_passed).unwrap_or(false);
    let unlocked = quiz_passed || auth.role.bypasses_lesson_gate();

    LessonNav {
        lesson_id,
        prev: neighbours.prev,
        next: neighbours.next,
        quiz_passed,
        can_advance: unlocked && neighbours.next.is_some(),
    }
}

/// Catalogue row with the learner's standing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonStanding {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub quiz_score: Option<i32>,
    pub quiz_passed: bool,
    pub unlocked: bool,
}

/// Annotates an ordered catalogue with progress and gate state.
pub fn standings(
    auth: &AuthContext,
    lessons: Vec<LessonSummary>,
    progress: &[LessonProgress],
) -> Vec<LessonStanding> {
    let by_lesson: HashMap<Uuid, &LessonProgress> =
        progress.iter().map(|p| (p.lesson_id, p)).collect();

    let mut previous_passed = true;
    lessons
        .into_iter()
        .map(|lesson| {
            let row = by_lesson.get(&lesson.id);
            let quiz_passed = row.map(|p| p.quiz_passed).unwrap_or(false);
            let unlocked = previous_passed || auth.role.bypasses_lesson_gate();
            previous_passed = quiz_passed;

            LessonStanding {
                id: lesson.id,
                position: lesson.position,
                title: lesson.title,
                quiz_score: row.and_then(|p| p.quiz_score),
                quiz_passed,
                unlocked,
            }
        })
        .collect()
}

/// Loads a lesson and enforces the gate for the caller.
pub async fn open_lesson(
    pool: &PgPool,
    auth: &AuthContext,
    lesson_id: Uuid,
) -> Result<Lesson, ProgressionError> {
    let lesson = Lesson::find_by_id(pool, lesson_id)
        .await?
        .ok_or(ProgressionError::LessonNotFound)?;

    let previous = match Lesson::find_previous(pool, lesson.position).await? {
        Some(prev) => {
            let progress = LessonProgress::find(pool, auth.user_id, prev.id).await?;
            Some((prev, progress))
        }
        None => None,
    };

    let decision = decide(
        auth,
        previous
            .as_ref()
            .map(|(summary, progress)| (summary.clone(), progress.as_ref())),
    );

    match decision {
        GateDecision::Open => Ok(lesson),
        GateDecision::Locked { blocking_lesson } => {
            tracing::debug!(
                user_id = %auth.user_id,
                lesson_id = %lesson_id,
                blocking_lesson = %blocking_lesson.id,
                "Lesson gate locked"
            );
            Err(ProgressionError::Locked {
                blocking_lesson: blocking_lesson.id,
                blocking_title: blocking_lesson.title,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use chrono::Utc;

    fn student() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::Student)
    }

    fn summary(position: i32) -> LessonSummary {
        LessonSummary {
            id: Uuid::new_v4(),
            position,
            title: format!("Lesson {}", position),
        }
    }

    fn progress(user_id: Uuid, lesson_id: Uuid, passed: bool) -> LessonProgress {
        LessonProgress {
            user_id,
            lesson_id,
            completed: passed,
            quiz_score: Some(if passed { 100 } else { 50 }),
            quiz_passed: passed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn question(answer: usize) -> QuizQuestion {
        QuizQuestion {
            prompt: "q".to_string(),
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            answer,
        }
    }

    #[test]
    fn test_first_lesson_is_open() {
        assert_eq!(decide(&student(), None), GateDecision::Open);
    }

    #[test]
    fn test_unpassed_previous_lesson_locks() {
        let auth = student();
        let prev = summary(1);

        let never_visited = decide(&auth, Some((prev.clone(), None)));
        assert!(matches!(never_visited, GateDecision::Locked { .. }));

        let failed = progress(auth.user_id, prev.id, false);
        let decision = decide(&auth, Some((prev.clone(), Some(&failed))));
        assert_eq!(decision, GateDecision::Locked { blocking_lesson: prev });
    }

    #[test]
    fn test_passed_previous_lesson_opens() {
        let auth = student();
        let prev = summary(1);
        let passed = progress(auth.user_id, prev.id, true);

        assert_eq!(decide(&auth, Some((prev, Some(&passed)))), GateDecision::Open);
    }

    #[test]
    fn test_staff_bypass_gate() {
        for role in [UserRole::Supervisor, UserRole::Admin] {
            let auth = AuthContext::new(Uuid::new_v4(), role);
            assert_eq!(decide(&auth, Some((summary(3), None))), GateDecision::Open);
        }
    }

    #[test]
    fn test_grade_quiz_scores_and_threshold() {
        let quiz = vec![question(0), question(1), question(2)];

        let all = grade_quiz(&quiz, &[0, 1, 2]).unwrap();
        assert_eq!((all.correct, all.score, all.passed), (3, 100, true));

        let two = grade_quiz(&quiz, &[0, 1, 0]).unwrap();
        assert_eq!(two.score, 67);
        assert!(!two.passed);

        let none = grade_quiz(&quiz, &[2, 2, 0]).unwrap();
        assert_eq!(none.score, 0);
    }

    #[test]
    fn test_grade_quiz_pass_boundary() {
        let quiz: Vec<_> = (0..10).map(|_| question(0)).collect();

        let seven = grade_quiz(&quiz, &[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]).unwrap();
        assert_eq!(seven.score, 70);
        assert!(seven.passed);

        let six = grade_quiz(&quiz, &[0, 0, 0, 0, 0, 0, 1, 1, 1, 1]).unwrap();
        assert_eq!(six.score, 60);
        assert!(!six.passed);
    }

    #[test]
    fn test_grade_quiz_rejects_bad_input() {
        assert!(matches!(grade_quiz(&[], &[]), Err(ProgressionError::NoQuiz)));
        assert!(matches!(
            grade_quiz(&[question(0)], &[0, 1]),
            Err(ProgressionError::AnswerCount { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_nav_never_advances_without_passed_quiz() {
        let auth = student();
        let lesson_id = Uuid::new_v4();
        let neighbours = LessonNeighbours {
            prev: None,
            next: Some(Uuid::new_v4()),
        };

        let fresh = build_nav(&auth, lesson_id, neighbours, None);
        assert!(!fresh.quiz_passed);
        assert!(!fresh.can_advance);

        let failed = progress(auth.user_id, lesson_id, false);
        assert!(!build_nav(&auth, lesson_id, neighbours, Some(&failed)).can_advance);

        let passed = progress(auth.user_id, lesson_id, true);
        let nav = build_nav(&auth, lesson_id, neighbours, Some(&passed));
        assert!(nav.quiz_passed);
        assert!(nav.can_advance);
    }

    #[test]
    fn test_nav_last_lesson_cannot_advance() {
        let auth = student();
        let lesson_id = Uuid::new_v4();
        let passed = progress(auth.user_id, lesson_id, true);

        let nav = build_nav(&auth, lesson_id, LessonNeighbours::default(), Some(&passed));
        assert!(nav.quiz_passed);
        assert!(!nav.can_advance);
    }

    #[test]
    fn test_standings_unlock_chain() {
        let auth = student();
        let lessons = vec![summary(1), summary(2), summary(3)];
        let rows = vec![
            progress(auth.user_id, lessons[0].id, true),
            progress(auth.user_id, lessons[1].id, false),
        ];

        let result = standings(&auth, lessons, &rows);
        let unlocked: Vec<bool> = result.iter().map(|s| s.unlocked).collect();
        assert_eq!(unlocked, vec![true, true, false]);
        assert_eq!(result[1].quiz_score, Some(50));
        assert_eq!(result[2].quiz_score, None);
    }
}
