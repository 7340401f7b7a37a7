// src/exam/scoring.rs

use crate::models::{
    answer::UserAnswer,
    exam_record::{
        DomainResult, ExamResult, MultipleQuestionResult, QuestionResult, SingleQuestionResult,
    },
    localized::Locale,
    question::Question,
};

/// Minimum rounded percentage that passes an exam.
pub const PASSING_PERCENTAGE: u32 = 61;

/// Rounded percentage of `part` in `whole`; an empty whole is 0%.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
}

/// Scores one answered question.
///
/// Multiple-answer questions are all-or-nothing: the selected set must
/// equal the correct set exactly. An answer whose type does not match the
/// question is never correct.
pub fn is_correct(question: &Question, answer: &UserAnswer) -> bool {
    match (question, answer) {
        (Question::Single(q), UserAnswer::Single(a)) => a.selected_answer == Some(q.correct_answer),
        (Question::Multiple(q), UserAnswer::Multiple(a)) => a.selected_answers == q.correct_answers,
        _ => false,
    }
}

/// Scores an attempt.
///
/// `questions` and `answers` are paired by position and must have the same
/// length; callers normalize answers against the exam first. Domains are
/// reported in the order they first appear, keyed by their text in `locale`.
pub fn score_exam(questions: &[Question], answers: &[UserAnswer], locale: Locale) -> ExamResult {
    debug_assert_eq!(questions.len(), answers.len());

    let mut domain_results: Vec<DomainResult> = Vec::new();
    let mut question_results = Vec::with_capacity(questions.len());
    let mut correct_answers = 0u32;

    for (question, answer) in questions.iter().zip(answers) {
        let correct = is_correct(question, answer);
        if correct {
            correct_answers += 1;
        }

        let domain = question.domain().resolve(locale);
        match domain_results.iter_mut().find(|d| d.domain == domain) {
            Some(entry) => {
                entry.total += 1;
                entry.correct += u32::from(correct);
            }
            None => domain_results.push(DomainResult {
                domain: domain.to_string(),
                correct: u32::from(correct),
                total: 1,
                percentage: 0,
            }),
        }

        question_results.push(question_result(question, answer, correct));
    }

    for entry in &mut domain_results {
        entry.percentage = percentage(entry.correct, entry.total);
    }

    let total_questions = questions.len() as u32;
    let percentage = percentage(correct_answers, total_questions);

    ExamResult {
        total_questions,
        correct_answers,
        percentage,
        passed: total_questions > 0 && percentage >= PASSING_PERCENTAGE,
        domain_results,
        question_results,
    }
}

fn question_result(question: &Question, answer: &UserAnswer, is_correct: bool) -> QuestionResult {
    match question {
        Question::Single(q) => QuestionResult::Single(SingleQuestionResult {
            question_id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
            user_answer: match answer {
                UserAnswer::Single(a) => a.selected_answer,
                UserAnswer::Multiple(_) => None,
            },
            correct_answer: q.correct_answer,
            is_correct,
            explanation: q.explanation.clone(),
            domain: q.domain.clone(),
        }),
        Question::Multiple(q) => QuestionResult::Multiple(MultipleQuestionResult {
            question_id: q.id,
            question: q.question.clone(),
            options: q.options.clone(),
            user_answers: match answer {
                UserAnswer::Multiple(a) => a.selected_answers.clone(),
                UserAnswer::Single(_) => Default::default(),
            },
            correct_answers: q.correct_answers.clone(),
            is_correct,
            explanation: q.explanation.clone(),
            domain: q.domain.clone(),
        }),
    }
}
