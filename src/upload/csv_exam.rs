// src/upload/csv_exam.rs

//! Converts the admin CSV format into an exam.
//!
//! Columns (case-insensitive): `type`, `question`, `optiona`..`optiond`,
//! `correctanswer`, `correctanswers`, `minselections`, `maxselections`,
//! `explanation`, `domain`. Any text column may instead come as an
//! `_en`/`_ar` pair, e.g. `question_en` and `question_ar`.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::{
    error::ValidationError,
    exam::normalize::normalize_question,
    models::{
        localized::LocalizedText,
        question::{Exam, Question, QuestionKind, RawQuestion},
    },
};

/// Minutes given to every CSV-uploaded exam.
pub const DEFAULT_DURATION: u32 = 230;

static ANSWER_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;|]+").expect("valid regex"));

type Row = HashMap<String, String>;

/// Parses CSV text into rows keyed by lower-cased header.
pub fn parse_csv(content: &str) -> Result<Vec<Row>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn field<'a>(row: &'a Row, name: &str) -> Option<&'a str> {
    row.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Reads `<name>_en`/`<name>_ar` when present, else `<name>`, else `fallback`.
fn text(row: &Row, name: &str, fallback: &str) -> LocalizedText {
    match field(row, &format!("{}_en", name)) {
        Some(en) => LocalizedText::bilingual(en, field(row, &format!("{}_ar", name))),
        None => LocalizedText::bilingual(field(row, name).unwrap_or(fallback), None),
    }
}

fn letter_index(letter: &str) -> Option<i64> {
    match letter.trim().to_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

fn letter_list(value: Option<&str>) -> Vec<i64> {
    value
        .map(|v| {
            ANSWER_SEPARATOR
                .split(v.trim())
                .filter_map(letter_index)
                .collect()
        })
        .unwrap_or_default()
}

fn has_question_text(row: &Row) -> bool {
    field(row, "question").is_some() || field(row, "question_en").is_some()
}

/// Maps one row to a question, or `None` when the row cannot form one.
pub fn row_to_question(row: &Row, id: i64) -> Option<Question> {
    let kind = match field(row, "type").map(str::to_lowercase).as_deref() {
        None | Some("single") => QuestionKind::Single,
        Some("multiple") => QuestionKind::Multiple,
        Some(other) => {
            tracing::warn!("Question {}: unknown type '{}', skipping", id, other);
            return None;
        }
    };

    let mut raw = RawQuestion {
        id,
        kind: Some(kind),
        question: text(row, "question", ""),
        options: ["a", "b", "c", "d"]
            .iter()
            .map(|letter| {
                text(
                    row,
                    &format!("option{}", letter),
                    &format!("Option {}", letter.to_uppercase()),
                )
            })
            .collect(),
        correct_answer: None,
        correct_answers: None,
        min_selections: None,
        max_selections: None,
        explanation: text(row, "explanation", "See explanation"),
        domain: text(row, "domain", "General"),
    };

    match kind {
        QuestionKind::Single => {
            let answer = field(row, "correctanswer").and_then(letter_index);
            raw.correct_answer = Some(answer.unwrap_or_else(|| {
                tracing::warn!("Question {}: Invalid single answer, defaulting to A", id);
                0
            }));
        }
        QuestionKind::Multiple => {
            let answers = letter_list(field(row, "correctanswers"));
            if answers.len() < 2 {
                tracing::warn!("Question {}: Multiple-answer needs at least 2 answers", id);
                return None;
            }
            raw.correct_answers = Some(answers);
            raw.min_selections = Some(limit(row, "minselections", 2));
            raw.max_selections = Some(limit(row, "maxselections", 4));
        }
    }

    match normalize_question(raw) {
        Ok(question) => Some(question),
        Err(e) => {
            tracing::warn!("Skipping CSV row: {}", e);
            None
        }
    }
}

fn limit(row: &Row, name: &str, default: i64) -> i64 {
    field(row, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Builds an exam from parsed rows. Rows without question text are ignored;
/// question ids are 1-based row positions.
pub fn csv_to_exam(
    rows: &[Row],
    exam_id: String,
    title: &str,
    description: Option<&str>,
) -> Result<Exam, ValidationError> {
    let questions: Vec<Question> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| has_question_text(row))
        .filter_map(|(i, row)| row_to_question(row, i as i64 + 1))
        .collect();

    let description = match description.filter(|d| !d.trim().is_empty()) {
        Some(d) => d.to_string(),
        None => format!("Exam with {} questions", questions.len()),
    };

    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle(exam_id));
    }

    Ok(Exam {
        id: exam_id,
        title: LocalizedText::bilingual(title, None),
        description: LocalizedText::bilingual(description, None),
        duration: DEFAULT_DURATION,
        questions,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::localized::Locale;

    const SAMPLE: &str = "\
Type,Question,OptionA,OptionB,OptionC,OptionD,CorrectAnswer,CorrectAnswers,Explanation,Domain
single,\"Who approves the charter, usually?\",PM,Sponsor,Team,PMO,B,,Sponsor signs,People
multiple,Pick two,One,Two,Three,Four,,A; C,First and third,Process
single,Bad answer,W,X,Y,Z,Q,,,
multiple,Only one,W,X,Y,Z,,B,,
,,,,,,,,,
";

    #[test]
    fn parses_quoted_fields_and_lowercases_headers() {
        let rows = parse_csv(SAMPLE).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["question"], "Who approves the charter, usually?");
        assert_eq!(rows[1]["correctanswers"], "A; C");
    }

    #[test]
    fn converts_rows_to_questions() {
        let rows = parse_csv(SAMPLE).unwrap();
        let exam = csv_to_exam(&rows, "exam-1".into(), "Uploaded Exam", None).unwrap();

        assert_eq!(exam.duration, DEFAULT_DURATION);
        assert_eq!(exam.questions.len(), 3);
        assert_eq!(exam.description.resolve(Locale::En), "Exam with 3 questions");

        match &exam.questions[0] {
            Question::Single(q) => {
                assert_eq!(q.id, 1);
                assert_eq!(q.correct_answer, 1);
                assert_eq!(q.domain.resolve(Locale::En), "People");
                assert_eq!(q.question.resolve(Locale::Ar), "[AR] Who approves the charter, usually?");
            }
            other => panic!("expected single, got {:?}", other),
        }
        match &exam.questions[1] {
            Question::Multiple(q) => {
                assert_eq!(q.correct_answers, BTreeSet::from([0, 2]));
                assert_eq!(q.min_selections, Some(2));
                assert_eq!(q.max_selections, Some(4));
            }
            other => panic!("expected multiple, got {:?}", other),
        }
        match &exam.questions[2] {
            Question::Single(q) => {
                assert_eq!(q.id, 3);
                assert_eq!(q.correct_answer, 0);
                assert_eq!(q.domain.resolve(Locale::En), "General");
                assert_eq!(q.explanation.resolve(Locale::En), "See explanation");
            }
            other => panic!("expected single, got {:?}", other),
        }
    }

    #[test]
    fn reads_bilingual_columns() {
        let csv = "question_en,question_ar,optiona,optionb,optionc,optiond,correctanswer,domain_en,domain_ar\n\
                   Hello,مرحبا,A,B,C,D,d,People,الناس\n";
        let rows = parse_csv(csv).unwrap();
        let question = row_to_question(&rows[0], 1).unwrap();

        let Question::Single(q) = question else {
            panic!("expected single question");
        };
        assert_eq!(q.question.resolve(Locale::Ar), "مرحبا");
        assert_eq!(q.domain.resolve(Locale::Ar), "الناس");
        assert_eq!(q.correct_answer, 3);
    }

    #[test]
    fn missing_options_get_placeholders() {
        let csv = "question,optiona,optionb,correctanswer\nShort,Yes,No,A\n";
        let rows = parse_csv(csv).unwrap();
        let question = row_to_question(&rows[0], 1).unwrap();
        assert_eq!(question.options()[3].resolve(Locale::En), "Option D");
    }

    #[test]
    fn answer_lists_accept_mixed_separators() {
        assert_eq!(letter_list(Some("a, b|D ;c")), vec![0, 1, 3, 2]);
        assert_eq!(letter_list(Some("x y")), Vec::<i64>::new());
        assert!(letter_list(None).is_empty());
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(csv_to_exam(&[], "exam-2".into(), "  ", None).is_err());
    }
}
