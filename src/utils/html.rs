use ammonia;

use crate::models::{
    localized::LocalizedText,
    question::{Exam, Question},
};

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) stay, dangerous tags (like
/// <script>, <iframe>) and attributes (like onclick) are stripped. Text
/// without any markup is returned untouched so entities are not introduced
/// into plain exam text.
pub fn clean_html(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    ammonia::clean(input)
}

fn clean_text(text: &LocalizedText) -> LocalizedText {
    text.map(clean_html)
}

/// Sanitizes every display string of an uploaded exam.
pub fn sanitize_exam(mut exam: Exam) -> Exam {
    exam.title = clean_text(&exam.title);
    exam.description = clean_text(&exam.description);

    for question in &mut exam.questions {
        let (text, options, explanation, domain) = match question {
            Question::Single(q) => {
                (&mut q.question, &mut q.options, &mut q.explanation, &mut q.domain)
            }
            Question::Multiple(q) => {
                (&mut q.question, &mut q.options, &mut q.explanation, &mut q.domain)
            }
        };
        *text = clean_text(text);
        *explanation = clean_text(explanation);
        *domain = clean_text(domain);
        for option in options.iter_mut() {
            *option = clean_text(option);
        }
    }
    exam
}
