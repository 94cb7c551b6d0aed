//! Prompt composition: the fixed system instruction plus retrieved professors
//! spliced onto the user's latest message.

#[cfg(test)]
mod tests;

use std::fmt::Write;

use crate::chat::Message;
use crate::index::RetrievedMatch;

pub const SYSTEM_PROMPT: &str = "\
You are a helpful and knowledgeable assistant for a professor rating service. \
Your task is to help students find the best professors for their queries. \
For every question, present the top 3 professors that match it, using the \
professor records appended to the student's message. Each record lists the \
professor's name, the subject they teach, their average star rating and, when \
available, a short review.

Be clear, concise and accurate. If the question is ambiguous or needs more \
detail, ask a clarifying question to narrow the search. Always aim for the most \
relevant results so students can make informed decisions about their courses.

Format the response as follows:

1. **Professor Name**: [Name]
   - **Subject**: [Subject]
   - **Rating**: [Average star rating out of 5]
   - **Review**: [A short summary of the professor's teaching style and strengths]

Repeat this format for each of the top 3 professors.

If the records do not contain a suitable match, tell the student that no \
suitable professors were found and suggest ways to refine the search.";

/// Separates the student's own text from the injected records
pub const RESULTS_DELIMITER: &str = "\n\nReturned results from vector db (done automatically):";

pub const NO_RESULTS: &str = "No relevant professors were found for this query.";

/// Render retrieved professors as text blocks, in the order given.
///
/// Metadata fields that are missing are left out of the block.
#[inline]
pub fn render_matches(matches: &[RetrievedMatch]) -> String {
    let mut rendered = String::from(RESULTS_DELIMITER);

    if matches.is_empty() {
        let _ = write!(rendered, "\n{}\n", NO_RESULTS);
        return rendered;
    }

    for professor in matches {
        let _ = write!(rendered, "\n\nProfessor: {}", professor.id);
        if let Some(subject) = &professor.metadata.subject {
            let _ = write!(rendered, "\nSubject: {}", subject);
        }
        if let Some(stars) = professor.metadata.stars {
            let _ = write!(rendered, "\nStars: {}", stars);
        }
        if let Some(review) = &professor.metadata.review {
            let _ = write!(rendered, "\nReview: {}", review);
        }
    }
    rendered.push('\n');

    rendered
}

/// Build the message sequence sent to the chat model.
///
/// Result is the system instruction, then every earlier message unchanged, then
/// the last message as a user turn with the rendered records appended. An empty
/// history yields only the system instruction and a user turn holding the records.
#[inline]
pub fn compose_messages(history: &[Message], matches: &[RetrievedMatch]) -> Vec<Message> {
    let (earlier, last_content) = match history.split_last() {
        Some((last, earlier)) => (earlier, last.content.as_str()),
        None => (history, ""),
    };

    let mut composed = Vec::with_capacity(earlier.len() + 2);
    composed.push(Message::system(SYSTEM_PROMPT));
    composed.extend_from_slice(earlier);
    composed.push(Message::user(format!(
        "{}{}",
        last_content,
        render_matches(matches)
    )));
    composed
}
