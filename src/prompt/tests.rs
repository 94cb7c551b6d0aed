use super::*;
use crate::chat::Role;
use crate::index::ProfessorMetadata;

fn professor(id: &str, subject: &str, stars: f64) -> RetrievedMatch {
    RetrievedMatch {
        id: id.to_string(),
        score: None,
        metadata: ProfessorMetadata {
            subject: Some(subject.to_string()),
            stars: Some(stars),
            review: None,
        },
    }
}

#[test]
fn composes_calculus_example() {
    let history = vec![Message::user("best calculus professor")];
    let matches = vec![professor("J.Smith", "Calculus", 4.8)];

    let composed = compose_messages(&history, &matches);

    assert_eq!(composed.len(), 2);
    assert_eq!(composed[0], Message::system(SYSTEM_PROMPT));
    assert_eq!(composed[1].role, Role::User);

    let content = &composed[1].content;
    assert!(content.starts_with("best calculus professor"));
    assert!(content.contains("J.Smith"));
    assert!(content.contains("Calculus"));
    assert!(content.contains("4.8"));
    assert!(content.contains(RESULTS_DELIMITER));
}

#[test]
fn keeps_earlier_history_unchanged() {
    let history = vec![
        Message::user("who teaches physics?"),
        Message::assistant("Dr. Brown teaches physics."),
        Message::user("any others?"),
    ];
    let matches = vec![professor("K.Lee", "Physics", 4.1)];

    let composed = compose_messages(&history, &matches);

    assert_eq!(composed.len(), 4);
    assert_eq!(composed[0].role, Role::System);
    assert_eq!(&composed[1..3], &history[..2]);
    assert_eq!(composed[3].role, Role::User);
    assert!(composed[3].content.starts_with("any others?"));

    let system_count = composed.iter().filter(|m| m.role == Role::System).count();
    assert_eq!(system_count, 1);
}

#[test]
fn last_turn_is_user_even_if_history_ended_elsewhere() {
    let history = vec![Message::assistant("How can I help?")];
    let composed = compose_messages(&history, &[]);

    assert_eq!(composed.len(), 2);
    assert_eq!(composed[1].role, Role::User);
    assert!(composed[1].content.starts_with("How can I help?"));
}

#[test]
fn zero_matches_still_render_a_block() {
    let rendered = render_matches(&[]);
    assert!(rendered.starts_with(RESULTS_DELIMITER));
    assert!(rendered.contains(NO_RESULTS));

    let composed = compose_messages(&[Message::user("quantum chromodynamics")], &[]);
    assert!(composed[1].content.ends_with(&format!("{}\n", NO_RESULTS)));
}

#[test]
fn renders_every_match_in_order() {
    let matches = vec![
        professor("A.First", "Biology", 4.9),
        professor("B.Second", "Chemistry", 4.2),
        professor("C.Third", "History", 3.7),
    ];

    let rendered = render_matches(&matches);

    assert_eq!(rendered.matches("Professor: ").count(), 3);
    assert_eq!(rendered.matches("Subject: ").count(), 3);
    assert_eq!(rendered.matches("Stars: ").count(), 3);
    assert!(!rendered.contains(NO_RESULTS));

    let first = rendered.find("A.First").expect("first present");
    let second = rendered.find("B.Second").expect("second present");
    let third = rendered.find("C.Third").expect("third present");
    assert!(first < second && second < third);
}

#[test]
fn renders_review_when_present() {
    let mut with_review = professor("J.Smith", "Calculus", 5.0);
    with_review.metadata.review = Some("Explains proofs patiently.".to_string());

    let rendered = render_matches(&[with_review]);
    assert!(rendered.contains("Stars: 5\n"));
    assert!(rendered.contains("Review: Explains proofs patiently."));
}

#[test]
fn omits_missing_metadata_fields() {
    let bare = RetrievedMatch {
        id: "X.Unknown".to_string(),
        score: Some(0.4),
        metadata: ProfessorMetadata::default(),
    };

    let rendered = render_matches(&[bare]);
    assert!(rendered.contains("Professor: X.Unknown"));
    assert!(!rendered.contains("Subject:"));
    assert!(!rendered.contains("Stars:"));
    assert!(!rendered.contains("Review:"));
}

#[test]
fn history_is_not_mutated() {
    let history = vec![Message::user("best calculus professor")];
    let snapshot = history.clone();
    let _ = compose_messages(&history, &[professor("J.Smith", "Calculus", 4.8)]);
    assert_eq!(history, snapshot);
}
