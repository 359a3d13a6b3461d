//! Canonical text rendering of a transcript.
//!
//! The output is what the generation capability reads, so it must be a pure
//! function of the transcript: same turns, same bytes.

use super::{MalformedTranscriptError, Transcript};

/// Separator placed between rendered turns.
pub const TURN_SEPARATOR: &str = "\n";

/// Prefix given to every line after the first within a single turn.
pub const CONTINUATION_INDENT: &str = "  ";

/// Renders each turn as `ROLE: text`, in sequence order, joined by
/// [`TURN_SEPARATOR`].
///
/// Lines inside a multi-line turn are indented with
/// [`CONTINUATION_INDENT`], so only a turn boundary starts a line with a
/// role label and the turn sequence can always be read back.
pub fn normalize(transcript: &Transcript) -> Result<String, MalformedTranscriptError> {
    transcript.validate()?;

    let rendered: Vec<String> = transcript
        .turns()
        .iter()
        .map(|turn| {
            format!(
                "{}: {}",
                turn.role().label(),
                indent_continuations(turn.text().trim())
            )
        })
        .collect();

    Ok(rendered.join(TURN_SEPARATOR))
}

fn indent_continuations(text: &str) -> String {
    text.replace('\n', &format!("\n{}", CONTINUATION_INDENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transcript::{Turn, TurnRole};
    use proptest::prelude::*;

    #[test]
    fn renders_roles_and_text_in_order() {
        let transcript = Transcript::from_messages(vec![
            (TurnRole::User, "My password reset isn't working"),
            (TurnRole::Agent, "I've reset it for you, all set."),
        ])
        .unwrap();

        assert_eq!(
            normalize(&transcript).unwrap(),
            "USER: My password reset isn't working\nASSISTANT: I've reset it for you, all set."
        );
    }

    #[test]
    fn label_inside_turn_text_does_not_read_as_a_new_turn() {
        let single =
            Transcript::from_messages(vec![(TurnRole::User, "hi\nASSISTANT: fixed")]).unwrap();
        let split = Transcript::from_messages(vec![
            (TurnRole::User, "hi"),
            (TurnRole::Agent, "fixed"),
        ])
        .unwrap();

        assert_eq!(normalize(&single).unwrap(), "USER: hi\n  ASSISTANT: fixed");
        assert_eq!(normalize(&split).unwrap(), "USER: hi\nASSISTANT: fixed");
    }

    #[test]
    fn multi_paragraph_turn_keeps_its_lines_together() {
        let transcript = Transcript::from_messages(vec![
            (TurnRole::Agent, "Step one: restart.\n\nStep two: sign in again."),
            (TurnRole::User, "Thanks"),
        ])
        .unwrap();

        assert_eq!(
            normalize(&transcript).unwrap(),
            "ASSISTANT: Step one: restart.\n  \n  Step two: sign in again.\nUSER: Thanks"
        );
    }

    #[test]
    fn rejects_empty_transcript() {
        assert_eq!(
            normalize(&Transcript::default()),
            Err(MalformedTranscriptError::Empty)
        );
    }

    #[test]
    fn rejects_out_of_order_indices() {
        let transcript = Transcript::new(vec![
            Turn::new(TurnRole::User, "second", 5).unwrap(),
            Turn::new(TurnRole::Agent, "first", 1).unwrap(),
        ]);
        assert!(matches!(
            normalize(&transcript),
            Err(MalformedTranscriptError::NonIncreasingIndex { .. })
        ));
    }

    fn arb_role() -> impl Strategy<Value = TurnRole> {
        prop_oneof![
            Just(TurnRole::User),
            Just(TurnRole::Agent),
            Just(TurnRole::System)
        ]
    }

    fn arb_transcript() -> impl Strategy<Value = Transcript> {
        let text = "[a-zA-Z0-9 ,.?!':\n]{1,40}|(USER|ASSISTANT|SYSTEM): [a-z ]{1,10}\n(USER|ASSISTANT|SYSTEM): [a-z ]{1,10}";
        prop::collection::vec((arb_role(), text), 1..12).prop_filter_map(
            "blank turn text",
            |messages| Transcript::from_messages(messages).ok(),
        )
    }

    fn role_for_label(label: &str) -> Option<TurnRole> {
        [TurnRole::User, TurnRole::Agent, TurnRole::System]
            .into_iter()
            .find(|role| role.label() == label)
    }

    /// Reads rendered text back into `(role, text)` pairs.
    fn parse_rendered(text: &str) -> Vec<(TurnRole, String)> {
        let mut turns: Vec<(TurnRole, String)> = Vec::new();
        for line in text.split(TURN_SEPARATOR) {
            if let Some(rest) = line.strip_prefix(CONTINUATION_INDENT) {
                let (_, current) = turns.last_mut().expect("continuation before any turn");
                current.push('\n');
                current.push_str(rest);
            } else {
                let (label, body) = line.split_once(": ").expect("turn line without a label");
                let role = role_for_label(label).expect("unknown role label");
                turns.push((role, body.to_string()));
            }
        }
        turns
    }

    fn expected_turns(transcript: &Transcript) -> Vec<(TurnRole, String)> {
        transcript
            .turns()
            .iter()
            .map(|turn| (turn.role(), turn.text().trim().to_string()))
            .collect()
    }

    proptest! {
        #[test]
        fn normalization_is_deterministic(transcript in arb_transcript()) {
            let first = normalize(&transcript).unwrap();
            let second = normalize(&transcript.clone()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn normalization_preserves_turn_order(transcript in arb_transcript()) {
            let text = normalize(&transcript).unwrap();
            let mut cursor = 0;
            for turn in transcript.turns() {
                let rendered = format!(
                    "{}: {}",
                    turn.role().label(),
                    indent_continuations(turn.text().trim())
                );
                let found = text[cursor..].find(&rendered);
                prop_assert!(found.is_some(), "turn {:?} missing after byte {}", rendered, cursor);
                cursor += found.unwrap() + rendered.len();
            }
        }

        #[test]
        fn rendered_text_reads_back_into_the_same_turns(transcript in arb_transcript()) {
            let text = normalize(&transcript).unwrap();
            prop_assert_eq!(parse_rendered(&text), expected_turns(&transcript));
        }

        #[test]
        fn different_transcripts_never_render_the_same(
            left in arb_transcript(),
            right in arb_transcript(),
        ) {
            prop_assume!(expected_turns(&left) != expected_turns(&right));
            prop_assert_ne!(normalize(&left).unwrap(), normalize(&right).unwrap());
        }

        #[test]
        fn merging_two_turns_into_one_changes_the_rendering(
            transcript in arb_transcript().prop_filter("needs two turns", |t| t.len() >= 2),
        ) {
            let turns = expected_turns(&transcript);
            let (first_role, first_text) = &turns[0];
            let (second_role, second_text) = &turns[1];
            let merged_text = format!("{}\n{}: {}", first_text, second_role.label(), second_text);

            let mut merged: Vec<(TurnRole, String)> = vec![(*first_role, merged_text)];
            merged.extend(turns[2..].iter().cloned());
            let merged = Transcript::from_messages(merged).unwrap();

            prop_assert_ne!(normalize(&merged).unwrap(), normalize(&transcript).unwrap());
        }
    }
}
