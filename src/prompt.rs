use colored::Colorize;
use dialoguer::Input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Decline,
    Abort,
}

pub fn parse_decision(answer: &str) -> Option<Decision> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Decision::Confirm),
        "n" | "no" | "s" | "skip" => Some(Decision::Decline),
        "q" | "quit" | "abort" => Some(Decision::Abort),
        _ => None,
    }
}

/// Keep asking until an answer parses.
pub fn read_decision<F, G>(mut next_answer: F, mut on_invalid: G) -> Decision
where
    F: FnMut() -> String,
    G: FnMut(&str),
{
    loop {
        let answer = next_answer();
        match parse_decision(&answer) {
            Some(decision) => return decision,
            None => on_invalid(&answer),
        }
    }
}

pub trait Prompter {
    fn decide(&mut self, question: &str) -> Decision;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn decide(&mut self, question: &str) -> Decision {
        read_decision(
            || {
                // A closed stdin ends the run rather than spinning.
                Input::<String>::new()
                    .with_prompt(format!("{question} [y=yes, n=skip, q=quit]"))
                    .interact_text()
                    .unwrap_or_else(|_| "q".to_string())
            },
            |answer| println!("{}", format!("'{answer}' is not one of y, n, q.").red()),
        )
    }
}


#[cfg(test)]
mod tests {
    use super::scripted::ScriptedPrompter;
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("y"), Some(Decision::Confirm));
        assert_eq!(parse_decision(" YES "), Some(Decision::Confirm));
        assert_eq!(parse_decision("n"), Some(Decision::Decline));
        assert_eq!(parse_decision("skip"), Some(Decision::Decline));
        assert_eq!(parse_decision("Q"), Some(Decision::Abort));
        assert_eq!(parse_decision(""), None);
        assert_eq!(parse_decision("maybe"), None);
    }

    #[test]
    fn test_invalid_answers_reprompt() {
        let mut prompter = ScriptedPrompter::new(&["x", "", "n"]);
        assert_eq!(prompter.decide("Merge?"), Decision::Decline);
        assert_eq!(prompter.rejected, 2);
        assert_eq!(prompter.questions, vec!["Merge?"]);
    }

    #[test]
    fn test_exhausted_script_aborts() {
        let mut prompter = ScriptedPrompter::new(&[]);
        assert_eq!(prompter.decide("Merge?"), Decision::Abort);
    }
}
