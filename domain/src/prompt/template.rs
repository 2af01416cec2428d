//! Prompt templates for the discussion flow

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// User prompt for one discussion turn
    ///
    /// The speaker's behavioral prompt is supplied separately as the
    /// system message; this renders the shared context every speaker sees.
    pub fn turn_prompt(
        group_name: &str,
        task: &str,
        transcript: &[(String, String)],
        speaker_name: &str,
    ) -> String {
        let mut prompt = format!(
            r#"This is the internal discussion of {}.

Task: {}
"#,
            group_name, task
        );

        if transcript.is_empty() {
            prompt.push_str("\nThe discussion has not started yet. Open it with your view on the task.\n");
        } else {
            prompt.push_str("\nDiscussion so far:\n");
            for (speaker, text) in transcript {
                prompt.push_str(&format!("- {}: {}\n", speaker, text));
            }
        }

        prompt.push_str(&format!(
            r#"
You are {}. Give your next contribution to the discussion.
React to what was said before you; agree, disagree, or build on it.
Keep it to a few sentences and stay in character."#,
            speaker_name
        ));

        prompt
    }

    /// System prompt for the consensus judge
    pub fn judge_system() -> &'static str {
        r#"You are a consensus analyst. You will be shown the transcript of a
small-group discussion and must decide whether the group has reached a
final consensus. Answer with a single word on the first line: YES or NO.
You may add one sentence of reasoning on the next line."#
    }

    /// User prompt for a consensus check
    pub fn judge_prompt(task: &str, transcript: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"Your task is to judge whether this discussion group has reached a
final consensus. Be strict: has the discussion converged, with the most
recent contributions raising no new points, questions or objections that
would need further discussion?

If a conclusion has formed and nothing new is being raised, answer YES.
If the discussion is still diverging or someone raised a new idea or
concern, answer NO.

Task under discussion: {}

Transcript:
"#,
            task
        );

        for (speaker, text) in transcript {
            prompt.push_str(&format!("- {}: {}\n", speaker, text));
        }

        prompt
    }

    /// System prompt for the teacher commentary
    pub fn commentary_system() -> &'static str {
        r#"You are an experienced teacher who specializes in analyzing student
group discussions and giving qualitative feedback. Comment on how the
group approached the task, the quality of the exchange, and what the
discussion reveals about the participants' understanding."#
    }

    /// User prompt for the teacher commentary on one group
    pub fn commentary_prompt(
        group_name: &str,
        task: &str,
        transcript: &[(String, String)],
    ) -> String {
        let mut prompt = format!(
            r#"Review the discussion record of {} and give your commentary.

Task: {}

Record:
"#,
            group_name, task
        );

        for (speaker, text) in transcript {
            prompt.push_str(&format!("- {}: {}\n", speaker, text));
        }

        prompt.push_str("\nYour commentary:");
        prompt
    }

    /// System prompt for the final feasibility evaluation
    pub fn evaluation_system() -> &'static str {
        r#"You are an education program evaluator specializing in assessing the
effectiveness of teaching activities from classroom evidence."#
    }

    /// User prompt for the cross-group feasibility report
    ///
    /// `comments` pairs each group's display name with its teacher
    /// commentary, in group-creation order.
    pub fn evaluation_prompt(task: &str, comments: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"Based on the teacher's comments on each discussion group below,
evaluate the feasibility of the lesson plan "{}". Cover its strengths,
the challenges observed, and concrete suggestions for improvement.

Comments:
"#,
            task
        );

        for (group_name, comment) in comments {
            prompt.push_str(&format!("\n[Comment on {}]\n{}\n", group_name, comment));
        }

        prompt.push_str(
            r#"
Close your report with a single line of the form:

Verdict: feasible | needs revision | infeasible"#,
        );

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<(String, String)> {
        vec![
            ("Alice".to_string(), "I think we should start small.".to_string()),
            ("Bob".to_string(), "Agreed, with one caveat.".to_string()),
        ]
    }

    #[test]
    fn test_turn_prompt_contains_transcript_and_speaker() {
        let p = PromptTemplate::turn_prompt("Group1", "Plan a garden", &lines(), "Carol");
        assert!(p.contains("Group1"));
        assert!(p.contains("Plan a garden"));
        assert!(p.contains("- Alice: I think we should start small."));
        assert!(p.contains("You are Carol."));
    }

    #[test]
    fn test_turn_prompt_opening_turn() {
        let p = PromptTemplate::turn_prompt("Group1", "Plan a garden", &[], "Alice");
        assert!(p.contains("has not started yet"));
    }

    #[test]
    fn test_judge_prompt_mentions_yes_no_protocol() {
        let p = PromptTemplate::judge_prompt("Plan a garden", &lines());
        assert!(p.contains("answer YES"));
        assert!(p.contains("answer NO"));
        assert!(p.contains("- Bob: Agreed, with one caveat."));
    }

    #[test]
    fn test_evaluation_prompt_orders_comments() {
        let comments = vec![
            ("Group1".to_string(), "Strong reasoning.".to_string()),
            ("Group2".to_string(), "Somewhat off-task.".to_string()),
        ];
        let p = PromptTemplate::evaluation_prompt("Plan a garden", &comments);
        let a = p.find("[Comment on Group1]").unwrap();
        let b = p.find("[Comment on Group2]").unwrap();
        assert!(a < b);
        assert!(p.contains("Verdict:"));
    }
}
