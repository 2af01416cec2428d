//! Console reporting for a running simulation

use colored::Colorize;
use seminar_application::{DiscussionObserver, SimulationReport};
use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, FinalEvaluation, GroupStatus, Message, TeacherComment,
};

/// Observer printing the discussion as it unfolds
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscussionObserver for ConsoleReporter {
    fn on_group_started(&self, group: &DiscussionGroup) {
        println!(
            "\n{} {} {}",
            "====".dimmed(),
            format!("{} discussion starting", group.name()).bold(),
            "====".dimmed()
        );
    }

    fn on_message(&self, _group: &DiscussionGroup, message: &Message) {
        println!("{:>14}: {}", message.speaker.to_string().cyan(), snippet(&message.text, 90));
    }

    fn on_consensus_check(&self, group: &DiscussionGroup, verdict: &ConsensusVerdict) {
        let outcome = if verdict.consensus {
            "consensus".green()
        } else {
            "no consensus".yellow()
        };
        println!(
            "{} {} @ message {}: {}",
            "[check]".dimmed(),
            group.name(),
            verdict.seq,
            outcome
        );
    }

    fn on_group_finished(&self, group: &DiscussionGroup) {
        let label = match group.status {
            GroupStatus::Consensus => "reached consensus".green(),
            GroupStatus::TimedOut => "timed out".yellow(),
            _ => group.status.to_string().normal(),
        };
        println!("{} {} {}", "----".dimmed(), group.name().bold(), label);
        if let Some(reason) = &group.status_reason {
            println!("       reason: {}", reason.dimmed());
        }
    }

    fn on_comment(&self, group: &DiscussionGroup, comment: &TeacherComment) {
        println!(
            "\n{}\n{}",
            format!("-- Teacher's comment on {} --", group.name()).bold(),
            comment.text
        );
    }

    fn on_evaluation(&self, evaluation: &FinalEvaluation) {
        println!(
            "\n{} {}",
            "====".dimmed(),
            "Lesson plan feasibility report".bold()
        );
        println!("{}", evaluation.summary);
    }
}

/// Final summary after the run completes
pub fn print_report(report: &SimulationReport) {
    println!("\n{}", "Run summary".bold());
    println!("Lesson plan: {} ({})", report.plan.title, report.plan.id);

    for outcome in &report.outcomes {
        println!(
            "  {}: {} after {} messages",
            outcome.group.name(),
            outcome.group.status,
            outcome.transcript.len()
        );
    }

    match &report.evaluation {
        Some(evaluation) => {
            println!(
                "Feasibility: {}",
                evaluation.feasibility.to_string().bold()
            );
        }
        None => {
            println!("Feasibility: already evaluated in a previous run");
        }
    }
}

/// One display line: newlines flattened, cut at `max` characters.
fn snippet(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}...", cut)
}
