//! Lesson plan selection

use anyhow::{bail, Context, Result};
use seminar_domain::LessonPlan;
use std::io::Write;

pub fn print_plans(plans: &[LessonPlan]) {
    println!("Available lesson plans:");
    for (i, plan) in plans.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, plan.title, plan.id);
    }
}

/// Resolve `arg` (plan id or 1-based index) against the loaded plans, or
/// fall back to an interactive numbered menu on stdin.
pub fn select_plan<'a>(plans: &'a [LessonPlan], arg: Option<&str>) -> Result<&'a LessonPlan> {
    if let Some(arg) = arg {
        if let Some(plan) = plans.iter().find(|p| p.id.as_str() == arg) {
            return Ok(plan);
        }
        if let Ok(index) = arg.parse::<usize>() {
            if index >= 1 && index <= plans.len() {
                return Ok(&plans[index - 1]);
            }
        }
        bail!(
            "no lesson plan matches '{}'; use --list-plans to see what is available",
            arg
        );
    }

    print_plans(plans);
    print!("Select a lesson plan number: ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading selection")?;
    let index: usize = line.trim().parse().context("selection is not a number")?;
    if index < 1 || index > plans.len() {
        bail!("selection {} is out of range", index);
    }
    Ok(&plans[index - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans() -> Vec<LessonPlan> {
        vec![
            LessonPlan::new("lp-a", "Fractions", "Split a pizza."),
            LessonPlan::new("lp-b", "Photosynthesis", "How do plants eat?"),
        ]
    }

    #[test]
    fn test_select_by_id() {
        let plans = plans();
        let plan = select_plan(&plans, Some("lp-b")).unwrap();
        assert_eq!(plan.title, "Photosynthesis");
    }

    #[test]
    fn test_select_by_index() {
        let plans = plans();
        let plan = select_plan(&plans, Some("1")).unwrap();
        assert_eq!(plan.title, "Fractions");
    }

    #[test]
    fn test_unknown_selection_fails() {
        let plans = plans();
        assert!(select_plan(&plans, Some("lp-z")).is_err());
        assert!(select_plan(&plans, Some("7")).is_err());
    }
}
