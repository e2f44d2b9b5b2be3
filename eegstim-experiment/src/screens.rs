//! Screen content for each presentation state.

use eegstim_core::{ConditionLabels, Line, TextStyle, Trial};

pub fn fixation() -> Vec<Line> {
    vec![Line::new("+", TextStyle::Fixation)]
}

pub fn welcome(total_trials: usize, active_secs: f64, labels: &ConditionLabels) -> Vec<Line> {
    vec![
        Line::new("Welcome", TextStyle::Prompt),
        Line::new(
            format!("You will complete {total_trials} trials of {active_secs} seconds each."),
            TextStyle::Instruction,
        ),
        Line::new(
            format!("{}: count backwards from the number shown.", capitalize(&labels.active)),
            TextStyle::Instruction,
        ),
        Line::new(
            format!("{}: close your eyes and relax.", capitalize(&labels.rest)),
            TextStyle::Instruction,
        ),
        Line::new("A fixation cross (+) appears between trials.", TextStyle::Instruction),
        Line::new("Press SPACE to begin, ESCAPE to quit.", TextStyle::Caption),
    ]
}

/// `progress` is the 1-based trial number and the total.
pub fn trial(trial: &Trial, progress: (usize, usize), countdown: Option<u64>) -> Vec<Line> {
    let mut lines = match trial.payload() {
        Some(payload) => vec![
            Line::new(
                format!("Count backwards in steps of {}, starting from", payload.decrement),
                TextStyle::Prompt,
            ),
            Line::new(payload.start.to_string(), TextStyle::Highlight),
        ],
        None => vec![Line::new("Close your eyes and relax", TextStyle::Prompt)],
    };
    if let Some(secs) = countdown {
        lines.push(Line::new(format!("{secs}s"), TextStyle::Caption));
    }
    lines.push(Line::new(
        format!("{} / {}", progress.0, progress.1),
        TextStyle::Caption,
    ));
    lines
}

pub fn complete() -> Vec<Line> {
    vec![
        Line::new("Session complete", TextStyle::Prompt),
        Line::new("Thank you for participating.", TextStyle::Instruction),
    ]
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
