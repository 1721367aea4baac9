//! Prompt text for the tuning conversation

use crate::params::{Configuration, render_line};

pub const SYSTEM_PROMPT: &str = "You are a Machine Learning expert.";

/// Label that precedes the JSON configuration in every reply
pub const CONFIG_MARKER: &str = "Config:";

/// Opening user message: what is tuned, where, with how many tries, and the reply shape.
pub fn initial_message(
    model_type: &str,
    search_space: &str,
    budget: usize,
    example: &Configuration,
) -> String {
    let mut prompt = format!(
        "You are helping tune hyperparameters for a {}. \
         This is our hyperparameter search space:\n",
        model_type
    );
    prompt.push_str(search_space);
    prompt.push_str(&format!(
        "\nWe have a budget to try {} configurations in total. \
         You will get the validation error rate (1 - accuracy) before you need to \
         specify the next configuration. The goal is to find the configuration that \
         minimizes the error rate with the given budget, so you should explore \
         different parts of the search space if the loss is not changing. ",
        budget
    ));
    prompt.push_str(&format!(
        "\nProvide a config in JSON format. Do not put new lines or any extra characters in the response.\n\
         Example config: {}.\n {}",
        render_line(example),
        CONFIG_MARKER
    ));
    prompt
}

/// Follow-up user message reporting the last observed loss.
pub fn transition_message(loss: f64, chain_of_thought: bool) -> String {
    if chain_of_thought {
        format!(
            "loss = {}. Write two lines as follows:\n\
             Analysis: Up to a few sentences describing what worked so far and what to choose next\n\
             {} (JSON config)",
            format_loss(loss),
            CONFIG_MARKER
        )
    } else {
        format!(
            "loss = {}. Specify the next config, do not add anything else in your response.\n{}",
            format_loss(loss),
            CONFIG_MARKER
        )
    }
}

/// Scientific notation with four decimals and a signed, zero-padded exponent: `1.2345e-01`.
pub fn format_loss(loss: f64) -> String {
    if loss.is_nan() {
        return "nan".to_string();
    }
    if loss.is_infinite() {
        let text = if loss > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    let rendered = format!("{:.4e}", loss);
    let Some((mantissa, exponent)) = rendered.split_once('e') else {
        return rendered;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.abs())
}
