use crate::taxonomy::{category_rules, ErrorCategory};

pub(crate) fn combined_text(description: &str, log_text: &str) -> String {
    format!("{} {}", description, log_text).to_lowercase()
}

pub fn category_scores(description: &str, log_text: &str) -> Vec<(ErrorCategory, usize)> {
    let text = combined_text(description, log_text);

    category_rules()
        .iter()
        .map(|set| {
            let score = set
                .rules
                .iter()
                .map(|rule| rule.regex.find_iter(&text).count())
                .sum();
            (set.target, score)
        })
        .collect()
}

// Strict maximum; ties go to the category listed first.
pub fn classify(description: &str, log_text: &str) -> ErrorCategory {
    let mut best = (ErrorCategory::Application, 0);

    for (category, score) in category_scores(description, log_text) {
        if score > best.1 {
            best = (category, score);
        }
    }

    best.0
}
