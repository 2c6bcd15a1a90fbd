use cityweather_core::Insights;

/// Render the summary and every non-empty advisory as plain text blocks.
pub fn render(insights: &Insights) -> String {
    let mut out = String::new();

    if let Some(notice) = &insights.notice {
        out.push_str(&format!("Note: {notice}\n\n"));
    }

    out.push_str("Condition summary:\n");
    out.push_str(if insights.summary.is_empty() { "(none)" } else { &insights.summary });
    out.push('\n');

    for advisory in insights.advisories.iter().filter(|a| !a.body.trim().is_empty()) {
        out.push_str(&format!("\n{}:\n{}\n", advisory.title, advisory.body));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityweather_core::Advisory;

    fn insights(advisories: Vec<Advisory>, notice: Option<&str>) -> Insights {
        Insights {
            summary: "Mild.".into(),
            advisories,
            raw: None,
            sample: notice.is_some(),
            notice: notice.map(str::to_string),
        }
    }

    #[test]
    fn sections_follow_advisory_order() {
        let text = render(&insights(
            vec![
                Advisory { title: "Advisory for running".into(), body: "A:\n- go".into() },
                Advisory { title: "Advisory for sailing".into(), body: String::new() },
                Advisory { title: "Advisory for hiking".into(), body: "A:\n- boots".into() },
            ],
            None,
        ));

        assert_eq!(
            text,
            "Condition summary:\nMild.\n\n\
             Advisory for running:\nA:\n- go\n\n\
             Advisory for hiking:\nA:\n- boots\n"
        );
    }

    #[test]
    fn notice_comes_first() {
        let text = render(&insights(vec![], Some("No AI provider available.")));
        assert!(text.starts_with("Note: No AI provider available.\n\nCondition summary:"));
    }
}
