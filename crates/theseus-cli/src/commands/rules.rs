use theseus_rollout::detect_step;
use theseus_rules::{RouteRule, RuleSet};

fn summary(rule: &RouteRule) -> String {
    let mut line = format!(
        "{} (destination: {}, precedence: {})",
        rule.name(),
        rule.destination(),
        rule.precedence()
    );
    if let Some(m) = rule.header_match() {
        let pattern = m
            .condition
            .regex
            .as_deref()
            .or(m.condition.exact.as_deref())
            .or(m.condition.prefix.as_deref())
            .unwrap_or("");
        line.push_str(&format!(" [match {}: {}]", m.header, pattern));
    }
    line
}

/// Report the active rule, or the full ranking with `ranked`.
pub fn active(text: &str, ranked: bool, format: &str) -> anyhow::Result<String> {
    let set = RuleSet::from_yaml(text)?;

    if ranked {
        let ranking = set.ranked()?;
        return match format {
            "json" => Ok(serde_json::to_string_pretty(&ranking)?),
            _ => Ok(ranking
                .iter()
                .enumerate()
                .map(|(i, rule)| format!("{}. {}", i + 1, summary(rule)))
                .collect::<Vec<_>>()
                .join("\n")),
        };
    }

    let rule = set.active()?;
    match format {
        "json" => Ok(serde_json::to_string_pretty(rule)?),
        _ => Ok(summary(rule)),
    }
}

/// Report the rollout step the active rule corresponds to.
pub fn step(text: &str, tag_name: &str, tag: &str, format: &str) -> anyhow::Result<String> {
    let set = RuleSet::from_yaml(text)?;
    let step = detect_step(&set, tag_name, tag)?;
    let active = set.active()?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "rule": active.name(),
            "tag": format!("{tag_name}={tag}"),
            "step": step,
        }))?),
        _ => Ok(format!("{}: {tag_name}={tag} via {}", step.label(), summary(active))),
    }
}
