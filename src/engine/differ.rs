//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{AttributeChange, ChangeAction, Plan, ResourceDiff, Value};

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes. Remote objects match the configuration.", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");
    for diff in plan.changes() {
        for line in render_diff(diff) {
            println!("│ {line}");
        }
        println!("│");
    }
    println!("├─────────────────────────────────────────────────────┤");
    println!("│ Plan: {}", plan.summary().to_string().bold());
    println!("└─────────────────────────────────────────────────────┘");
}

fn symbol(action: ChangeAction) -> ColoredString {
    match action {
        ChangeAction::Create => "+".green(),
        ChangeAction::Update => "~".yellow(),
        ChangeAction::Replace => "-/+".red(),
        ChangeAction::Delete => "-".red(),
        ChangeAction::NoOp => " ".normal(),
    }
}

fn headline(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Create => "will be created",
        ChangeAction::Update => "will be updated in-place",
        ChangeAction::Replace => "must be replaced",
        ChangeAction::Delete => "will be destroyed",
        ChangeAction::NoOp => "is unchanged",
    }
}

/// Lines for one resource: a headline, then one line per attribute.
pub fn render_diff(diff: &ResourceDiff) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}",
        symbol(diff.action),
        diff.address.to_string().bold(),
        headline(diff.action).dimmed()
    )];
    let width = diff.changes.iter().map(|c| c.name.len()).max().unwrap_or(0);
    lines.extend(
        diff.changes
            .iter()
            .map(|change| format!("    {}", render_change(diff.action, change, width))),
    );
    lines
}

fn shown(value: Option<&Value>, sensitive: bool) -> String {
    match value {
        Some(_) if sensitive => "(sensitive)".to_string(),
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

fn render_change(action: ChangeAction, change: &AttributeChange, width: usize) -> String {
    let name = format!("{:<width$}", change.name);
    let new = if change.unknown {
        "(known after apply)".dimmed().to_string()
    } else {
        shown(change.new.as_ref(), change.sensitive)
    };

    let line = match action {
        ChangeAction::Create => format!("{} {name} = {new}", "+".green()),
        ChangeAction::Delete => format!(
            "{} {name} = {}",
            "-".red(),
            shown(change.old.as_ref(), change.sensitive)
        ),
        _ if change.old.is_none() => format!("{} {name} = {new}", "+".green()),
        _ if change.new.is_none() && !change.unknown => format!(
            "{} {name} = {}",
            "-".red(),
            shown(change.old.as_ref(), change.sensitive)
        ),
        _ => format!(
            "{} {name} = {} → {new}",
            "~".yellow(),
            shown(change.old.as_ref(), change.sensitive)
        ),
    };

    if change.forces_replacement && action == ChangeAction::Replace {
        format!("{line} {}", "# forces replacement".red())
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Address;

    fn change(name: &str, old: Option<Value>, new: Option<Value>) -> AttributeChange {
        AttributeChange {
            name: name.into(),
            old,
            new,
            unknown: false,
            forces_replacement: false,
            sensitive: false,
        }
    }

    fn diff(action: ChangeAction, changes: Vec<AttributeChange>) -> ResourceDiff {
        ResourceDiff {
            address: Address::new("vault_github_team", "dev"),
            action,
            changes,
        }
    }

    #[test]
    fn test_render_create_with_unknown() {
        colored::control::set_override(false);
        let mut backend = change("backend", None, None);
        backend.unknown = true;
        let lines = render_diff(&diff(
            ChangeAction::Create,
            vec![backend, change("team", None, Some("dev".into()))],
        ));

        assert_eq!(lines[0], "+ vault_github_team.dev will be created");
        assert_eq!(lines[1], "    + backend = (known after apply)");
        assert_eq!(lines[2], "    + team    = \"dev\"");
    }

    #[test]
    fn test_render_update_and_removal() {
        colored::control::set_override(false);
        let lines = render_diff(&diff(
            ChangeAction::Update,
            vec![
                change(
                    "policies",
                    Some(Value::from(vec!["a"])),
                    Some(Value::from(vec!["a", "b"])),
                ),
                change("description", Some("old".into()), None),
            ],
        ));
        assert_eq!(lines[1], "    ~ policies    = [\"a\"] → [\"a\", \"b\"]");
        assert_eq!(lines[2], "    - description = \"old\"");
    }

    #[test]
    fn test_render_replace_marks_forcing_field() {
        colored::control::set_override(false);
        let mut team = change("team", Some("dev".into()), Some("ops".into()));
        team.forces_replacement = true;
        let lines = render_diff(&diff(ChangeAction::Replace, vec![team]));
        assert_eq!(lines[0], "-/+ vault_github_team.dev must be replaced");
        assert_eq!(lines[1], "    ~ team = \"dev\" → \"ops\" # forces replacement");
    }

    #[test]
    fn test_render_hides_sensitive_values() {
        colored::control::set_override(false);
        let mut token = change("token", Some("old".into()), Some("new".into()));
        token.sensitive = true;
        let lines = render_diff(&diff(ChangeAction::Update, vec![token]));
        assert_eq!(lines[1], "    ~ token = (sensitive) → (sensitive)");
    }
}
