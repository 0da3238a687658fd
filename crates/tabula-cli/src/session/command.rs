//! Script command parsing.

use std::str::FromStr;

use anyhow::{Context, bail};
use serde_json::{Map, Value};
use tabula_core::EntityId;
use tabula_core::permission::Role;

/// One line of a session script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Refresh,
    Page(u32),
    Jump(String),
    Next,
    Prev,
    Select(EntityId),
    Deselect(EntityId),
    SelectAll,
    SelectNone,
    Delete(Vec<EntityId>),
    DeleteSelected,
    Update { ids: Vec<EntityId>, changes: Value },
    Filter(String, String),
    Unfilter(String),
    SignIn(Role),
    SignOut,
}

impl Command {
    /// Parses a script line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        line.parse().map(Some)
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("list", []) => Self::List,
            ("refresh", []) => Self::Refresh,
            ("page", [page]) => Self::Page(page.parse().context("page must be a number")?),
            // The raw text is kept so the navigator can reject it.
            ("jump", [raw]) => Self::Jump((*raw).to_owned()),
            ("jump", []) => Self::Jump(String::new()),
            ("next", []) => Self::Next,
            ("prev", []) => Self::Prev,
            ("select", [id]) => Self::Select(EntityId::from(*id)),
            ("deselect", [id]) => Self::Deselect(EntityId::from(*id)),
            ("select-all", []) => Self::SelectAll,
            ("select-none", []) => Self::SelectNone,
            ("delete", ids) if !ids.is_empty() => Self::Delete(entity_ids(ids)),
            ("delete-selected", []) => Self::DeleteSelected,
            ("update", args) => parse_update(args)?,
            ("filter", [key, value]) => Self::Filter((*key).to_owned(), (*value).to_owned()),
            ("unfilter", [key]) => Self::Unfilter((*key).to_owned()),
            ("sign-in", [role]) => Self::SignIn(
                role.parse()
                    .with_context(|| format!("unknown role `{role}`"))?,
            ),
            ("sign-out", []) => Self::SignOut,
            _ => bail!("unrecognized command `{line}`"),
        };

        Ok(command)
    }
}

fn entity_ids(raw: &[&str]) -> Vec<EntityId> {
    raw.iter().copied().map(EntityId::from).collect()
}

/// Parses `ID... key=value...`. Values that are valid JSON keep their type;
/// anything else is a string.
fn parse_update(args: &[&str]) -> anyhow::Result<Command> {
    let (assignments, ids): (Vec<&str>, Vec<&str>) =
        args.iter().copied().partition(|arg| arg.contains('='));

    if ids.is_empty() || assignments.is_empty() {
        bail!("usage: update ID... key=value...");
    }

    let mut changes = Map::new();
    for assignment in assignments {
        let (key, raw) = assignment.split_once('=').unwrap_or((assignment, ""));
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        changes.insert(key.to_owned(), value);
    }

    Ok(Command::Update {
        ids: entity_ids(&ids),
        changes: Value::Object(changes),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(Command::parse_line("   ").unwrap(), None);
        assert_eq!(Command::parse_line("# warm up").unwrap(), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse_line("list").unwrap(), Some(Command::List));
        assert_eq!(Command::parse_line(" page 3 ").unwrap(), Some(Command::Page(3)));
        assert_eq!(
            Command::parse_line("jump abc").unwrap(),
            Some(Command::Jump("abc".to_owned()))
        );
        assert_eq!(
            Command::parse_line("sign-in super_admin").unwrap(),
            Some(Command::SignIn(Role::SuperAdmin))
        );
    }

    #[test]
    fn test_update_splits_ids_and_changes() {
        let command: Command = "update sn-0001 sn-0002 status=reserved vlan=120"
            .parse()
            .unwrap();

        assert_eq!(
            command,
            Command::Update {
                ids: vec!["sn-0001".into(), "sn-0002".into()],
                changes: json!({"status": "reserved", "vlan": 120}),
            }
        );
    }

    #[test]
    fn test_malformed_commands_are_rejected() {
        assert!("page two".parse::<Command>().is_err());
        assert!("delete".parse::<Command>().is_err());
        assert!("update sn-0001".parse::<Command>().is_err());
        assert!("sign-in janitor".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
    }
}
