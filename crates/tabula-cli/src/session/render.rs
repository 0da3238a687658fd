//! Plain-text rendering of a listing screen.

use tabula_client::{ControllerPhase, ControllerSnapshot, Tristate};
use tabula_core::Result;
use tabula_test::Subnet;

/// Prints the screen to standard output.
pub fn print(snapshot: &ControllerSnapshot<Subnet>, url: &str) {
    println!("{}", render(snapshot, url));
}

/// Prints a refused mutation, which the notifier does not report.
pub fn print_refusal<T>(result: &Result<T>) {
    if let Some(line) = refusal(result) {
        println!("{line}");
    }
}

fn refusal<T>(result: &Result<T>) -> Option<String> {
    match result {
        Err(error) if error.is_authorization_denied() => {
            Some(format!("! {}", error.user_message()))
        }
        _ => None,
    }
}

fn render(snapshot: &ControllerSnapshot<Subnet>, url: &str) -> String {
    let mut out = format!("── {url}\n");

    match snapshot.phase {
        ControllerPhase::Idle | ControllerPhase::Loading => {
            out.push_str("   loading…\n");
            return out;
        }
        ControllerPhase::Denied => {
            out.push_str("   You do not have permission to view these records.\n");
            return out;
        }
        ControllerPhase::Failed => {
            let message = snapshot
                .error
                .as_ref()
                .map(|e| e.user_message())
                .unwrap_or_default();
            out.push_str(&format!("   failed: {message}\n"));
            return out;
        }
        ControllerPhase::Ready => {}
    }

    if snapshot.is_empty() {
        out.push_str("   no records\n");
    }

    let header = match snapshot.selection.header {
        Tristate::Checked => "[x]",
        Tristate::Unchecked => "[ ]",
        Tristate::Indeterminate => "[-]",
    };
    if snapshot.show_batch_delete() {
        out.push_str(&format!(
            "   {header} {} selected\n",
            snapshot.selection.count
        ));
    }

    for subnet in &snapshot.result.data {
        let mark = match (
            snapshot.show_batch_delete(),
            snapshot.selected_ids.contains(&subnet.id),
        ) {
            (false, _) => "",
            (true, true) => "[x] ",
            (true, false) => "[ ] ",
        };
        out.push_str(&format!(
            "   {mark}{:<8} {:<16} {:<5} vlan {:<4} {}\n",
            subnet.id, subnet.cidr, subnet.site, subnet.vlan, subnet.status
        ));
    }

    let result = &snapshot.result;
    out.push_str(&format!(
        "   page {} of {} · {} records · jump [{}]{}\n",
        snapshot.current_page,
        result.total_pages.max(1),
        result.total_count,
        snapshot.jump_input,
        if snapshot.show_create() { " · + new" } else { "" },
    ));

    out
}

#[cfg(test)]
mod tests {
    use tabula_client::SelectionSummary;
    use tabula_core::PaginatedResult;
    use tabula_core::permission::Capabilities;
    use tabula_test::subnets;

    use super::*;

    fn snapshot(phase: ControllerPhase, capabilities: Capabilities) -> ControllerSnapshot<Subnet> {
        ControllerSnapshot {
            phase,
            result: PaginatedResult {
                data: subnets(2),
                total_count: 12,
                current_page: 2,
                total_pages: 2,
                page_size: 10,
            },
            error: None,
            selection: SelectionSummary {
                count: 1,
                header: Tristate::Indeterminate,
            },
            selected_ids: vec!["sn-0001".into()],
            capabilities,
            current_page: 2,
            jump_input: "2".to_owned(),
        }
    }

    #[test]
    fn test_refused_mutation_is_reported() {
        let denied: Result<()> = Err(tabula_core::Error::authorization_denied()
            .with_message("You do not have permission to delete subnet."));
        assert_eq!(
            refusal(&denied).as_deref(),
            Some("! You do not have permission to delete subnet.")
        );

        let failed: Result<()> = Err(tabula_core::Error::remote_failure());
        assert_eq!(refusal(&failed), None);
        assert_eq!(refusal(&Ok(())), None);
    }

    #[test]
    fn test_ready_page_with_delete() {
        let capabilities = Capabilities {
            can_view: true,
            can_create: false,
            can_edit: false,
            can_delete: true,
        };
        let text = render(&snapshot(ControllerPhase::Ready, capabilities), "https://a/s?page=2");

        assert!(text.contains("[-] 1 selected"));
        assert!(text.contains("[x] sn-0001"));
        assert!(text.contains("[ ] sn-0000"));
        assert!(text.contains("page 2 of 2 · 12 records · jump [2]"));
        assert!(!text.contains("+ new"));
    }

    #[test]
    fn test_read_only_page_has_no_checkboxes() {
        let capabilities = Capabilities {
            can_view: true,
            ..Capabilities::none()
        };
        let text = render(&snapshot(ControllerPhase::Ready, capabilities), "https://a/s");

        assert!(!text.contains("selected"));
        assert!(text.contains("   sn-0000"));
    }

    #[test]
    fn test_denied_hides_records() {
        let text = render(
            &snapshot(ControllerPhase::Denied, Capabilities::none()),
            "https://a/s",
        );

        assert!(text.contains("You do not have permission"));
        assert!(!text.contains("sn-0000"));
    }
}
