//! Client selection for queued new contacts.
//!
//! [`InteractivePicker`] renders the record and the remote system's live
//! client list, then reads a client id from the operator. Entering `0`
//! declines the record, which puts its email on the exclusion list.
//! [`NonInteractivePicker`] skips every unmapped record so unattended runs
//! never block on a prompt.

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use dialoguer::Input;
use tracing::{debug, warn};

use contactsync_core::models::{Client, DirectoryRecord};
use contactsync_core::reconciler::{ClientPicker, Selection};

use crate::style;

/// Prompts the operator on the terminal.
pub struct InteractivePicker;

impl ClientPicker for InteractivePicker {
    fn pick(&mut self, record: &DirectoryRecord, clients: &[Client]) -> Selection {
        println!();
        println!(
            "{}",
            style::header(&format!("New contact: {}", record.display_name))
        );
        println!("  {}", style::dim(&format!("email:      {}", record.email)));
        if !record.department.is_empty() {
            println!(
                "  {}",
                style::dim(&format!("department: {}", record.department))
            );
        }
        println!(
            "  {}",
            style::dim(&format!("dn:         {}", record.distinguished_name))
        );
        println!();

        if clients.is_empty() {
            println!(
                "{}",
                style::warn("The remote system returned no clients; skipping this contact.")
            );
            return Selection::Skip;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Client id", "Name"]);
        for client in clients {
            table.add_row(vec![client.id.to_string(), client.name.clone()]);
        }
        println!("{table}");
        println!();

        let input = Input::<u64>::new()
            .with_prompt("Assign to client id (0 to decline and exclude)")
            .validate_with(|n: &u64| -> Result<(), String> {
                if *n == 0 || clients.iter().any(|c| c.id == *n) {
                    Ok(())
                } else {
                    Err(format!("{} is not a listed client id", n))
                }
            })
            .interact_text();

        match input {
            Ok(0) => Selection::Decline,
            Ok(id) => Selection::Client(id),
            Err(e) => {
                // Prompt unavailable (no TTY, stream closed). Skip rather
                // than decline: nothing should land on the exclusion list
                // without the operator saying so.
                warn!(error = %e, "prompt failed, skipping record");
                Selection::Skip
            }
        }
    }
}

/// Skips every unmapped record without consulting anyone.
pub struct NonInteractivePicker;

impl ClientPicker for NonInteractivePicker {
    fn pick(&mut self, record: &DirectoryRecord, _clients: &[Client]) -> Selection {
        debug!(
            email = %record.email,
            "non-interactive run, skipping unmapped record"
        );
        Selection::Skip
    }
}
