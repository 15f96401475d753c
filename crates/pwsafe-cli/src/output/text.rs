//! Table and key/value output.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use super::{format_time, EntryDetail, EntrySummary, PolicySummary, SafeInfo};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().copied());
    table
}

fn kv_table(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value.clone()]);
    }
    table
}

pub fn print_entry_list(entries: &[EntrySummary], quiet: bool) {
    if quiet {
        for entry in entries {
            println!("{}", entry.title);
        }
        return;
    }
    if entries.is_empty() {
        println!("No entries.");
        return;
    }
    let mut table = new_table(&["Group", "Title", "User"]);
    for entry in entries {
        table.add_row(vec![
            entry.group.as_str(),
            entry.title.as_str(),
            entry.user.as_str(),
        ]);
    }
    println!("{}", table);
}

pub fn print_entry(entry: &EntryDetail) {
    let mut rows = vec![
        ("Title", entry.title.clone()),
        ("Group", entry.group.clone()),
        ("User", entry.user.clone()),
    ];
    match &entry.password {
        Some(password) => rows.push(("Password", password.clone())),
        None => rows.push(("Password", "******** (use --reveal)".to_string())),
    }
    rows.extend([
        ("URL", entry.url.clone()),
        ("Email", entry.email.clone()),
        ("Notes", entry.notes.clone()),
        ("Created", format_time(entry.created)),
        ("Modified", format_time(entry.modified)),
        ("Password changed", format_time(entry.password_modified)),
        ("Password expires", format_time(entry.password_expires)),
        ("History", entry.history_count.to_string()),
        ("UUID", entry.uuid.clone()),
    ]);
    println!("{}", kv_table(&rows));
}

pub fn print_info(info: &SafeInfo) {
    let rows = vec![
        ("Path", info.path.clone()),
        ("Format", info.version.clone()),
        ("UUID", info.uuid.clone()),
        ("Name", info.name.clone()),
        ("Description", info.description.clone()),
        ("Iterations", info.iterations.to_string()),
        ("Entries", info.entries.to_string()),
        ("Last saved", format_time(info.last_save_time)),
        ("Saved by", info.last_save_application.clone()),
        ("Saved as", info.last_save_user.clone()),
        ("Saved on", info.last_save_host.clone()),
    ];
    println!("{}", kv_table(&rows));
}

pub fn print_policies(policies: &[PolicySummary], quiet: bool) {
    if quiet {
        for policy in policies {
            println!("{}", policy.name);
        }
        return;
    }
    if policies.is_empty() {
        println!("No named password policies.");
        return;
    }
    let mut table = new_table(&["Name", "Length", "Style", "Symbols"]);
    for policy in policies {
        table.add_row(vec![
            policy.name.clone(),
            policy.length.to_string(),
            policy.style.clone(),
            policy.symbols.clone(),
        ]);
    }
    println!("{}", table);
}
