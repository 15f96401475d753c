//! Entry commands: list, show, add, remove, autotype.

use pwsafe_core::{AutotypeTokenKind, Document, Entry, EntryMut, GroupPath, RecordType};

use crate::app::AppContext;
use crate::cli::{AddArgs, EntryRef, ListArgs, ShowArgs};
use crate::errors::{classify, CliError};
use crate::helpers::prompt_secret;
use crate::output::{print_entry, print_entry_list, print_json, EntryDetail, EntrySummary};

fn not_found(entry: &EntryRef) -> anyhow::Error {
    let label = match &entry.group {
        Some(group) => format!("{} in group {}", entry.title, group),
        None => entry.title.clone(),
    };
    CliError::not_found(format!("No entry '{}'", label), "Run: pwsafe list").into()
}

fn find_entry<'d>(document: &'d mut Document, entry: &EntryRef) -> anyhow::Result<EntryMut<'d>> {
    let entries = document.entries_mut();
    let found = match &entry.group {
        Some(group) => entries.find_in_group_mut(&GroupPath::from(group.as_str()), &entry.title),
        None => entries.find_mut(&entry.title),
    };
    found.ok_or_else(|| not_found(entry))
}

/// True when `group` is `filter` or sits below it.
fn in_group(group: &GroupPath, filter: &GroupPath) -> bool {
    let group = group.as_str().to_lowercase();
    let filter = filter.as_str().to_lowercase();
    group == filter || group.starts_with(&format!("{}.", filter))
}

fn summarize(entry: &Entry) -> anyhow::Result<EntrySummary> {
    // Listing reads records directly so it does not count as an access.
    let user = match entry.records().find(RecordType::UserName) {
        Some(record) => record.text().map_err(classify)?,
        None => String::new(),
    };
    Ok(EntrySummary {
        group: entry.group().map_err(classify)?.to_string(),
        title: entry.title().map_err(classify)?,
        user,
    })
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let (document, _) = ctx.open_document()?;
    let filter = args.group.as_deref().map(GroupPath::from);

    let mut rows = Vec::new();
    for entry in document.entries() {
        if let Some(filter) = &filter {
            if !in_group(&entry.group().map_err(classify)?, filter) {
                continue;
            }
        }
        rows.push(summarize(entry)?);
    }
    rows.sort_by_cached_key(|row| (row.group.to_lowercase(), row.title.to_lowercase()));

    if args.json {
        print_json(&rows)
    } else {
        print_entry_list(&rows, ctx.quiet());
        Ok(())
    }
}

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let (mut document, path) = ctx.open_document()?;
    let mut entry = find_entry(&mut document, &args.entry)?;
    let password = if args.reveal {
        Some(entry.password().map_err(classify)?.to_string())
    } else {
        None
    };
    let detail = EntryDetail {
        uuid: entry.uuid().map_err(classify)?.to_string(),
        group: entry.group().map_err(classify)?.to_string(),
        title: entry.title().map_err(classify)?,
        user: entry.user_name().map_err(classify)?,
        password,
        url: entry.url().map_err(classify)?,
        email: entry.email().map_err(classify)?,
        notes: entry.notes().map_err(classify)?,
        created: entry.creation_time().map_err(classify)?,
        modified: entry.last_modification_time().map_err(classify)?,
        password_modified: entry.password_modification_time().map_err(classify)?,
        password_expires: entry.password_expiry_time().map_err(classify)?,
        history_count: entry.password_history().len(),
    };

    if args.json {
        print_json(&detail)?;
    } else {
        print_entry(&detail);
    }
    // Access tracking may have stamped the entry.
    ctx.save_document(&mut document, &path)
}

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let (mut document, path) = ctx.open_document()?;
    let group = GroupPath::from(args.entry.group.as_deref().unwrap_or(""));
    if document
        .entries()
        .find_in_group(&group, &args.entry.title)
        .is_some()
    {
        return Err(CliError::invalid_input(format!(
            "Entry '{}' already exists",
            args.entry.title
        ))
        .into());
    }

    let password = match &args.password {
        Some(password) => zeroize::Zeroizing::new(password.clone()),
        None if ctx.interactive() => prompt_secret("Password")?,
        None => zeroize::Zeroizing::new(String::new()),
    };

    let entries = document.entries_mut();
    entries
        .push(Entry::with_group_and_title(group, &args.entry.title))
        .map_err(classify)?;
    let last = entries.len() - 1;
    let mut entry = entries
        .get_mut(last)
        .ok_or_else(|| anyhow::anyhow!("Entry was not added"))?;
    entry.set_password(&password).map_err(classify)?;
    if let Some(user) = &args.user {
        entry.set_user_name(user).map_err(classify)?;
    }
    if let Some(url) = &args.url {
        entry.set_url(url).map_err(classify)?;
    }
    if let Some(email) = &args.email {
        entry.set_email(email).map_err(classify)?;
    }
    if let Some(notes) = &args.notes {
        entry.set_notes(notes).map_err(classify)?;
    }

    ctx.save_document(&mut document, &path)?;
    if !ctx.quiet() {
        println!("Added entry '{}'", args.entry.title);
    }
    Ok(())
}

pub fn handle_remove(ctx: &AppContext, args: &EntryRef) -> anyhow::Result<()> {
    let (mut document, path) = ctx.open_document()?;
    let entries = document.entries_mut();
    let removed = match &args.group {
        Some(group) => entries
            .remove_in_group(&GroupPath::from(group.as_str()), &args.title)
            .map_err(classify)?,
        None => entries.remove(&args.title).map_err(classify)?,
    };
    if !removed {
        return Err(not_found(args));
    }

    ctx.save_document(&mut document, &path)?;
    if !ctx.quiet() {
        println!("Removed entry '{}'", args.title);
    }
    Ok(())
}

pub fn handle_autotype(ctx: &AppContext, args: &EntryRef) -> anyhow::Result<()> {
    let (mut document, path) = ctx.open_document()?;
    let mut entry = find_entry(&mut document, args)?;
    let tokens = entry.autotype_tokens().map_err(classify)?;
    let line: String = tokens
        .iter()
        .map(|token| match token.kind() {
            AutotypeTokenKind::Key => token.content().to_string(),
            AutotypeTokenKind::Command => format!("{{{}}}", token.content()),
        })
        .collect();
    println!("{}", line);
    ctx.save_document(&mut document, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_group_matches_descendants() {
        let filter = GroupPath::from("Work");
        assert!(in_group(&GroupPath::from("work"), &filter));
        assert!(in_group(&GroupPath::from("Work.Mail"), &filter));
        assert!(!in_group(&GroupPath::from("Workshop"), &filter));
        assert!(!in_group(&GroupPath::from(""), &filter));
    }

    #[test]
    fn test_summarize_does_not_stamp_access() {
        let mut document = Document::with_passphrase("pw");
        let mut entry = Entry::with_group_and_title("Work", "Mail");
        entry.set_user_name("me").unwrap();
        document.entries_mut().push(entry).unwrap();

        let entry = document.entries().get(0).unwrap();
        let summary = summarize(entry).unwrap();
        assert_eq!(
            summary,
            EntrySummary {
                group: "Work".to_string(),
                title: "Mail".to_string(),
                user: "me".to_string(),
            }
        );
        assert!(entry.last_access_time().unwrap().is_none());
    }
}
