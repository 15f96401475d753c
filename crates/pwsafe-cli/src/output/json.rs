//! JSON output formatting.

use serde::Serialize;

/// Print any view struct as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("JSON error: {}", e))?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{EntryDetail, EntrySummary};

    #[test]
    fn test_summary_serializes_fields() {
        let summary = EntrySummary {
            group: "Work".to_string(),
            title: "Mail".to_string(),
            user: "me".to_string(),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["group"], "Work");
        assert_eq!(value["title"], "Mail");
        assert_eq!(value["user"], "me");
    }

    #[test]
    fn test_hidden_password_is_omitted() {
        let detail = EntryDetail {
            uuid: String::new(),
            group: String::new(),
            title: "Mail".to_string(),
            user: String::new(),
            password: None,
            url: String::new(),
            email: String::new(),
            notes: String::new(),
            created: None,
            modified: None,
            password_modified: None,
            password_expires: None,
            history_count: 0,
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert!(value.get("password").is_none());
        assert!(value["created"].is_null());
    }
}
