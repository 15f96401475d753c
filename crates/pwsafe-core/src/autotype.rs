//! Auto-type templates.
//!
//! A template is plain text with backslash escapes. Parsing turns it into
//! key tokens (text to send as-is) and command tokens (placeholders for
//! entry fields and timing). Expansion against an entry replaces the field
//! commands with the escaped keys of the field's value.
//!
//! | Escape | Token |
//! |---|---|
//! | `\u` `\p` `\2` | UserName, Password, TwoFactorCode |
//! | `\g` `\i` `\l` `\m` | Group, Title, Url, Email |
//! | `\cn` `\ct` `\ce` `\cv` `\cp` | credit card number, tabbed number, expiration, CVV, PIN |
//! | `\o[n]` | Notes, or line `n` of the notes |
//! | `\d<n>` `\w<n>` `\W<n>` | Delay, Wait (milliseconds), Wait (seconds) |
//! | `\z` | Legacy |
//! | `\b` `\t` `\s` `\n` | Backspace, Tab, Shift+Tab, Enter |

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::entry::Entry;
use crate::error::Result;

/// What a token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutotypeTokenKind {
    /// Keys to send.
    Key,
    /// Placeholder resolved by the caller or by expansion.
    Command,
}

/// One unit of an auto-type sequence. The content may hold secret text and
/// is wiped on drop.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AutotypeToken {
    content: String,
    #[zeroize(skip)]
    kind: AutotypeTokenKind,
}

impl AutotypeToken {
    pub fn key(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: AutotypeTokenKind::Key,
        }
    }

    pub fn command(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: AutotypeTokenKind::Command,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> AutotypeTokenKind {
        self.kind
    }
}

impl std::fmt::Display for AutotypeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}

#[derive(Clone, Copy)]
enum State {
    Default,
    Escape,
    CreditCard,
    MandatoryNumber,
    OptionalNumber,
}

fn command_token(command: char, card: Option<char>, argument: &str) -> AutotypeToken {
    let with_argument = |name: &str, suffix: &str| {
        if argument.is_empty() {
            AutotypeToken::command(name)
        } else {
            AutotypeToken::command(format!("{}:{}{}", name, argument, suffix))
        }
    };
    match (command, card) {
        ('u', None) => AutotypeToken::command("UserName"),
        ('p', None) => AutotypeToken::command("Password"),
        ('2', None) => AutotypeToken::command("TwoFactorCode"),
        ('g', None) => AutotypeToken::command("Group"),
        ('i', None) => AutotypeToken::command("Title"),
        ('l', None) => AutotypeToken::command("Url"),
        ('m', None) => AutotypeToken::command("Email"),
        ('z', None) => AutotypeToken::command("Legacy"),
        ('c', Some('n')) => AutotypeToken::command("CreditCardNumber"),
        ('c', Some('t')) => AutotypeToken::command("CreditCardNumberTabbed"),
        ('c', Some('e')) => AutotypeToken::command("CreditCardExpiration"),
        ('c', Some('v')) => AutotypeToken::command("CreditCardVerificationValue"),
        ('c', Some('p')) => AutotypeToken::command("CreditCardPin"),
        ('o', None) => with_argument("Notes", ""),
        ('d', None) => with_argument("Delay", ""),
        ('w', None) => with_argument("Wait", ""),
        ('W', None) => with_argument("Wait", "000"),
        _ => AutotypeToken::key(command.to_string()),
    }
}

/// Split a template into tokens without resolving any entry fields.
///
/// An empty template means "user name, Tab, password, Enter".
pub fn parse_template(template: &str) -> Vec<AutotypeToken> {
    if template.is_empty() {
        return vec![
            AutotypeToken::command("UserName"),
            AutotypeToken::key("{Tab}"),
            AutotypeToken::command("Password"),
            AutotypeToken::key("{Enter}"),
        ];
    }

    let mut tokens = Vec::new();
    let mut state = State::Default;
    let mut command: Option<char> = None;
    let mut argument = String::new();

    for ch in template.chars() {
        match state {
            State::Default => {
                if ch == '\\' {
                    state = State::Escape;
                } else {
                    tokens.push(AutotypeToken::key(ch.to_string()));
                }
            }
            State::Escape => {
                state = State::Default;
                match ch {
                    'u' | 'p' | '2' | 'g' | 'i' | 'l' | 'm' | 'z' => {
                        tokens.push(command_token(ch, None, ""));
                    }
                    'c' => state = State::CreditCard,
                    'b' => tokens.push(AutotypeToken::key("{Backspace}")),
                    't' => tokens.push(AutotypeToken::key("{Tab}")),
                    's' => tokens.push(AutotypeToken::key("+{Tab}")),
                    'n' => tokens.push(AutotypeToken::key("{Enter}")),
                    'd' | 'w' | 'W' => {
                        command = Some(ch);
                        state = State::MandatoryNumber;
                    }
                    'o' => {
                        command = Some(ch);
                        state = State::OptionalNumber;
                    }
                    _ => tokens.push(AutotypeToken::key(ch.to_string())),
                }
            }
            State::CreditCard => {
                state = State::Default;
                match ch {
                    'n' | 't' | 'e' | 'v' | 'p' => tokens.push(command_token('c', Some(ch), "")),
                    _ => tokens.extend(text_to_keys(&format!("c{}", ch))),
                }
            }
            State::MandatoryNumber => {
                if ch.is_ascii_digit() {
                    argument.push(ch);
                    state = State::OptionalNumber;
                } else {
                    let mut literal: String = command.take().into_iter().collect();
                    if ch == '\\' {
                        state = State::Escape;
                    } else {
                        literal.push(ch);
                        state = State::Default;
                    }
                    tokens.extend(text_to_keys(&literal));
                }
            }
            State::OptionalNumber => {
                if ch.is_ascii_digit() && argument.len() < 3 {
                    argument.push(ch);
                } else {
                    if let Some(name) = command.take() {
                        tokens.push(command_token(name, None, &argument));
                    }
                    argument.clear();
                    if ch == '\\' {
                        state = State::Escape;
                    } else {
                        tokens.push(AutotypeToken::key(ch.to_string()));
                        state = State::Default;
                    }
                }
            }
        }
    }

    match (command, state) {
        (Some(name), State::MandatoryNumber) => tokens.extend(text_to_keys(&name.to_string())),
        (Some(name), _) => tokens.push(command_token(name, None, &argument)),
        (None, State::Escape) => tokens.push(AutotypeToken::key("\\")),
        _ => {}
    }
    tokens
}

/// Key tokens that type `text` literally.
///
/// Characters with a meaning in key sequences are wrapped in braces;
/// backspace, line breaks and tabs become named keys.
pub fn text_to_keys(text: &str) -> Vec<AutotypeToken> {
    text.chars()
        .map(|ch| match ch {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => {
                AutotypeToken::key(format!("{{{}}}", ch))
            }
            '\u{8}' => AutotypeToken::key("{Backspace}"),
            '\n' | '\r' => AutotypeToken::key("{Enter}"),
            '\t' => AutotypeToken::key("{Tab}"),
            _ => AutotypeToken::key(ch.to_string()),
        })
        .collect()
}

/// Digits of a card number, optionally with a tab before every group of
/// four counted from the right.
fn card_digits(number: &str, tabbed: bool) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    if !tabbed {
        return digits.into_iter().collect();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 4 == 0 {
            out.push('\t');
        }
        out.push(*digit);
    }
    out
}

fn note_lines(notes: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = notes;
    while let Some(pos) = rest.find(|c| c == '\r' || c == '\n') {
        lines.push(&rest[..pos]);
        let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[pos + skip..];
    }
    lines.push(rest);
    lines
}

/// Resolve field commands against `entry`. Timing commands, TwoFactorCode
/// and Legacy are passed through for the caller.
pub fn expand(tokens: &[AutotypeToken], entry: &mut Entry) -> Result<Vec<AutotypeToken>> {
    let mut keys = Vec::new();
    for token in tokens {
        if token.kind() == AutotypeTokenKind::Key {
            keys.push(token.clone());
            continue;
        }

        let (command, argument) = match token.content().split_once(':') {
            Some((command, argument)) => (command, Some(argument)),
            None => (token.content(), None),
        };
        match command {
            "UserName" => keys.extend(text_to_keys(&entry.user_name()?)),
            "Password" => keys.extend(text_to_keys(&entry.password()?)),
            "CreditCardNumber" => {
                keys.extend(text_to_keys(&card_digits(&entry.credit_card_number()?, false)))
            }
            "CreditCardNumberTabbed" => {
                keys.extend(text_to_keys(&card_digits(&entry.credit_card_number()?, true)))
            }
            "CreditCardExpiration" => keys.extend(text_to_keys(&entry.credit_card_expiration()?)),
            "CreditCardVerificationValue" => {
                keys.extend(text_to_keys(&entry.credit_card_verification_value()?))
            }
            "CreditCardPin" => keys.extend(text_to_keys(&entry.credit_card_pin()?)),
            "Group" => keys.extend(text_to_keys(entry.group()?.as_str())),
            "Title" => keys.extend(text_to_keys(&entry.title()?)),
            "Url" => keys.extend(text_to_keys(&entry.url()?)),
            "Email" => keys.extend(text_to_keys(&entry.email()?)),
            "Notes" => {
                let notes = zeroize::Zeroizing::new(entry.notes()?);
                let lines = note_lines(&notes);
                match argument.map(str::parse::<usize>) {
                    None => keys.extend(text_to_keys(&lines.join("\n"))),
                    Some(Ok(line)) if (1..=lines.len()).contains(&line) => {
                        keys.extend(text_to_keys(lines[line - 1]));
                    }
                    Some(_) => {}
                }
            }
            "TwoFactorCode" | "Delay" | "Wait" | "Legacy" => keys.push(token.clone()),
            _ => {}
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(tokens: &[AutotypeToken]) -> Vec<&str> {
        tokens.iter().map(AutotypeToken::content).collect()
    }

    #[test]
    fn test_default_template() {
        let tokens = parse_template("\\u\\t\\p\\n");
        assert_eq!(contents(&tokens), vec!["UserName", "{Tab}", "Password", "{Enter}"]);
        assert_eq!(tokens[0].kind(), AutotypeTokenKind::Command);
        assert_eq!(tokens[1].kind(), AutotypeTokenKind::Key);
        assert_eq!(parse_template(""), tokens);
    }

    #[test]
    fn test_credit_card_escapes() {
        let tokens = parse_template("\\cn\\ct\\cx");
        assert_eq!(
            contents(&tokens),
            vec!["CreditCardNumber", "CreditCardNumberTabbed", "c", "x"]
        );
    }

    #[test]
    fn test_numeric_arguments() {
        let tokens = parse_template("\\d50\\W2\\w1234x");
        assert_eq!(
            contents(&tokens),
            vec!["Delay:50", "Wait:2000", "Wait:123", "4", "x"]
        );
    }

    #[test]
    fn test_mandatory_number_missing() {
        assert_eq!(contents(&parse_template("\\dx")), vec!["d", "x"]);
        assert_eq!(contents(&parse_template("\\w")), vec!["w"]);
        assert_eq!(
            contents(&parse_template("\\d\\u\\W\\t")),
            vec!["d", "UserName", "W", "{Tab}"]
        );
    }

    #[test]
    fn test_optional_number() {
        assert_eq!(contents(&parse_template("\\o")), vec!["Notes"]);
        assert_eq!(contents(&parse_template("\\o2\\n")), vec!["Notes:2", "{Enter}"]);
    }

    #[test]
    fn test_unknown_and_trailing_escape() {
        assert_eq!(contents(&parse_template("a\\qb\\")), vec!["a", "q", "b", "\\"]);
    }

    #[test]
    fn test_text_to_keys_escapes() {
        let keys = text_to_keys("a+b{\t\r\n");
        assert_eq!(
            contents(&keys),
            vec!["a", "{+}", "b", "{{}", "{Tab}", "{Enter}", "{Enter}"]
        );
    }

    #[test]
    fn test_card_digits() {
        assert_eq!(card_digits("4111-1111 1111-1111", false), "4111111111111111");
        assert_eq!(card_digits("12345678901", true), "123\t4567\t8901");
        assert_eq!(card_digits("1234", true), "1234");
    }

    #[test]
    fn test_note_lines() {
        assert_eq!(note_lines("a\r\nb\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(note_lines(""), vec![""]);
    }

    #[test]
    fn test_expand_against_entry() {
        let mut entry = Entry::with_title("Site");
        entry.set_user_name("me").unwrap();
        entry.set_password("p+w").unwrap();
        entry.set_notes("first\nsecond").unwrap();

        let tokens = parse_template("\\u\\t\\p\\o2\\d5");
        let keys = expand(&tokens, &mut entry).unwrap();
        assert_eq!(
            contents(&keys),
            vec!["m", "e", "{Tab}", "p", "{+}", "w", "s", "e", "c", "o", "n", "d", "Delay:5"]
        );
    }

    #[test]
    fn test_expand_out_of_range_note_line() {
        let mut entry = Entry::with_title("Site");
        entry.set_notes("only").unwrap();
        let keys = expand(&parse_template("\\o9"), &mut entry).unwrap();
        assert!(keys.is_empty());
    }
}
