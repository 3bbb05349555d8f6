use oasis_shared::Venue;

use crate::texts;

/// Everything a requester or operator can invoke by text. Menu button
/// labels parse to the same commands as their slash forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Book,
    Cancel,
    Status,
    MyId,
    Pending,
    Approved,
    Operators,
    Reject {
        code: String,
        reason: Option<String>,
    },
    Promote {
        identity: String,
        username: Option<String>,
        full_name: Option<String>,
    },
    Demote {
        identity: String,
    },
}

impl Command {
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        match text {
            texts::MENU_BOOK => return Some(Command::Book),
            texts::MENU_STATUS => return Some(Command::Status),
            texts::MENU_MY_ID => return Some(Command::MyId),
            texts::MENU_PENDING => return Some(Command::Pending),
            texts::MENU_APPROVED => return Some(Command::Approved),
            _ => {}
        }

        let mut parts = text.split_whitespace();
        match parts.next()? {
            "/start" => Some(Command::Start),
            "/book" => Some(Command::Book),
            "/cancel" => Some(Command::Cancel),
            "/status" => Some(Command::Status),
            "/myid" => Some(Command::MyId),
            "/pending" => Some(Command::Pending),
            "/approved" => Some(Command::Approved),
            "/operators" => Some(Command::Operators),
            "/reject" => {
                let code = parts.next()?.to_string();
                let rest: Vec<&str> = parts.collect();
                let reason = (!rest.is_empty()).then(|| rest.join(" "));
                Some(Command::Reject { code, reason })
            }
            "/promote" => {
                let identity = parts.next()?.to_string();
                let username = parts.next().map(str::to_string);
                let rest: Vec<&str> = parts.collect();
                let full_name = (!rest.is_empty()).then(|| rest.join(" "));
                Some(Command::Promote {
                    identity,
                    username,
                    full_name,
                })
            }
            "/demote" => Some(Command::Demote {
                identity: parts.next()?.to_string(),
            }),
            _ => None,
        }
    }
}

/// Inline-button payloads. `venue:*`, `confirm` and `cancel` feed the
/// booking conversation; `approve:*` is the operator affordance and is
/// handled independently of any conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Venue(Venue),
    Confirm,
    Cancel,
    Approve(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<CallbackAction> {
        if let Some(token) = data.strip_prefix("venue:") {
            return Venue::parse(token).map(CallbackAction::Venue);
        }
        if let Some(code) = data.strip_prefix("approve:") {
            return Some(CallbackAction::Approve(code.to_string()));
        }
        match data {
            "confirm" => Some(CallbackAction::Confirm),
            "cancel" => Some(CallbackAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse(" /book "), Some(Command::Book));
        assert_eq!(Command::parse("/operators"), Some(Command::Operators));
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("/frobnicate"), None);
    }

    #[test]
    fn test_menu_labels_parse_as_commands() {
        assert_eq!(Command::parse(texts::MENU_BOOK), Some(Command::Book));
        assert_eq!(Command::parse(texts::MENU_STATUS), Some(Command::Status));
        assert_eq!(Command::parse(texts::MENU_PENDING), Some(Command::Pending));
    }

    #[test]
    fn test_reject_collects_optional_reason() {
        assert_eq!(
            Command::parse("/reject OASIS1"),
            Some(Command::Reject {
                code: "OASIS1".to_string(),
                reason: None
            })
        );
        assert_eq!(
            Command::parse("/reject OASIS1 venue closed that day"),
            Some(Command::Reject {
                code: "OASIS1".to_string(),
                reason: Some("venue closed that day".to_string())
            })
        );
        // A bare /reject is not a command; it falls through to the help reply
        assert_eq!(Command::parse("/reject"), None);
    }

    #[test]
    fn test_promote_takes_identity_username_and_name() {
        assert_eq!(
            Command::parse("/promote 77001"),
            Some(Command::Promote {
                identity: "77001".to_string(),
                username: None,
                full_name: None
            })
        );
        assert_eq!(
            Command::parse("/promote 77001 lina Lina K"),
            Some(Command::Promote {
                identity: "77001".to_string(),
                username: Some("lina".to_string()),
                full_name: Some("Lina K".to_string())
            })
        );
    }

    #[test]
    fn test_callback_payloads() {
        assert_eq!(
            CallbackAction::parse("venue:winter_pool"),
            Some(CallbackAction::Venue(Venue::WinterPool))
        );
        assert_eq!(CallbackAction::parse("confirm"), Some(CallbackAction::Confirm));
        assert_eq!(CallbackAction::parse("cancel"), Some(CallbackAction::Cancel));
        assert_eq!(
            CallbackAction::parse("approve:OASIS20250701120000"),
            Some(CallbackAction::Approve("OASIS20250701120000".to_string()))
        );
        assert_eq!(CallbackAction::parse("venue:rooftop"), None);
        assert_eq!(CallbackAction::parse("noise"), None);
    }
}
