//! Static action allow-list.
//!
//! Immutable registry mapping each supported application to the exact set of
//! remote actions an agent may invoke through the broker. This bounds the
//! blast radius of a connected integration independent of per-agent scope
//! overrides; overrides can narrow this list but never widen it.

/// Per-application allowed actions, in registry order.
static APP_ACTIONS: &[(&str, &[&str])] = &[
    (
        "gmail",
        &[
            "GMAIL_SEND_EMAIL",
            "GMAIL_FETCH_EMAILS",
            "GMAIL_FETCH_MESSAGE_BY_MESSAGE_ID",
            "GMAIL_FETCH_MESSAGE_BY_THREAD_ID",
        ],
    ),
    (
        "notion",
        &[
            "NOTION_CREATE_NOTION_PAGE",
            "NOTION_ADD_MULTIPLE_PAGE_CONTENT",
            "NOTION_FETCH_DATA",
            "NOTION_FETCH_BLOCK_CONTENTS",
            "NOTION_FETCH_DATABASE",
            "NOTION_INSERT_ROW_DATABASE",
            "NOTION_FETCH_ROW",
            "NOTION_CREATE_DATABASE",
            "NOTION_ARCHIVE_NOTION_PAGE",
            "NOTION_APPEND_BLOCK_CHILDREN",
            "NOTION_SEARCH_NOTION_PAGE",
            "NOTION_QUERY_DATABASE",
            "NOTION_UPDATE_PAGE",
            "NOTION_UPDATE_ROW_DATABASE",
            "NOTION_UPDATE_BLOCK",
            "NOTION_UPDATE_SCHEMA_DATABASE",
            "NOTION_DELETE_BLOCK",
            "NOTION_CREATE_COMMENT",
            "NOTION_FETCH_COMMENTS",
            "NOTION_RETRIEVE_COMMENT",
            "NOTION_DUPLICATE_PAGE",
            "NOTION_FETCH_BLOCK_METADATA",
            "NOTION_GET_PAGE_PROPERTY_ACTION",
            "NOTION_RETRIEVE_DATABASE_PROPERTY",
            "NOTION_LIST_USERS",
            "NOTION_GET_ABOUT_ME",
            "NOTION_GET_ABOUT_USER",
        ],
    ),
    (
        "github",
        &[
            "GITHUB_CREATE_AN_ISSUE",
            "GITHUB_ADD_LABELS_TO_AN_ISSUE",
            "GITHUB_ADD_ASSIGNEES_TO_AN_ISSUE",
            "GITHUB_CREATE_AN_ISSUE_COMMENT",
            "GITHUB_CREATE_A_PULL_REQUEST",
            "GITHUB_CHECK_IF_A_PULL_REQUEST_HAS_BEEN_MERGED",
            "GITHUB_GET_A_REPOSITORY",
            "GITHUB_CREATE_A_REPOSITORY",
            "GITHUB_STAR_A_REPOSITORY_FOR_THE_AUTHENTICATED_USER",
            "GITHUB_CREATE_A_FORK",
        ],
    ),
];

/// Whether the application is in the supported set.
pub fn is_app_supported(app: &str) -> bool {
    APP_ACTIONS.iter().any(|(name, _)| *name == app)
}

/// Whether `action` is allow-listed for `app`. Unknown apps permit nothing.
pub fn is_action_allowed(app: &str, action: &str) -> bool {
    allowed_actions(app).contains(&action)
}

/// Ordered allowed actions for an app; empty for unknown apps.
pub fn allowed_actions(app: &str) -> &'static [&'static str] {
    APP_ACTIONS
        .iter()
        .find(|(name, _)| *name == app)
        .map(|(_, actions)| *actions)
        .unwrap_or(&[])
}

/// All supported application names, in registry order.
pub fn supported_apps() -> Vec<&'static str> {
    APP_ACTIONS.iter().map(|(name, _)| *name).collect()
}

/// The full registry, for the discovery endpoint.
pub fn app_actions() -> &'static [(&'static str, &'static [&'static str])] {
    APP_ACTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_apps_are_supported() {
        assert!(is_app_supported("gmail"));
        assert!(is_app_supported("notion"));
        assert!(is_app_supported("github"));
        assert!(!is_app_supported("slack"));
        assert!(!is_app_supported(""));
    }

    #[test]
    fn allow_list_membership_governs_actions() {
        assert!(is_action_allowed("gmail", "GMAIL_SEND_EMAIL"));
        assert!(!is_action_allowed("gmail", "GMAIL_DELETE_ALL"));
        assert!(!is_action_allowed("slack", "SLACK_SEND_MESSAGE"));
        assert!(!is_action_allowed("slack", "GMAIL_SEND_EMAIL"));
    }

    #[test]
    fn actions_are_not_shared_across_apps() {
        assert!(is_action_allowed("github", "GITHUB_CREATE_AN_ISSUE"));
        assert!(!is_action_allowed("gmail", "GITHUB_CREATE_AN_ISSUE"));
        assert!(!is_action_allowed("notion", "GMAIL_SEND_EMAIL"));
    }

    #[test]
    fn allowed_actions_is_ordered_and_empty_for_unknown() {
        let gmail = allowed_actions("gmail");
        assert_eq!(gmail.first(), Some(&"GMAIL_SEND_EMAIL"));
        assert_eq!(gmail.len(), 4);
        assert!(allowed_actions("slack").is_empty());
    }

    #[test]
    fn supported_apps_lists_registry_order() {
        assert_eq!(supported_apps(), vec!["gmail", "notion", "github"]);
    }
}
