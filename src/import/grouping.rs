//! Group continuation: does a row extend the current Contract/License?

/// Outcome of comparing a row's name with the group in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Same group as the previous rows.
    Continue,
    /// A new group starts (or there is nothing to continue).
    New,
}

/// Compare a row's name with the current group name.
///
/// Exact, case-sensitive equality; both sides must be present to continue.
pub fn detect(row_name: Option<&str>, group_name: Option<&str>) -> Continuation {
    match (row_name, group_name) {
        (Some(row), Some(group)) if row == group => Continuation::Continue,
        _ => Continuation::New,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_names_continue() {
        assert_eq!(detect(Some("Office365"), Some("Office365")), Continuation::Continue);
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        assert_eq!(detect(Some("office365"), Some("Office365")), Continuation::New);
        assert_eq!(detect(Some("Office365 "), Some("Office365")), Continuation::New);
    }

    #[test]
    fn test_missing_side_is_new() {
        assert_eq!(detect(Some("Visio"), None), Continuation::New);
        assert_eq!(detect(None, Some("Visio")), Continuation::New);
        assert_eq!(detect(None, None), Continuation::New);
    }
}
