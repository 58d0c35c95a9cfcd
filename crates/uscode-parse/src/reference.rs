use uscode_core::RefType;

/// Classify a raw link target into a [`RefType`] plus, for in-title USC
/// paths, the title/section it points at.
///
/// Targets starting with `#`, `/us/pl/`, or `/us/stat/` are carried
/// verbatim and always classified `External` — they do not name a USC
/// section. A `/us/usc/t{title}/s{section}` path is parsed into its title
/// and section; `Internal` when the title matches this corpus's title
/// (18), `CrossTitle` otherwise.
pub fn classify_ref(target: &str) -> (RefType, Option<String>, Option<String>) {
    if target.starts_with('#') || target.starts_with("/us/pl/") || target.starts_with("/us/stat/") {
        return (RefType::External, None, None);
    }

    if let Some(rest) = target.strip_prefix("/us/usc/t") {
        let mut parts = rest.splitn(2, "/s");
        let title = parts.next().unwrap_or_default();
        let section = parts.next();
        if !title.is_empty() {
            let section = section.map(|s| s.split('/').next().unwrap_or(s).to_string());
            let ref_type = if title == "18" {
                RefType::Internal
            } else {
                RefType::CrossTitle
            };
            return (ref_type, Some(title.to_string()), section);
        }
    }

    (RefType::External, None, None)
}
