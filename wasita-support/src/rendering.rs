//! Text rendering utilities for human-friendly diagnostics.
//!
//! Formats resolution chains, implementation names and
//! suggestions shown in container errors.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use wasita_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database", "UserService"];
/// assert_eq!(render_chain(&chain), "UserService → UserRepo → Database → UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// Path prefixes are dropped from every component. Closures keep the
/// name of the item that defines them, so `app::wiring::make_repo::{{closure}}`
/// renders as `make_repo::{{closure}}`.
///
/// ```
/// use wasita_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::user::UserService"), "UserService");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// assert_eq!(
///     shorten_type_name("my_app::wiring::make_repo::{{closure}}"),
///     "make_repo::{{closure}}"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut previous = String::new();
    let mut current = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                previous = std::mem::take(&mut current);
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current);
                result.push(ch);
                previous.clear();
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if is_closure_segment(&current) && !previous.is_empty() {
        result.push_str(&previous);
        result.push_str("::");
    }
    result.push_str(&current);
    result
}

fn is_closure_segment(segment: &str) -> bool {
    segment.starts_with("{{closure")
}

/// Picks registered names that look like `requested`, best match first.
///
/// Used to build "did you mean?" hints when a lookup fails.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    if requested.is_empty() {
        return Vec::new();
    }

    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
