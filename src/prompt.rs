use std::collections::HashMap;

/// Build a prompt string with variable substitution.
///
/// Replaces `{key}` placeholders in the template with values from `vars`.
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use link_to_social::prompt::render;
/// use std::collections::HashMap;
///
/// let vars = HashMap::from([("url".to_string(), "https://example.com".to_string())]);
/// let result = render("Read {url} and answer as {{\"title\": \"...\"}}", &vars);
/// assert_eq!(result, r#"Read https://example.com and answer as {"title": "..."}"#);
/// ```
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    // Single left-to-right pass: substituted values are never rescanned.
    while let Some(idx) = rest.find(|c: char| c == '{' || c == '}') {
        rendered.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if tail.starts_with("{{") {
            rendered.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            rendered.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(end) = tail[1..].find('}') {
                if let Some(value) = vars.get(&tail[1..1 + end]) {
                    rendered.push_str(value);
                    rest = &tail[end + 2..];
                    continue;
                }
            }
        }

        rendered.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    rendered.push_str(rest);
    rendered
}

/// Shorthand for building a `vars` map from string pairs.
pub fn vars<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Bulleted list, one item per line.
pub fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
