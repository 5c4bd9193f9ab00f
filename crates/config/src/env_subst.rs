/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// Unresolvable variables are left as-is, so a secret reference survives a
/// round-trip through load and save instead of being blanked.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Placeholder scan with a caller-supplied lookup, testable without
/// touching the process environment. Substituted values are not re-scanned.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            // Empty or unclosed placeholder: emit the opener literally and
            // keep scanning after it.
            _ => {
                result.push_str("${");
                rest = after;
            },
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "UNFURL_TEST_VAR" => Some("hello".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("key=${UNFURL_TEST_VAR}", lookup),
            "key=hello"
        );
        assert_eq!(
            substitute_env_with("${UNFURL_TEST_VAR}:${UNFURL_TEST_VAR}", lookup),
            "hello:hello"
        );
        assert_eq!(substitute_env_with("x${EMPTY}y", lookup), "xy");
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${UNFURL_NONEXISTENT_XYZ}", lookup),
            "${UNFURL_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn malformed_placeholders_pass_through() {
        assert_eq!(substitute_env_with("${}", lookup), "${}");
        assert_eq!(substitute_env_with("${UNCLOSED", lookup), "${UNCLOSED");
        assert_eq!(
            substitute_env_with("pre ${ mid ${UNFURL_TEST_VAR}", lookup),
            "pre ${ mid ${UNFURL_TEST_VAR}"
        );
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
        assert_eq!(substitute_env("costs $5"), "costs $5");
    }
}
