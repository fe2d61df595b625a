//! POSIX shell quoting for command lines shown to users or run in containers.

/// Quote a single token so a POSIX shell reads it back unchanged.
pub fn quote(token: &str) -> String {
    if token.is_empty() {
        return "''".to_string();
    }
    if token.chars().all(is_safe) {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', r#"'"'"'"#))
}

fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "@%_+=:,./-".contains(ch)
}

/// Quote every token and join them with spaces.
pub fn quote_command_line<I, S>(command: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    command
        .into_iter()
        .map(|token| quote(token.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a non-interactive `apt-get install` command line.
pub fn apt_get_install<I, S>(packages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut command: Vec<String> = [
        "DEBIAN_FRONTEND=noninteractive",
        "apt-get",
        "install",
        "-q",
        "-y",
        "--no-install-recommends",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    command.extend(packages.into_iter().map(|p| p.as_ref().to_string()));
    quote_command_line(command)
}
