/// Engine logo printed at the top of startup logs.
pub const BANNER: &str = r#"
 __  __  __   __  _      ___   _____
|  \/  | \ \ / / | |    |_ _| | ____|
| |\/| |  \ V /  | |     | |  |  _|
| |  | |   | |   | |___  | |  | |___
|_|  |_|   |_|   |_____||___| |_____|
"#;

/// Log [`BANNER`] line by line.
pub fn log_banner() {
    for line in BANNER.lines().filter(|l| !l.trim().is_empty()) {
        tracing::info!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_lines_have_no_trailing_whitespace() {
        for line in BANNER.lines() {
            assert_eq!(line, line.trim_end());
        }
    }

    #[test]
    fn banner_has_five_rows() {
        assert_eq!(BANNER.lines().filter(|l| !l.is_empty()).count(), 5);
    }
}
