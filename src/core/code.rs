use chrono::{DateTime, Utc};

pub const MAX_CODE_LENGTH: usize = 50;
pub const DEFAULT_CODE_PREFIX: &str = "BACKER";

/// Builds discount codes of the form `PREFIX_NAME_<millis>_<seq>`.
///
/// The sequence number increases for every code a generator hands out, so
/// two rows landing in the same millisecond still get distinct codes. Long
/// names are shortened instead of the suffix.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    prefix: String,
    sequence: u64,
}

impl CodeGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: sanitize(&prefix.into()),
            sequence: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_code(&mut self, name: &str, now: DateTime<Utc>) -> String {
        self.sequence += 1;
        let suffix = format!("{}_{}", now.timestamp_millis(), self.sequence);
        synthesize(&self.prefix, name, &suffix)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_PREFIX)
    }
}

/// 大寫化並把 [A-Z0-9] 以外的字元換成底線
pub fn sanitize(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_uppercase() || c.is_ascii_digit() { c } else { '_' })
        .collect()
}

fn synthesize(prefix: &str, name: &str, suffix: &str) -> String {
    let body = sanitize(name);
    let fixed = prefix.len() + suffix.len() + 2;
    let budget = MAX_CODE_LENGTH.saturating_sub(fixed);
    let body: String = body.chars().take(budget).collect();

    let code = if body.is_empty() {
        format!("{}_{}", prefix, suffix)
    } else {
        format!("{}_{}_{}", prefix, body, suffix)
    };
    // prefix 過長時仍以總長為準
    code.chars().take(MAX_CODE_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_millis(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Alice O'Neil"), "ALICE_O_NEIL");
        assert_eq!(sanitize("zoë-2"), "ZO__2");
        assert_eq!(sanitize("bob"), "BOB");
    }

    #[test]
    fn test_code_layout() {
        let mut generator = CodeGenerator::default();
        let code = generator.next_code("Alice", at_millis(1_700_000_000_123));

        assert_eq!(code, "BACKER_ALICE_1700000000123_1");
    }

    #[test]
    fn test_same_millisecond_codes_are_unique() {
        let mut generator = CodeGenerator::new("KS");
        let now = at_millis(1_700_000_000_000);

        let first = generator.next_code("Alice", now);
        let second = generator.next_code("Alice", now);
        assert_ne!(first, second);
    }

    #[test]
    fn test_long_names_keep_the_suffix() {
        let mut generator = CodeGenerator::default();
        let name = "Bartholomew Maximilian Fitzgerald-Worthington the Third";
        let code = generator.next_code(name, at_millis(1_700_000_000_123));

        assert_eq!(code.len(), MAX_CODE_LENGTH);
        assert!(code.starts_with("BACKER_BARTHOLOMEW"));
        assert!(code.ends_with("_1700000000123_1"));
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
    }

    #[test]
    fn test_prefix_is_sanitized() {
        let generator = CodeGenerator::new("spring-24");
        assert_eq!(generator.prefix(), "SPRING_24");
    }
}
