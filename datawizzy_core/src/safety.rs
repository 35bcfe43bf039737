use regex::Regex;

/// Outcome of a deny-list scan. Derived per call, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub allowed: bool,
    pub matched_pattern: Option<String>,
}

/// Deny-list filter over generated text. This is pattern matching, not a
/// semantic safety model: legitimate pedagogical code mentioning "import os"
/// is blocked, and disallowed content that matches no pattern passes.
pub struct SafetyChecker {
    deny_patterns: Vec<Regex>,
}

impl Default for SafetyChecker {
    fn default() -> Self {
        Self {
            deny_patterns: vec![
                Regex::new(r"(?i)import\s+os").unwrap(),
                Regex::new(r"(?i)import\s+sys").unwrap(),
                Regex::new(r"(?i)exec\(").unwrap(),
                Regex::new(r"(?i)eval\(").unwrap(),
                Regex::new(r"(?i)subprocess").unwrap(),
            ],
        }
    }
}

impl SafetyChecker {
    /// True means the content is allowed for display.
    pub fn check(&self, content: &str) -> bool {
        self.verdict(content).allowed
    }

    /// Call sites distinguish generated prose from generated code; the
    /// current policy treats them identically.
    pub fn check_code(&self, code: &str) -> bool {
        self.check(code)
    }

    /// First matching pattern wins; no match means allowed.
    pub fn verdict(&self, content: &str) -> SafetyVerdict {
        for pattern in &self.deny_patterns {
            if pattern.is_match(content) {
                return SafetyVerdict {
                    allowed: false,
                    matched_pattern: Some(pattern.as_str().to_string()),
                };
            }
        }
        SafetyVerdict {
            allowed: true,
            matched_pattern: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_disallowed_content() {
        let safety = SafetyChecker::default();

        assert!(!safety.check("import os\nos.system('rm -rf /')"));
        assert!(!safety.check("result = eval(user_input)"));
        assert!(!safety.check("subprocess.run(['ls'])"));
        assert!(!safety.check("exec(payload)"));
    }

    #[test]
    fn blocks_every_casing_variant() {
        let safety = SafetyChecker::default();

        assert!(!safety.check("Import OS"));
        assert!(!safety.check("IMPORT os"));
        assert!(!safety.check("iMpOrT sYs"));
        assert!(!safety.check("SUBPROCESS"));
    }

    #[test]
    fn allows_plain_prose() {
        let safety = SafetyChecker::default();

        assert!(safety.check("This is a safe instruction."));
        assert!(safety.check("plain prose with no code"));
        assert!(safety.check("Use pandas.read_csv to load the file."));
    }

    #[test]
    fn any_match_blocks_regardless_of_position() {
        let safety = SafetyChecker::default();

        // Patterns later in the deny list still block on their own.
        assert!(!safety.check("totally harmless text then subprocess at the end"));
        assert!(!safety.check("eval( appears before import os here"));
    }

    #[test]
    fn verdict_reports_first_matching_pattern() {
        let safety = SafetyChecker::default();

        let verdict = safety.verdict("import os; subprocess.run('x')");
        assert!(!verdict.allowed);
        assert_eq!(verdict.matched_pattern.as_deref(), Some(r"(?i)import\s+os"));

        let clean = safety.verdict("just prose");
        assert!(clean.allowed);
        assert!(clean.matched_pattern.is_none());
    }

    #[test]
    fn check_code_matches_check() {
        let safety = SafetyChecker::default();

        assert_eq!(
            safety.check_code("import sys"),
            safety.check("import sys")
        );
        assert!(safety.check_code("df = pd.DataFrame()"));
    }
}
