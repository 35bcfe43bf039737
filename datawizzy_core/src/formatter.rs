/// Post-processes raw model text into display-ready markup by wrapping
/// detected code lines in fenced blocks. Total function, no failure modes.
pub struct InstructionFormatter {
    language: String,
}

impl Default for InstructionFormatter {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
        }
    }
}

impl InstructionFormatter {
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Each matching line gets its own three-line fence rather than being
    /// grouped with neighbours. Downstream rendering depends on the per-line
    /// shape, so it is kept as-is.
    pub fn format(&self, raw_text: &str) -> String {
        let mut formatted_lines = Vec::new();
        let mut in_fence = false;

        for line in raw_text.split('\n') {
            let trimmed = line.trim();
            if trimmed.starts_with("```") || trimmed.ends_with("```") {
                // Fence markers pass through and flip the interior flag so
                // already-fenced code is never wrapped a second time.
                formatted_lines.push(line.to_string());
                in_fence = !in_fence;
            } else if in_fence {
                formatted_lines.push(line.to_string());
            } else if trimmed.starts_with("import") || line.contains('=') {
                formatted_lines.push(format!("```{}\n{}\n```", self.language, line));
            } else {
                formatted_lines.push(line.to_string());
            }
        }

        formatted_lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_import_line_in_three_line_fence() {
        let formatter = InstructionFormatter::default();

        assert_eq!(
            formatter.format("import pandas as pd"),
            "```python\nimport pandas as pd\n```"
        );
    }

    #[test]
    fn wraps_assignment_lines() {
        let formatter = InstructionFormatter::default();

        assert_eq!(formatter.format("x = 1"), "```python\nx = 1\n```");
    }

    #[test]
    fn leaves_plain_lines_untouched() {
        let formatter = InstructionFormatter::default();

        assert_eq!(formatter.format("print('hello')"), "print('hello')");
        assert_eq!(
            formatter.format("First load your data."),
            "First load your data."
        );
    }

    #[test]
    fn fences_each_matching_line_individually() {
        let formatter = InstructionFormatter::default();

        let raw = "import matplotlib.pyplot as plt\nfig = plt.hist(data)";
        assert_eq!(
            formatter.format(raw),
            "```python\nimport matplotlib.pyplot as plt\n```\n```python\nfig = plt.hist(data)\n```"
        );
    }

    #[test]
    fn preserves_prose_between_code_lines() {
        let formatter = InstructionFormatter::default();

        let raw = "Load the data first.\nimport pandas as pd\nThen inspect it.";
        assert_eq!(
            formatter.format(raw),
            "Load the data first.\n```python\nimport pandas as pd\n```\nThen inspect it."
        );
    }

    #[test]
    fn reformatting_fenced_output_is_a_no_op() {
        let formatter = InstructionFormatter::default();

        let once = formatter.format("x = 1");
        assert_eq!(once, "```python\nx = 1\n```");
        assert_eq!(formatter.format(&once), once);

        let raw = "import numpy as np\ntotal = np.sum(data)\nDone.";
        let once = formatter.format(raw);
        assert_eq!(formatter.format(&once), once);
    }

    #[test]
    fn already_fenced_input_passes_through() {
        let formatter = InstructionFormatter::default();

        let raw = "```python\ndf = pd.read_csv('data.csv')\ndf.head()\n```";
        assert_eq!(formatter.format(raw), raw);
    }

    #[test]
    fn honours_configured_language_tag() {
        let formatter = InstructionFormatter::with_language("r");

        assert_eq!(formatter.format("x <- c(1, 2)"), "x <- c(1, 2)");
        assert_eq!(formatter.format("x = c(1, 2)"), "```r\nx = c(1, 2)\n```");
    }
}
