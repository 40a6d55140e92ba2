use serde::Serialize;
use std::fmt;

const RULE_WIDTH: usize = 65;
const NAME_WIDTH: usize = 29;
const SHAPE_WIDTH: usize = 26;

/// One row of a [`ModelSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub kind: String,
    /// Output dimensions; `None` marks the batch axis.
    pub output_shape: Vec<Option<usize>>,
    pub params: usize,
}

impl LayerSummary {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        output_shape: Vec<Option<usize>>,
        params: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            output_shape,
            params,
        }
    }

    fn shape_string(&self) -> String {
        let dims: Vec<String> = self
            .output_shape
            .iter()
            .map(|d| d.map_or_else(|| "None".to_string(), |v| v.to_string()))
            .collect();
        format!("({})", dims.join(", "))
    }
}

/// Layer table printed before training.
///
/// ```text
/// Model: "sequential"
/// _________________________________________________________________
///  Layer (type)                Output Shape              Param #
/// =================================================================
///  lstm (LSTM)                 (None, 5, 32)             4,864
/// ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    pub fn new(name: impl Into<String>, layers: Vec<LayerSummary>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

/// `1234567` → `"1,234,567"`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "_".repeat(RULE_WIDTH);
        writeln!(f, "Model: \"{}\"", self.name)?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            " {:<w1$}{:<w2$}{}",
            "Layer (type)",
            "Output Shape",
            "Param #",
            w1 = NAME_WIDTH - 1,
            w2 = SHAPE_WIDTH
        )?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        for (idx, layer) in self.layers.iter().enumerate() {
            let label = format!("{} ({})", layer.name, layer.kind);
            writeln!(
                f,
                " {:<w1$} {:<w2$}{}",
                label,
                layer.shape_string(),
                thousands(layer.params),
                w1 = NAME_WIDTH - 2,
                w2 = SHAPE_WIDTH - 1
            )?;
            if idx + 1 < self.layers.len() {
                writeln!(f)?;
            }
        }
        let total = thousands(self.total_params());
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "Total params: {total}")?;
        writeln!(f, "Trainable params: {total}")?;
        writeln!(f, "Non-trainable params: 0")?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(165), "165");
        assert_eq!(thousands(4864), "4,864");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_summary_layout() {
        let summary = ModelSummary::new(
            "sequential",
            vec![
                LayerSummary::new("lstm", "LSTM", vec![None, Some(5), Some(32)], 4864),
                LayerSummary::new("dense", "Dense", vec![None, Some(5), Some(5)], 165),
            ],
        );
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Model: \"sequential\"");
        assert!(lines[2].starts_with(" Layer (type)"));
        assert_eq!(lines[4].find("(None, 5, 32)"), Some(NAME_WIDTH));
        assert!(lines[4].ends_with("4,864"));
        assert!(text.contains("Total params: 5,029"));
        assert!(text.contains("Non-trainable params: 0"));
        assert_eq!(summary.total_params(), 5029);
    }
}
