//! Fixed R source templates for the generated-code tools.
//!
//! Templates only splice in fragments already rendered by [`crate::codegen`]; they never see
//! raw argument values.

use crate::error::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeTemplate {
    Correlation,
    TTest,
    Anova,
    LmFormula,
    Plot,
}

/// Rendered R fragments for one call, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments(Vec<(&'static str, String)>);

impl Fragments {
    pub fn insert(&mut self, name: &'static str, fragment: String) {
        self.0.push((name, fragment));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| f.as_str())
    }

    fn require(&self, name: &str) -> Result<&str, TranslationError> {
        self.get(name)
            .ok_or_else(|| TranslationError::MissingParameter(name.to_string()))
    }
}

impl CodeTemplate {
    /// Substitute `fragments` into this template.
    ///
    /// # Errors
    ///
    /// Returns an error if a fragment the selected variant needs is missing.
    pub fn render(self, fragments: &Fragments) -> Result<String, TranslationError> {
        match self {
            Self::Correlation => correlation(fragments),
            Self::TTest => t_test(fragments),
            Self::Anova => model_summary("aov", fragments),
            Self::LmFormula => model_summary("lm", fragments),
            Self::Plot => plot(fragments),
        }
    }
}

fn correlation(f: &Fragments) -> Result<String, TranslationError> {
    let x = f.require("x")?;
    let y = f.require("y")?;
    let method = f.require("method")?;
    Ok(format!(
        "x <- {x}\ny <- {y}\ncor.test(x, y, method = \"{method}\")"
    ))
}

fn t_test(f: &Fragments) -> Result<String, TranslationError> {
    let x = f.require("x")?;
    let alternative = f.require("alternative")?;
    match f.get("y") {
        None => Ok(format!(
            "x <- {x}\nt.test(x, alternative = \"{alternative}\")"
        )),
        Some(y) => {
            let paired = f.require("paired")?;
            Ok(format!(
                "x <- {x}\ny <- {y}\nt.test(x, y, paired = {paired}, alternative = \"{alternative}\")"
            ))
        }
    }
}

fn model_summary(fit: &str, f: &Fragments) -> Result<String, TranslationError> {
    let data = f.require("data")?;
    let formula = f.require("formula")?;
    Ok(format!(
        "df <- data.frame({data})\nmodel <- {fit}({formula}, data = df)\nsummary(model)"
    ))
}

fn plot(f: &Fragments) -> Result<String, TranslationError> {
    let x = f.require("x")?;
    let labels = format!(
        "labels = list(title = {}, xlab = {}, ylab = {})",
        f.require("title")?,
        f.require("xlab")?,
        f.require("ylab")?
    );
    let y = f.get("y");

    let code = match (f.require("plot_type")?, y) {
        ("histogram", None) => format!(
            "x <- {x}
hist_data <- hist(x, plot = FALSE)
list(
    breaks = hist_data$breaks,
    counts = hist_data$counts,
    density = hist_data$density,
    mids = hist_data$mids,
    summary = summary(x),
    {labels}
)"
        ),
        ("boxplot", _) => format!(
            "x <- {x}
box_stats <- boxplot.stats(x)
list(
    stats = box_stats$stats,
    n = box_stats$n,
    conf = box_stats$conf,
    out = box_stats$out,
    summary = summary(x),
    {labels}
)"
        ),
        (_, y) => {
            // An empty second sample falls back to `x` like an absent one.
            let y = y.filter(|y| *y != "c()").unwrap_or(x);
            format!(
                "x <- {x}
y <- {y}
list(
    x_range = range(x),
    y_range = range(y),
    x_summary = summary(x),
    y_summary = summary(y),
    correlation = cor(x, y),
    {labels}
)"
            )
        }
    };
    Ok(code)
}
