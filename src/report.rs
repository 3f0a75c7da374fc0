//! Plain-text rendering of an [`Analysis`].

use std::fmt;

use crate::analyze::Analysis;

const RULE_WIDTH: usize = 60;
const FREQ_RULE_WIDTH: usize = 40;

/// Group digits in threes: `50000` -> `"50,000"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Text report: summary table followed by the frequency table.
pub struct Report<'a>(pub &'a Analysis);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;

        writeln!(
            f,
            "Simulation Results (n = {} experiments, p = {})",
            thousands(a.trials),
            a.p
        )?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "{:<20} {:>12} {:>12} {:>12}",
            "Metric", "Theoretical", "Simulated", "Difference"
        )?;
        for row in &a.summary.rows {
            writeln!(
                f,
                "{:<20} {:>12.4} {:>12.4} {:>12.4}",
                row.metric.label(),
                row.theoretical,
                row.simulated,
                row.difference
            )?;
        }

        let shown = a.displayed_frequencies();
        writeln!(f)?;
        writeln!(f, "Outcome frequencies ({} smallest values):", shown.len())?;
        writeln!(f, "{}", "-".repeat(FREQ_RULE_WIDTH))?;
        for row in shown {
            writeln!(
                f,
                "{} tosses: {:.4} (theoretical: {:.4})",
                row.value, row.empirical, row.theoretical
            )?;
        }
        Ok(())
    }
}

/// Render `analysis` as text.
pub fn render_report(analysis: &Analysis) -> String {
    Report(analysis).to_string()
}
