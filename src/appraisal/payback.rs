//! Payback period (PRI): periods needed for cumulative flows to recover the outlay

/// Number of periods until the accumulated flows cover the period-0 outlay.
///
/// - No outlay (`flows[0] >= 0` or empty series): `Some(0.0)`.
/// - Recovered in period `i`: `(i - 1) + fraction`, where `fraction` is the
///   share of period `i`'s flow needed to close the remaining shortfall,
///   assuming the flow arrives evenly within the period.
/// - Never recovered within the series: `None`.
pub fn payback_period(flows: &[f64]) -> Option<f64> {
    let initial_outlay = match flows.first() {
        Some(&first) if first < 0.0 => first.abs(),
        _ => return Some(0.0),
    };

    let mut accumulated = 0.0;

    for (i, &flow) in flows.iter().enumerate().skip(1) {
        accumulated += flow;

        if accumulated >= initial_outlay {
            let shortfall_before = initial_outlay - (accumulated - flow);
            let fraction = if flow != 0.0 { shortfall_before / flow } else { 0.0 };
            return Some((i - 1) as f64 + fraction);
        }
    }

    None
}
