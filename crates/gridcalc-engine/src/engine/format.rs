/// Format a number for display.
///
/// Integral values print without a fraction; everything else uses the
/// shortest representation that round-trips. Formula results are always
/// finite, since non-finite results become `#ARITHM!`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}
