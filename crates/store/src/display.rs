/// Shorten a summary to at most `max_lines` non-empty lines, appending `...` when lines were
/// cut. `max_lines == 0` keeps the whole summary.
pub fn trim_summary(summary: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return summary.to_string();
    }

    let lines: Vec<&str> = summary
        .split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() <= max_lines {
        return summary.to_string();
    }

    let mut out = lines[..max_lines].join("\n");
    out.push_str("\n...");
    out
}
