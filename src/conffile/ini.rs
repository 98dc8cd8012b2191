// file: src/conffile/ini.rs
// version: 1.0.0
// guid: e0453a78-b5d5-4861-b36d-5ee466675e5f

//! Line-preserving INI key updates
//!
//! Only the lines for the touched key change; comments, ordering and the
//! other sections are left as they were.

/// Section name a header line opens, if it is one
fn section_of(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

/// Key an assignment line sets, if it is one
fn key_of(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with(';') {
        return None;
    }
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}

/// Index range `[start, end)` of the body lines of `section`
fn section_span(lines: &[&str], section: &str) -> Option<(usize, usize)> {
    let header = lines
        .iter()
        .position(|line| section_of(line) == Some(section))?;
    let end = lines[header + 1..]
        .iter()
        .position(|line| section_of(line).is_some())
        .map(|offset| header + 1 + offset)
        .unwrap_or(lines.len());
    Some((header + 1, end))
}

/// Set `key = value` under `[section]`
///
/// The first existing entry is rewritten and any duplicates in the same
/// section are dropped. A missing key is added after the last non-blank line
/// of the section; a missing section is appended to the end of the text.
pub fn set_value(text: &str, section: &str, key: &str, value: &str) -> String {
    let entry = format!("{} = {}", key, value);
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);

    match section_span(&lines, section) {
        Some((start, end)) => {
            let existing: Vec<usize> = (start..end)
                .filter(|&i| key_of(lines[i]) == Some(key))
                .collect();

            if let Some(&first) = existing.first() {
                for (i, line) in lines.iter().enumerate() {
                    if i == first {
                        out.push(entry.clone());
                    } else if !existing.contains(&i) {
                        out.push(line.to_string());
                    }
                }
            } else {
                // after the last non-blank body line, or right after the header
                let insert_at = (start..end)
                    .rev()
                    .find(|&i| !lines[i].trim().is_empty())
                    .map(|i| i + 1)
                    .unwrap_or(start);
                for (i, line) in lines.iter().enumerate() {
                    if i == insert_at {
                        out.push(entry.clone());
                    }
                    out.push(line.to_string());
                }
                if insert_at == lines.len() {
                    out.push(entry);
                }
            }
        }
        None => {
            out.extend(lines.iter().map(|l| l.to_string()));
            if out.last().map_or(false, |l| !l.trim().is_empty()) {
                out.push(String::new());
            }
            out.push(format!("[{}]", section));
            out.push(entry);
        }
    }

    let mut rendered = out.join("\n");
    rendered.push('\n');
    rendered
}

/// Value of `key` under `[section]`, if set
pub fn get_value(text: &str, section: &str, key: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let (start, end) = section_span(&lines, section)?;
    lines[start..end].iter().find_map(|line| {
        if key_of(line) == Some(key) {
            line.split_once('=').map(|(_, v)| v.trim().to_string())
        } else {
            None
        }
    })
}

/// Number of assignments to `key` under `[section]`
pub fn count_entries(text: &str, section: &str, key: &str) -> usize {
    let lines: Vec<&str> = text.lines().collect();
    match section_span(&lines, section) {
        Some((start, end)) => lines[start..end]
            .iter()
            .filter(|line| key_of(line) == Some(key))
            .count(),
        None => 0,
    }
}
