//! Angle-Aware Splitter, spec.md §4.5.2, and the default-argument collapse
//! step from §4.5 rule 5. Both are pure text transforms shared by the Field
//! and Method/Parameter parsers, so they live here rather than under either.

/// Splits `text` on top-level commas, where "top-level" means outside any
/// `<...>` nesting. Angle brackets are the only depth tracked here — `()` and
/// `{}` are handled separately by [`collapse_default_expressions`] before a
/// parameter list ever reaches this function.
///
/// Returns `Err(())` (an unbalanced-angle-bracket `InvalidMethodDeclaration`,
/// per spec.md §4.5.2) on unbalanced input. Empty input yields `Ok(vec![])`.
pub fn split_params(text: &str) -> Result<Vec<String>, ()> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut depth: i32 = 0;
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return Err(());
                }
                current.push(c);
            }
            ',' if depth == 0 => {
                pieces.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(());
    }
    pieces.push(current.trim().to_string());
    Ok(pieces)
}

/// Replaces every top-level `(...)` or `{...}` region with its empty form
/// (`()`/`{}`), neutralizing default-value expressions so that commas inside
/// them don't get mistaken for parameter separators. Nesting of either kind
/// inside the other is tracked correctly since the whole region, brackets and
/// contents alike, is discarded down to its outer pair.
pub fn collapse_default_expressions(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' || c == '{' {
            let close = if c == '(' { ')' } else { '}' };
            let mut depth = 1i32;
            let mut j = i + 1;
            while j < chars.len() && depth > 0 {
                if chars[j] == c {
                    depth += 1;
                } else if chars[j] == close {
                    depth -= 1;
                }
                j += 1;
            }
            result.push(c);
            result.push(close);
            i = j;
            continue;
        }
        result.push(c);
        i += 1;
    }
    result
}

/// Finds the matching `>` for the `<` at char index `open_at` in `text`,
/// tracking nested angle-bracket depth (e.g. `std::map<K, std::vector<V>>`).
/// Returns the char index of the matching `>`, or `None` if unbalanced.
pub fn matching_angle_close(text: &str, open_at: usize) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    debug_assert_eq!(chars.get(open_at), Some(&'<'));
    let mut depth = 0i32;
    for (i, &c) in chars.iter().enumerate().skip(open_at) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
