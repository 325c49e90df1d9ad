/// Byte length of the character starting with `byte`, read from its count of
/// leading one bits. Returns `None` for `0xFE`/`0xFF`, which no encoding
/// scheme of up to six bytes produces.
pub fn utf8_char_len(byte: u8) -> Option<usize> {
    match byte.leading_ones() as usize {
        0 => Some(1),
        len if len > 6 => None,
        len => Some(len),
    }
}

/// Levenshtein distance between `a` and `b`, counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single row of the DP table, `row[j]` is the distance from a[..i] to b[..j].
    let mut row = (0..=b.len()).collect::<Vec<_>>();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }
    row[b.len()]
}
