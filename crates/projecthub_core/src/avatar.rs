//! Generated avatar URLs for users without an uploaded image.

const AVATAR_COLORS: [&str; 5] = ["50C878", "ADD8E6", "FFD700", "FF6347", "9370DB"];

/// Deterministic ui-avatars URL built from the initials of `name` and `surname`.
pub fn avatar_url(name: &str, surname: &str) -> String {
    let initials: String = [name, surname]
        .iter()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    let initials = initials.trim();
    let text = urlencoding::encode(if initials.is_empty() { "?" } else { initials });

    let seed = format!("{name}-{surname}");
    let color = AVATAR_COLORS[(string_hash(&seed).unsigned_abs() % 5) as usize];

    format!("https://ui-avatars.com/api/?background={color}&color=fff&name={text}&size=128&bold=true")
}

/// `h = unit + ((h << 5) - h)` over UTF-16 code units, where the shift
/// truncates `h` to 32 bits first and the subtraction does not wrap.
fn string_hash(value: &str) -> i64 {
    value.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit) + (shifted - hash)
    })
}
