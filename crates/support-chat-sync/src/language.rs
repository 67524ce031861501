// Cheap "is this probably not English" check deciding whether a message gets a
// translate control. False negatives only cost a missing control.

/// Common words of the languages the support desk sees most, lowercase
const FOREIGN_WORDS: &[&str] = &[
    // Malay / Indonesian
    "saya", "anda", "dengan", "untuk", "dari", "tidak", "yang", "ada", "dia",
    "terima kasih", "selamat", "tolong", "masalah", "bagaimana",
    // Vietnamese
    "tôi", "bạn", "với", "để", "từ", "không", "mà", "có", "anh", "chị",
    "xin chào", "cảm ơn", "giúp", "vấn đề", "như thế nào",
    // Thai
    "ผม", "คุณ", "กับ", "เพื่อ", "จาก", "ไม่", "ที่", "มี", "เขา",
    "ขอบคุณ", "สวัสดี", "ช่วย", "ปัญหา",
];

fn is_non_latin_script(c: char) -> bool {
    matches!(c,
        '\u{0E00}'..='\u{0E7F}'     // Thai
        | '\u{1780}'..='\u{17FF}'   // Khmer
        | '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
    )
}

/// Whether `text` looks like it needs translating to English
pub fn needs_translation(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if text.chars().any(is_non_latin_script) {
        return true;
    }

    // Whole-word match so "media" does not count as "dia"
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let padded = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));

    FOREIGN_WORDS
        .iter()
        .any(|word| padded.contains(&format!(" {} ", word)))
}
