use regex::{NoExpand, Regex};

/// Domain keywords highlighted in every generated insight, in addition to the
/// tags produced by the model.
pub const DOMAIN_KEYWORDS: [&str; 7] = [
    "growth",
    "inflation",
    "fiscal deficit",
    "trade",
    "market",
    "RBI",
    "Fed",
];

/// Wraps every case-insensitive whole-word occurrence of each keyword in `**`
/// emphasis markers, replacing the matched text with the keyword's canonical
/// spelling. Keywords are applied one after another, so a keyword that appears
/// inside an already-wrapped segment gets wrapped again.
pub fn highlight(text: &str, keywords: &[&str]) -> String {
    let mut highlighted = text.to_string();

    for word in keywords {
        if word.is_empty() {
            continue;
        }
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
            .expect("escaped keyword is a valid pattern");
        let wrapped = format!("**{word}**");
        highlighted = pattern
            .replace_all(&highlighted, NoExpand(&wrapped))
            .into_owned();
    }

    highlighted
}
