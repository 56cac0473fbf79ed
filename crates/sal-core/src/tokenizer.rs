use regex::Regex;
use std::sync::LazyLock;

/// Emoticons, misc symbols & pictographs, transport & map, misc symbols, dingbats.
static PICTOGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]",
    )
    .unwrap()
});
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,!?;:]").unwrap());

/// Split text into tokens, isolating pictographs and `. , ! ? ; :` as their own tokens.
/// Case is preserved; folding happens at lookup time.
/// No stemming, no stop-word removal.
pub fn tokenize(text: &str) -> Vec<String> {
    let spaced = PICTOGRAPH.replace_all(text, " $0 ");
    let spaced = PUNCTUATION.replace_all(&spaced, " $0 ");
    spaced.split_whitespace().map(str::to_string).collect()
}
