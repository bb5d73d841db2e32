use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

use crate::DocId;

lazy_static! {
    /// Links first, then words with one inner apostrophe, then plain alphanumeric runs.
    static ref TOKEN_RE: Regex =
        Regex::new(r"\[\[[^\[]+?\]\]|[a-zA-Z0-9]+'[a-zA-Z0-9]+|[a-zA-Z0-9]+").expect("valid regex");
    static ref LINK_RE: Regex = Regex::new(r"^\[\[[^\[]+?\]\]$").expect("valid regex");
    static ref WORD_RE: Regex = Regex::new(r"[a-zA-Z0-9]+'[a-zA-Z0-9]+|[a-zA-Z0-9]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd",
            "your","yours","yourself","yourselves","he","him","his","himself","she","she's","her","hers","herself",
            "it","it's","its","itself","they","them","their","theirs","themselves","what","which","who","whom",
            "this","that","that'll","these","those","am","is","are","was","were","be","been","being",
            "have","has","had","having","do","does","did","doing","a","an","the","and","but","if","or",
            "because","as","until","while","of","at","by","for","with","about","against","between","into",
            "through","during","before","after","above","below","to","from","up","down","in","out","on","off",
            "over","under","again","further","then","once","here","there","when","where","why","how",
            "all","any","both","each","few","more","most","other","some","such","no","nor","not","only","own",
            "same","so","than","too","very","s","t","can","will","just","don","don't","should","should've",
            "now","d","ll","m","o","re","ve","y","ain","aren","aren't","couldn","couldn't","didn","didn't",
            "doesn","doesn't","hadn","hadn't","hasn","hasn't","haven","haven't","isn","isn't","ma",
            "mightn","mightn't","mustn","mustn't","needn","needn't","shan","shan't","shouldn","shouldn't",
            "wasn","wasn't","weren","weren't","won","won't","wouldn","wouldn't"
        ];
        words.iter().copied().collect()
    };
}

/// A raw token before stop-word removal and stemming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Word(&'a str),
    /// `[[destination|display]]` or `[[destination]]`; `words` are the display words.
    Link { destination: &'a str, words: Vec<&'a str> },
}

/// Normalizer output for a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub stems: Vec<String>,
    pub links: BTreeSet<DocId>,
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

pub fn is_link(token: &str) -> bool { LINK_RE.is_match(token) }

/// Split a `[[...]]` link into its display words and its trimmed destination title.
pub fn split_link(link: &str) -> (Vec<&str>, &str) {
    let inner = link
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
        .unwrap_or(link);

    let (destination, display) = if inner.contains('|') {
        let mut parts = inner.split('|');
        let destination = parts.next().unwrap_or("");
        let display = parts.next().unwrap_or("");
        (destination, display)
    } else {
        (inner, inner)
    };

    let words = WORD_RE.find_iter(display).map(|m| m.as_str()).collect();
    (words, destination.trim())
}

/// Split text into words and links, scanning left to right without overlap.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    TOKEN_RE
        .find_iter(text)
        .map(|mat| {
            let raw = mat.as_str();
            if is_link(raw) {
                let (words, destination) = split_link(raw);
                Token::Link { destination, words }
            } else {
                Token::Word(raw)
            }
        })
        .collect()
}

/// Lowercase, drop stop words, apply Porter's stemmer. `None` means the word contributes nothing.
pub fn normalize_word(word: &str) -> Option<String> {
    let lowered = word.to_ascii_lowercase();
    if is_stopword(&lowered) { return None; }
    Some(porter_stemmer::stem(&lowered))
}

/// Normalize `"{title} {body}"`, resolving link destinations through `resolve`.
///
/// Destinations that `resolve` does not know are dropped silently.
pub fn process_document<F>(title: &str, body: &str, resolve: F) -> Normalized
where
    F: Fn(&str) -> Option<DocId>,
{
    let text = format!("{title} {body}");
    let mut out = Normalized::default();
    for token in tokenize(&text) {
        match token {
            Token::Word(word) => out.stems.extend(normalize_word(word)),
            Token::Link { destination, words } => {
                if let Some(id) = resolve(destination) {
                    out.links.insert(id);
                }
                out.stems.extend(words.into_iter().filter_map(normalize_word));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's [[Run|run]]!");
        assert_eq!(t[0], Token::Word("Running"));
        assert_eq!(t[1], Token::Word("runner's"));
        assert_eq!(t[2], Token::Link { destination: "Run", words: vec!["run"] });
    }

    #[test]
    fn nested_bracket_is_not_a_link() {
        let t = tokenize("[[outer [[inner]] tail]]");
        assert_eq!(t[0], Token::Word("outer"));
        assert_eq!(t[1], Token::Link { destination: "inner", words: vec!["inner"] });
        assert_eq!(t[2], Token::Word("tail"));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn stop_words_vanish() {
        assert_eq!(normalize_word("The"), None);
        assert_eq!(normalize_word("don't"), None);
        assert_eq!(normalize_word("Jumping").as_deref(), Some("jump"));
    }

    #[test]
    fn stems_follow_classic_porter() {
        for (word, stem) in [
            ("fairly", "fairli"),
            ("skies", "ski"),
            ("news", "new"),
            ("generously", "gener"),
            ("caresses", "caress"),
            ("ponies", "poni"),
            ("example", "exampl"),
            ("characters", "charact"),
        ] {
            assert_eq!(normalize_word(word).as_deref(), Some(stem), "stem of {word}");
        }
    }
}
