//! Mixed-script tokenizer for lexical scoring
//!
//! Latin/digit runs become lowercase words. Han runs produce every single
//! character plus every adjacent bigram, which approximates word matching
//! for Chinese text without a segmentation dictionary.

/// True for CJK unified ideographs (basic, extension A, compatibility)
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF)
}

/// Split text into index terms
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut han: Vec<char> = Vec::new();

    for c in text.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            han.push(c);
        } else if c.is_alphanumeric() {
            flush_han(&mut han, &mut tokens);
            word.extend(c.to_lowercase());
        } else {
            flush_word(&mut word, &mut tokens);
            flush_han(&mut han, &mut tokens);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_han(&mut han, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    if !word.is_empty() {
        tokens.push(std::mem::take(word));
    }
}

fn flush_han(run: &mut Vec<char>, tokens: &mut Vec<String>) {
    for c in run.iter() {
        tokens.push(c.to_string());
    }
    for pair in run.windows(2) {
        tokens.push(pair.iter().collect());
    }
    run.clear();
}
