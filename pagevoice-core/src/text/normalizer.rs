//! Text normalization for speech: strips invisible characters and math
//! delimiters, and spells out LaTeX commands as words.

use once_cell::sync::Lazy;
use regex::Regex;

/// LaTeX math delimiters, each replaced by a single space.
static MATH_DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\(|\\\)|\\\[|\\\]|\$\$|\$").expect("valid delimiter pattern"));

/// Runs of two or more whitespace characters.
static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace pattern"));

/// LaTeX commands and their spoken form.
///
/// Applied in order, each rule over the whole text before the next one.
/// Order matters: `\infty` must precede `\in`, and the bare `}` rule runs
/// last so it only sees braces no earlier rule consumed.
const LATEX_WORDS: &[(&str, &str)] = &[
    ("\\frac{", " fraction "),
    ("\\sqrt{", " square root of "),
    ("\\sum", " sum "),
    ("\\int", " integral "),
    ("\\lim", " limit "),
    ("\\infty", " infinity "),
    ("\\alpha", " alpha "),
    ("\\beta", " beta "),
    ("\\gamma", " gamma "),
    ("\\delta", " delta "),
    ("\\epsilon", " epsilon "),
    ("\\theta", " theta "),
    ("\\lambda", " lambda "),
    ("\\mu", " mu "),
    ("\\pi", " pi "),
    ("\\sigma", " sigma "),
    ("\\tau", " tau "),
    ("\\phi", " phi "),
    ("\\omega", " omega "),
    ("\\times", " times "),
    ("\\div", " divided by "),
    ("\\pm", " plus or minus "),
    ("\\leq", " less than or equal to "),
    ("\\geq", " greater than or equal to "),
    ("\\neq", " not equal to "),
    ("\\approx", " approximately equal to "),
    ("\\equiv", " equivalent to "),
    ("\\propto", " proportional to "),
    ("\\in", " in "),
    ("\\notin", " not in "),
    ("\\subset", " subset of "),
    ("\\supset", " superset of "),
    ("\\cup", " union "),
    ("\\cap", " intersection "),
    ("\\emptyset", " empty set "),
    ("\\forall", " for all "),
    ("\\exists", " there exists "),
    ("\\rightarrow", " implies "),
    ("\\leftarrow", " implied by "),
    ("\\leftrightarrow", " if and only if "),
    ("^{", " to the power of "),
    ("_{", " sub "),
    ("}", " "),
];

/// Normalize raw extracted text into speakable prose.
///
/// This function:
/// - Removes control characters (except newline, carriage return and tab)
/// - Removes zero-width characters
/// - Replaces Unicode space variants with a plain space
/// - Replaces LaTeX math delimiters with a space
/// - Spells out common LaTeX commands
/// - Collapses whitespace runs and trims the result
///
/// Never fails; normalizing an already normalized string returns it unchanged.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned = clean_chars(text);
    let cleaned = MATH_DELIMITERS.replace_all(&cleaned, " ");

    let mut spoken = cleaned.into_owned();
    for (command, words) in LATEX_WORDS {
        if spoken.contains(command) {
            spoken = spoken.replace(command, words);
        }
    }

    WHITESPACE_RUNS.replace_all(&spoken, " ").trim().to_string()
}

/// Single pass over the characters: drop control and zero-width
/// characters, turn space variants into a plain space.
fn clean_chars(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        if is_stripped_control(c) || is_zero_width(c) {
            continue;
        }
        if is_space_variant(c) {
            result.push(' ');
        } else {
            result.push(c);
        }
    }

    result
}

fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}'
    )
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200b}'..='\u{200d}' | '\u{2060}' | '\u{feff}')
}

fn is_space_variant(c: char) -> bool {
    matches!(
        c,
        '\u{a0}'
            | '\u{2000}'..='\u{200f}'
            | '\u{2028}'..='\u{202f}'
            | '\u{205f}'..='\u{206f}'
            | '\u{3000}'
    )
}
