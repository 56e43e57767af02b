// src/admission.rs
//! Two-stage admission filter. The noise gate is a hard veto and runs first:
//! a clickbait phrase kills an item even when an alpha keyword or tracked
//! ticker appears in the same text. The alpha gate then demands a positive
//! signal before anything reaches scoring.

use crate::vocab::{self, Vocab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted(AdmitReason),
    Dropped(DropReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitReason {
    /// Macro-indicator vocabulary; inherently market-moving.
    Macro,
    /// Explicit alpha keyword (upgrade, guidance, M&A, ...).
    Alpha,
    /// Tracked high-profile ticker plus at least one sentiment cue.
    TickerWithCue,
}

impl AdmitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmitReason::Macro => "macro",
            AdmitReason::Alpha => "alpha_keyword",
            AdmitReason::TickerWithCue => "ticker_with_cue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Noise,
    QuestionTitle,
    LowSignal,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Noise => "noise_phrase",
            DropReason::QuestionTitle => "question_title",
            DropReason::LowSignal => "low_signal",
        }
    }
}

/// Decide keep/drop for one candidate. `text` is the combined lowercase
/// title+summary; `title` is the display title (question-mark check).
pub fn evaluate(title: &str, text: &str, vocab: &Vocab) -> Admission {
    if vocab::contains_any(text, &vocab.noise_phrases) {
        return Admission::Dropped(DropReason::Noise);
    }
    if title.trim_end().ends_with('?') {
        return Admission::Dropped(DropReason::QuestionTitle);
    }

    if vocab::contains_any(text, &vocab.macro_indicators) {
        return Admission::Admitted(AdmitReason::Macro);
    }
    if vocab::contains_any(text, &vocab.alpha_keywords) {
        return Admission::Admitted(AdmitReason::Alpha);
    }
    let has_cue = vocab::contains_any(text, &vocab.bull_cues)
        || vocab::contains_any(text, &vocab.bear_cues);
    if vocab::contains_any(text, &vocab.tracked_tickers) && has_cue {
        return Admission::Admitted(AdmitReason::TickerWithCue);
    }

    Admission::Dropped(DropReason::LowSignal)
}

/// Macro-indicator detection, independent of the admission outcome.
pub fn is_breaking(text: &str, vocab: &Vocab) -> bool {
    vocab::contains_any(text, &vocab.macro_indicators)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v() -> &'static Vocab {
        crate::vocab::vocab()
    }

    #[test]
    fn noise_vetoes_even_with_tracked_ticker() {
        let title = "Mom of three wins lottery, buys AAPL shares";
        let text = title.to_lowercase();
        assert_eq!(
            evaluate(title, &text, v()),
            Admission::Dropped(DropReason::Noise)
        );
    }

    #[test]
    fn question_titles_are_clickbait() {
        let title = "Should Tesla investors worry now?";
        let text = "should tesla investors worry now? tsla fell today";
        assert_eq!(
            evaluate(title, text, v()),
            Admission::Dropped(DropReason::QuestionTitle)
        );
    }

    #[test]
    fn macro_vocabulary_always_passes() {
        let title = "Fed raises rates by 25bps";
        let text = "fed raises rates by 25bps policy decision";
        assert_eq!(
            evaluate(title, text, v()),
            Admission::Admitted(AdmitReason::Macro)
        );
    }

    #[test]
    fn alpha_keyword_passes_without_ticker() {
        let title = "Retailer announces share buyback";
        let text = "retailer announces share buyback program of $2b";
        assert_eq!(
            evaluate(title, text, v()),
            Admission::Admitted(AdmitReason::Alpha)
        );
    }

    #[test]
    fn tracked_ticker_needs_a_cue() {
        let with_cue = "nvda shares surge after results";
        assert_eq!(
            evaluate("NVDA shares surge after results", with_cue, v()),
            Admission::Admitted(AdmitReason::TickerWithCue)
        );
        let without_cue = "nvda schedules shareholder meeting";
        assert_eq!(
            evaluate("NVDA schedules shareholder meeting", without_cue, v()),
            Admission::Dropped(DropReason::LowSignal)
        );
    }

    #[test]
    fn untracked_plain_headline_is_low_signal() {
        let text = "local company opens new office";
        assert_eq!(
            evaluate("Local company opens new office", text, v()),
            Admission::Dropped(DropReason::LowSignal)
        );
    }

    #[test]
    fn breaking_is_independent_of_admission() {
        assert!(is_breaking("cpi print comes in hot", v()));
        assert!(!is_breaking("chipmaker lifts guidance", v()));
    }
}
