// src/insight/templates.rs
//! Deterministic fallback narratives. The lookup is a total function over
//! (sentiment, cluster): every combination yields non-empty text, so the
//! fallback path can never fail.

use crate::sentiment::Sentiment;
use crate::vocab::{self, Vocab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    MacroPolicy,
    AiEfficiency,
    ShareholderReturn,
    EquityDilution,
    Selloff,
    /// Title and summary are the same text: a bare disclosure, nothing more.
    BareFact,
    Generic,
}

pub const ALL_CLUSTERS: [Cluster; 7] = [
    Cluster::MacroPolicy,
    Cluster::AiEfficiency,
    Cluster::ShareholderReturn,
    Cluster::EquityDilution,
    Cluster::Selloff,
    Cluster::BareFact,
    Cluster::Generic,
];

const AI_EFFICIENCY_KEYS: [&str; 2] = ["ai", "efficiency"];
const SHAREHOLDER_KEYS: [&str; 2] = ["buyback", "dividend"];
const DILUTION_KEYS: [&str; 2] = ["offering", "dilution"];
const SELLOFF_KEYS: [&str; 2] = ["crash", "sink"];

fn hits_any(text: &str, keys: &[&str]) -> bool {
    keys.iter().any(|k| text.contains(k))
}

/// Pick the narrative cluster for combined lowercase text. Checked in
/// priority order; macro policy wins over everything.
pub fn detect_cluster(text: &str, bare_fact: bool, vocab: &Vocab) -> Cluster {
    if vocab::contains_any(text, &vocab.macro_indicators) {
        return Cluster::MacroPolicy;
    }
    if hits_any(text, &AI_EFFICIENCY_KEYS) {
        return Cluster::AiEfficiency;
    }
    if hits_any(text, &SHAREHOLDER_KEYS) {
        return Cluster::ShareholderReturn;
    }
    if hits_any(text, &DILUTION_KEYS) {
        return Cluster::EquityDilution;
    }
    if hits_any(text, &SELLOFF_KEYS) {
        return Cluster::Selloff;
    }
    if bare_fact {
        return Cluster::BareFact;
    }
    Cluster::Generic
}

/// Total lookup. `source` is woven into the generic arms the way an analyst
/// would cite where the read came from.
pub fn narrative_for(sentiment: Sentiment, cluster: Cluster, source: &str) -> String {
    match sentiment {
        Sentiment::Bullish => match cluster {
            Cluster::MacroPolicy => {
                "Macro data surprising in the market's favor supports risk appetite; \
                 rate-sensitive growth names typically benefit first."
                    .to_string()
            }
            Cluster::AiEfficiency => {
                "Adoption of AI-driven efficiency measures reads as a structural margin \
                 story rather than a one-off; operating leverage should compound if the \
                 rollout holds."
                    .to_string()
            }
            Cluster::ShareholderReturn => {
                "An aggressive capital-return program signals management confidence in \
                 cash flow; the downside tends to be well supported while the buyback \
                 window stays open."
                    .to_string()
            }
            _ => format!(
                "The report carries momentum that could become a trigger for earnings or \
                 competitive upside; positioning data around {source} coverage points to \
                 inflows building gradually."
            ),
        },
        Sentiment::Bearish => match cluster {
            Cluster::MacroPolicy => {
                "A print like this tightens financial conditions in the market's mind; \
                 expect defensive rotation until the next data point argues otherwise."
                    .to_string()
            }
            Cluster::EquityDilution => {
                "Issuing additional common stock dilutes existing holders, and proceeds \
                 earmarked for debt service deepen the risk; a conservative stance is \
                 warranted."
                    .to_string()
            }
            Cluster::Selloff => {
                "A sharp decline on heavy volume reflects fear rather than rotation; \
                 until a floor is confirmed, buying the first bounce is premature."
                    .to_string()
            }
            _ => format!(
                "The market is treating this as an early sign of deteriorating \
                 fundamentals; {source} reporting implies elevated near-term volatility \
                 and argues for defensive sizing."
            ),
        },
        Sentiment::Neutral => match cluster {
            Cluster::MacroPolicy => {
                "Policy-sensitive data tends to reprice rate expectations before equities \
                 react; the first sessions after the release usually set the tone."
                    .to_string()
            }
            Cluster::BareFact => {
                "The item reads as a bare factual disclosure; without follow-on detail \
                 its market impact should stay limited."
                    .to_string()
            }
            _ => format!(
                "The catalyst lacks a decisive direction and is likely being absorbed at \
                 current prices; watching {source} follow-ups and hard data is the \
                 prudent course."
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::vocab;

    #[test]
    fn lookup_is_total_and_non_empty() {
        for s in [Sentiment::Bullish, Sentiment::Bearish, Sentiment::Neutral] {
            for c in ALL_CLUSTERS {
                let n = narrative_for(s, c, "TestWire");
                assert!(!n.trim().is_empty(), "{s:?}/{c:?} produced empty text");
            }
        }
    }

    #[test]
    fn macro_wins_over_other_clusters() {
        let text = "fed weighs rate cut as buyback wave builds";
        assert_eq!(detect_cluster(text, false, vocab()), Cluster::MacroPolicy);
    }

    #[test]
    fn cluster_priorities_follow_declaration_order() {
        assert_eq!(
            detect_cluster("efficiency drive pays off", false, vocab()),
            Cluster::AiEfficiency
        );
        assert_eq!(
            detect_cluster("board approves dividend increase", false, vocab()),
            Cluster::ShareholderReturn
        );
        assert_eq!(
            detect_cluster("secondary offering prices tonight", false, vocab()),
            Cluster::EquityDilution
        );
        assert_eq!(
            detect_cluster("shares sink in late trade", false, vocab()),
            Cluster::Selloff
        );
    }

    #[test]
    fn bare_fact_needs_the_flag_and_no_keyword_cluster() {
        assert_eq!(
            detect_cluster("company relocates headquarters", true, vocab()),
            Cluster::BareFact
        );
        assert_eq!(
            detect_cluster("company relocates headquarters", false, vocab()),
            Cluster::Generic
        );
    }
}
