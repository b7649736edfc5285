//! Anchor resolution — locating natural-language targets inside the document.
//!
//! Given a target phrase and a side (`before`/`after`), resolution tries a
//! strict priority order and stops at the first success:
//!
//! 1. Exact literal substring match.
//! 2. Paired-anchor patterns ("insert X between word A and word B"),
//!    extracted from the command's explanation or action phrases. Both
//!    words are located independently; whichever occurs earlier in
//!    document order is the effective anchor and the insertion point is
//!    immediately after it — not necessarily the word named first.
//! 3. Partial-word fallback: the target is split on whitespace and each
//!    word longer than two characters is searched in split order.
//!
//! Pattern matchers are a replaceable ordered list so alternate locales or
//! grammars can be swapped in without touching the splice algorithm.
//! All returned byte indices lie on char boundaries.

// ─── Types ───────────────────────────────────────────────────────────────────

/// Which side of the anchor the edit lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSide {
    Before,
    After,
}

/// Which strategy located the anchor — diagnostic, reported upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStrategy {
    Exact,
    PairedAnchor,
    PartialWord,
}

/// A resolved insertion point.
#[derive(Debug, Clone, Copy)]
pub struct AnchorHit {
    /// Byte offset into the document where content is spliced.
    pub index: usize,
    /// The side the splice treats as the anchor side.
    pub side: AnchorSide,
    pub strategy: AnchorStrategy,
}

/// A paired anchor extracted from a "between A and B" phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedAnchor {
    pub word_a: String,
    pub word_b: String,
}

/// One grammar for extracting a paired anchor from a phrase.
pub trait PairedAnchorPattern: Send + Sync {
    fn extract(&self, phrase: &str) -> Option<PairedAnchor>;
}

// ─── Between-Words Pattern ───────────────────────────────────────────────────

/// Arabic "بين A وB" (with optional "كلمة" fillers) and English
/// "between A and B".
pub struct BetweenWordsPattern;

impl PairedAnchorPattern for BetweenWordsPattern {
    fn extract(&self, phrase: &str) -> Option<PairedAnchor> {
        const OPENERS: &[&str] = &["بين كلمة ", "بين ", "between "];
        const SEPARATORS: &[&str] = &[" وكلمة ", " و ", " and "];

        for opener in OPENERS {
            let Some(start) = phrase.find(opener) else {
                continue;
            };
            let rest = &phrase[start + opener.len()..];
            for sep in SEPARATORS {
                if let Some(sep_idx) = rest.find(sep) {
                    let word_a = rest[..sep_idx].trim();
                    // The second word runs to the end of the clause.
                    let word_b = rest[sep_idx + sep.len()..]
                        .split(['،', ',', '.'])
                        .next()
                        .unwrap_or("")
                        .trim();
                    if !word_a.is_empty() && !word_b.is_empty() {
                        return Some(PairedAnchor {
                            word_a: word_a.to_string(),
                            word_b: word_b.to_string(),
                        });
                    }
                }
            }
            // Arabic conjunction "و" attaches to the following word: "بين A وB".
            if let Some(sep_idx) = rest.find(" و") {
                let word_a = rest[..sep_idx].trim();
                let word_b = rest[sep_idx + " و".len()..]
                    .split(['،', ',', '.'])
                    .next()
                    .unwrap_or("")
                    .trim();
                if !word_a.is_empty() && !word_b.is_empty() {
                    return Some(PairedAnchor {
                        word_a: word_a.to_string(),
                        word_b: word_b.to_string(),
                    });
                }
            }
        }
        None
    }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Anchor resolver with an ordered list of paired-anchor grammars.
pub struct AnchorResolver {
    patterns: Vec<Box<dyn PairedAnchorPattern>>,
}

impl Default for AnchorResolver {
    fn default() -> Self {
        Self {
            patterns: vec![Box::new(BetweenWordsPattern)],
        }
    }
}

impl AnchorResolver {
    pub fn new(patterns: Vec<Box<dyn PairedAnchorPattern>>) -> Self {
        Self { patterns }
    }

    /// Resolve an insertion point for `target` in `document`.
    ///
    /// `phrases` are the natural-language texts (explanation, action) the
    /// paired-anchor tier may mine for a "between A and B" construction.
    /// Returns `None` when every tier fails — the caller degrades to an
    /// end-insert.
    pub fn resolve(
        &self,
        document: &str,
        target: &str,
        side: AnchorSide,
        phrases: &[&str],
    ) -> Option<AnchorHit> {
        if let Some(hit) = self.resolve_exact(document, target, side) {
            return Some(hit);
        }
        if let Some(hit) = self.resolve_paired(document, phrases) {
            return Some(hit);
        }
        self.resolve_partial(document, target, side)
    }

    /// Tier 1: literal, case-sensitive substring match.
    fn resolve_exact(&self, document: &str, target: &str, side: AnchorSide) -> Option<AnchorHit> {
        if target.is_empty() {
            return None;
        }
        let idx = document.find(target)?;
        let index = match side {
            AnchorSide::After => idx + target.len(),
            AnchorSide::Before => idx,
        };
        Some(AnchorHit {
            index,
            side,
            strategy: AnchorStrategy::Exact,
        })
    }

    /// Tier 2: "between A and B". The earlier-occurring word in document
    /// order is the effective anchor; insertion lands immediately after it.
    fn resolve_paired(&self, document: &str, phrases: &[&str]) -> Option<AnchorHit> {
        for phrase in phrases {
            for pattern in &self.patterns {
                let Some(pair) = pattern.extract(phrase) else {
                    continue;
                };
                let (Some(idx_a), Some(idx_b)) =
                    (document.find(&pair.word_a), document.find(&pair.word_b))
                else {
                    // Either word absent: this extraction fails, fall through.
                    continue;
                };
                let (earlier_idx, earlier_word) = if idx_a <= idx_b {
                    (idx_a, pair.word_a.as_str())
                } else {
                    (idx_b, pair.word_b.as_str())
                };
                return Some(AnchorHit {
                    index: earlier_idx + earlier_word.len(),
                    side: AnchorSide::After,
                    strategy: AnchorStrategy::PairedAnchor,
                });
            }
        }
        None
    }

    /// Tier 3: first document hit among the target's own words (longer than
    /// two chars), tried in split order.
    fn resolve_partial(&self, document: &str, target: &str, side: AnchorSide) -> Option<AnchorHit> {
        for word in target.split_whitespace() {
            if word.chars().count() <= 2 {
                continue;
            }
            if let Some(idx) = document.find(word) {
                let index = match side {
                    AnchorSide::After => idx + word.len(),
                    AnchorSide::Before => idx,
                };
                return Some(AnchorHit {
                    index,
                    side,
                    strategy: AnchorStrategy::PartialWord,
                });
            }
        }
        None
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
