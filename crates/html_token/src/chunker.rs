//! Chunk plans for streaming tests.
//!
//! A plan says where an input is cut before it is fed to a source piece by
//! piece. Deterministic plans cover fixed sizes and cuts around markup
//! delimiters; seeded plans pick random cut sets reproducibly.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Cuts only at UTF-8 character boundaries, for `&str` sources.
    Utf8Aligned,
    /// Cuts anywhere, for byte sources that must reassemble split sequences.
    ByteStream,
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::Utf8Aligned => f.write_str("utf8"),
            BoundaryPolicy::ByteStream => f.write_str("bytes"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkPlan {
    Fixed { size: usize, policy: BoundaryPolicy },
    /// Cut before each listed offset.
    Boundaries { indices: Vec<usize>, policy: BoundaryPolicy },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size, policy } => write!(f, "fixed size={size} policy={policy}"),
            ChunkPlan::Boundaries { indices, policy } => write!(
                f,
                "boundaries count={} policy={policy} indices={indices:?}",
                indices.len()
            ),
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize, policy: BoundaryPolicy) -> Self {
        ChunkPlan::Fixed {
            size: size.max(1),
            policy,
        }
    }

    pub fn boundaries(indices: Vec<usize>, policy: BoundaryPolicy) -> Self {
        ChunkPlan::Boundaries { indices, policy }
    }

    pub fn policy(&self) -> BoundaryPolicy {
        match self {
            ChunkPlan::Fixed { policy, .. } | ChunkPlan::Boundaries { policy, .. } => *policy,
        }
    }

    /// Cut offsets inside `input`, sorted, without 0 and `input.len()`.
    pub fn cuts(&self, input: &str) -> Vec<usize> {
        let raw: Vec<usize> = match self {
            ChunkPlan::Fixed { size, .. } => {
                let size = (*size).max(1);
                (1..input.len()).filter(|i| i % size == 0).collect()
            }
            ChunkPlan::Boundaries { indices, .. } => indices.clone(),
        };
        let mut cuts = filter_boundaries(input, &raw, self.policy());
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    }

    /// Splits `input` into byte chunks along the plan.
    pub fn split<'a>(&self, input: &'a str) -> Vec<&'a [u8]> {
        let bytes = input.as_bytes();
        let mut chunks = Vec::new();
        let mut start = 0;
        for cut in self.cuts(input) {
            chunks.push(&bytes[start..cut]);
            start = cut;
        }
        if start < bytes.len() {
            chunks.push(&bytes[start..]);
        }
        chunks
    }

    /// Splits `input` into string chunks. Cuts that are not character
    /// boundaries are skipped, whatever the policy.
    pub fn split_str<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let mut chunks = Vec::new();
        let mut start = 0;
        for cut in self.cuts(input) {
            if input.is_char_boundary(cut) {
                chunks.push(&input[start..cut]);
                start = cut;
            }
        }
        if start < input.len() {
            chunks.push(&input[start..]);
        }
        chunks
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

/// Deterministic plus seeded plans for `input`.
///
/// - Deterministic plans use fixed sizes and cuts on both sides of markup
///   delimiters, quotes and character references.
/// - Seeded plans are reproducible from `seed`.
pub fn build_chunk_plans(
    input: &str,
    fuzz_runs: usize,
    seed: u64,
    policy: BoundaryPolicy,
) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();
    for size in [1usize, 2, 3, 5, 8, 13, 64] {
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan: ChunkPlan::fixed(size, policy),
        });
    }

    let markup = markup_boundaries(input, policy);
    if !markup.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("markup-boundaries count={}", markup.len()),
            plan: ChunkPlan::boundaries(markup.clone(), policy),
        });
    }

    let mut candidates = all_boundaries(input, policy);
    if candidates.is_empty() {
        return plans;
    }
    candidates.extend(markup);
    candidates.sort_unstable();
    candidates.dedup();
    for run in 0..fuzz_runs {
        let run_seed = seed.wrapping_add(run as u64);
        let mut rng = Lcg::new(run_seed);
        let mut picks = candidates.clone();
        rng.shuffle(&mut picks);
        picks.truncate(1 + rng.gen_range(candidates.len().min(32)));
        picks.sort_unstable();
        plans.push(ChunkPlanCase {
            label: format!("seeded boundaries seed=0x{run_seed:016x}"),
            plan: ChunkPlan::boundaries(picks, policy),
        });
    }
    plans
}

/// Every offset inside `input` that the policy allows as a cut.
pub fn all_boundaries(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let raw: Vec<usize> = (1..input.len()).collect();
    filter_boundaries(input, &raw, policy)
}

fn markup_boundaries(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, &b) in input.as_bytes().iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'&' | b';' | b'/' | b'=') {
            out.push(i);
            out.push(i + 1);
        }
    }
    out.sort_unstable();
    out.dedup();
    filter_boundaries(input, &out, policy)
}

fn filter_boundaries(input: &str, indices: &[usize], policy: BoundaryPolicy) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| i > 0 && i < input.len())
        .filter(|&i| policy == BoundaryPolicy::ByteStream || input.is_char_boundary(i))
        .collect()
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 33) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_plans_never_cut_inside_a_character() {
        let input = "a\u{e9}<b>\u{20ac}</b>";
        for case in build_chunk_plans(input, 8, 7, BoundaryPolicy::Utf8Aligned) {
            let chunks = case.plan.split(input);
            assert_eq!(chunks.concat(), input.as_bytes(), "{}", case.label);
            for chunk in chunks {
                assert!(std::str::from_utf8(chunk).is_ok(), "{}", case.label);
            }
        }
    }

    #[test]
    fn byte_plans_may_split_sequences() {
        let input = "\u{20ac}";
        let plan = ChunkPlan::fixed(1, BoundaryPolicy::ByteStream);
        assert_eq!(plan.split(input).len(), 3);
        assert_eq!(plan.split_str(input), vec![input]);
    }

    #[test]
    fn seeded_plans_are_reproducible() {
        let input = r#"<p class="x">a &amp; b</p>"#;
        let first = build_chunk_plans(input, 4, 42, BoundaryPolicy::Utf8Aligned);
        let second = build_chunk_plans(input, 4, 42, BoundaryPolicy::Utf8Aligned);
        let plans = |cases: &[ChunkPlanCase]| {
            cases.iter().map(|case| case.plan.clone()).collect::<Vec<_>>()
        };
        assert_eq!(plans(&first), plans(&second));
    }
}
