//! Model-agnostic search over next-token logits.
//!
//! Both strategies take a scorer that maps a decoder prefix (starting with
//! the decoder start token) to logits for the next position, which keeps
//! them independent of any tensor library.

use anyhow::Result;
use rand::Rng;
use std::cmp::Ordering;

use crate::config::GenerationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub decoder_start: u32,
    pub eos: u32,
}

/// Tokens that would complete an n-gram already present in `sequence`.
pub fn banned_ngram_tokens(sequence: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || sequence.len() < n {
        return Vec::new();
    }
    let prefix = &sequence[sequence.len() - (n - 1)..];
    let mut banned: Vec<u32> = sequence
        .windows(n)
        .filter(|window| &window[..n - 1] == prefix)
        .map(|window| window[n - 1])
        .collect();
    banned.sort_unstable();
    banned.dedup();
    banned
}

/// Applies the repeated n-gram ban and the minimum-length EOS suppression.
pub fn shape_logits(
    logits: &mut [f32],
    sequence: &[u32],
    generation: &GenerationConfig,
    tokens: SpecialTokens,
) {
    for token in banned_ngram_tokens(sequence, generation.no_repeat_ngram_size) {
        if let Some(logit) = logits.get_mut(token as usize) {
            *logit = f32::NEG_INFINITY;
        }
    }
    if sequence.len() < generation.min_length {
        if let Some(logit) = logits.get_mut(tokens.eos as usize) {
            *logit = f32::NEG_INFINITY;
        }
    }
}

pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits.iter().map(|l| (l - max).exp()).sum();
    let log_sum = sum.ln() + max;
    logits.iter().map(|l| l - log_sum).collect()
}

/// The `k` largest finite values as `(index, value)`, best first.
fn top_entries(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut entries: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as u32, *v))
        .collect();
    let descending = |a: &(u32, f32), b: &(u32, f32)| b.1.total_cmp(&a.1);
    if k == 0 {
        return Vec::new();
    }
    if entries.len() > k {
        entries.select_nth_unstable_by(k - 1, descending);
        entries.truncate(k);
    }
    entries.sort_by(descending);
    entries
}

/// Temperature, then top-k, then top-p. Filtered entries become `-inf`.
/// A `top_k` of zero disables the top-k cut.
pub fn warp_scores(scores: &mut [f32], temperature: f64, top_k: usize, top_p: f64) {
    let temperature = temperature as f32;
    for score in scores.iter_mut() {
        *score /= temperature;
    }

    let mut order: Vec<usize> = (0..scores.len()).filter(|&i| scores[i].is_finite()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut keep = order.len();
    if top_k > 0 {
        keep = keep.min(top_k);
    }
    if top_p < 1.0 && keep > 0 {
        let max = scores[order[0]];
        let weights: Vec<f64> = order[..keep]
            .iter()
            .map(|&i| f64::from(scores[i] - max).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        let mut cumulative = 0.0;
        for (n, weight) in weights.iter().enumerate() {
            cumulative += weight / total;
            if cumulative >= top_p {
                keep = n + 1;
                break;
            }
        }
    }

    for &i in &order[keep..] {
        scores[i] = f32::NEG_INFINITY;
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    beam: usize,
    token: u32,
    /// Cumulative log-probability of the extended beam.
    log_prob: f32,
    /// Warped score the draw is weighted by.
    weight: f32,
}

/// Draws up to `n` candidates, each with probability proportional to
/// `exp(weight)` among those not yet drawn.
fn draw_without_replacement<R>(pool: &[Candidate], n: usize, rng: &mut R) -> Vec<Candidate>
where
    R: Rng + ?Sized,
{
    let max = pool.iter().map(|c| c.weight).fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return Vec::new();
    }
    let mut weights: Vec<f64> = pool.iter().map(|c| f64::from(c.weight - max).exp()).collect();

    let mut drawn = Vec::with_capacity(n);
    while drawn.len() < n {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            break;
        }
        let mut target = rng.gen::<f64>() * total;
        let chosen = weights
            .iter()
            .position(|&w| {
                if w > 0.0 && target < w {
                    return true;
                }
                target -= w;
                false
            })
            .or_else(|| weights.iter().rposition(|&w| w > 0.0));
        let Some(index) = chosen else {
            break;
        };
        drawn.push(pool[index]);
        weights[index] = 0.0;
    }
    drawn
}

#[derive(Debug, Clone)]
struct Hypothesis {
    sequence: Vec<u32>,
    log_prob: f32,
}

impl Hypothesis {
    fn normalized(&self) -> f32 {
        self.log_prob / self.sequence.len().max(1) as f32
    }
}

fn by_normalized_desc(a: &Hypothesis, b: &Hypothesis) -> Ordering {
    b.normalized().total_cmp(&a.normalized())
}

/// Beam search with length-normalized scores. Returns the generated tokens
/// without the start token or the trailing EOS.
///
/// With `do_sample` the `2 * num_beams` candidates of each step are drawn
/// from the temperature/top-k/top-p warped scores instead of taken greedily;
/// beams are still ranked by their unwarped log-probability.
pub fn beam_search<F, R>(
    mut scorer: F,
    generation: &GenerationConfig,
    tokens: SpecialTokens,
    rng: &mut R,
) -> Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
    R: Rng + ?Sized,
{
    let num_beams = generation.num_beams.max(1);
    let mut beams = vec![Hypothesis {
        sequence: vec![tokens.decoder_start],
        log_prob: 0.0,
    }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    while beams[0].sequence.len() < generation.max_length {
        let mut pool: Vec<Candidate> = Vec::new();
        for (index, beam) in beams.iter().enumerate() {
            let mut logits = scorer(&beam.sequence)?;
            shape_logits(&mut logits, &beam.sequence, generation, tokens);
            let log_probs = log_softmax(&logits);

            if generation.do_sample {
                let mut warped: Vec<f32> = log_probs.iter().map(|lp| beam.log_prob + lp).collect();
                warp_scores(&mut warped, generation.temperature, generation.top_k, generation.top_p);
                pool.extend(
                    warped
                        .iter()
                        .enumerate()
                        .filter(|(_, w)| w.is_finite())
                        .map(|(token, &weight)| Candidate {
                            beam: index,
                            token: token as u32,
                            log_prob: beam.log_prob + log_probs[token],
                            weight,
                        }),
                );
            } else {
                pool.extend(top_entries(&log_probs, 2 * num_beams).into_iter().map(
                    |(token, log_prob)| Candidate {
                        beam: index,
                        token,
                        log_prob: beam.log_prob + log_prob,
                        weight: log_prob,
                    },
                ));
            }
        }

        let mut candidates = if generation.do_sample {
            draw_without_replacement(&pool, 2 * num_beams, rng)
        } else {
            pool
        };
        candidates.sort_by(|a, b| b.log_prob.total_cmp(&a.log_prob));

        let mut next: Vec<Hypothesis> = Vec::with_capacity(num_beams);
        for (rank, candidate) in candidates.into_iter().enumerate() {
            let parent = &beams[candidate.beam].sequence;
            if candidate.token == tokens.eos {
                if rank < num_beams {
                    finished.push(Hypothesis {
                        sequence: parent.clone(),
                        log_prob: candidate.log_prob,
                    });
                }
            } else {
                let mut sequence = parent.clone();
                sequence.push(candidate.token);
                next.push(Hypothesis {
                    sequence,
                    log_prob: candidate.log_prob,
                });
            }
            if next.len() == num_beams {
                break;
            }
        }

        finished.sort_by(by_normalized_desc);
        finished.truncate(num_beams);

        if next.is_empty() {
            beams.clear();
            break;
        }
        beams = next;

        if finished.len() >= num_beams {
            if generation.early_stopping {
                break;
            }
            let best_running = beams
                .iter()
                .map(Hypothesis::normalized)
                .fold(f32::NEG_INFINITY, f32::max);
            let worst_finished = finished[finished.len() - 1].normalized();
            if worst_finished >= best_running {
                break;
            }
        }
    }

    if finished.len() < num_beams {
        finished.extend(beams);
    }
    finished.sort_by(by_normalized_desc);

    Ok(finished
        .into_iter()
        .next()
        .map(|best| best.sequence[1..].to_vec())
        .unwrap_or_default())
}

/// Single-sequence decoding where `sampler` picks each next token from the
/// shaped logits.
pub fn sample_decode<F, S>(
    mut scorer: F,
    mut sampler: S,
    generation: &GenerationConfig,
    tokens: SpecialTokens,
) -> Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
    S: FnMut(&[f32]) -> Result<u32>,
{
    let mut sequence = vec![tokens.decoder_start];

    while sequence.len() < generation.max_length {
        let mut logits = scorer(&sequence)?;
        shape_logits(&mut logits, &sequence, generation, tokens);
        let next = sampler(&logits)?;
        if next == tokens.eos {
            break;
        }
        sequence.push(next);
    }

    Ok(sequence[1..].to_vec())
}
