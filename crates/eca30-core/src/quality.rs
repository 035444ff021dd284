//! Quick output quality diagnostics.
//!
//! These are sanity checks for a byte stream (is it flat, is it
//! compressible, is any bit position stuck), not a statistical certification.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;

/// Quick Shannon entropy in bits/byte for a byte slice.
pub fn quick_shannon(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let n = data.len() as f64;
    let mut h = 0.0;
    for &c in &counts {
        if c > 0 {
            let p = c as f64 / n;
            h -= p * p.log2();
        }
    }
    h
}

/// Min-entropy in bits/byte: `-log2(p_max)` over byte values.
pub fn quick_min_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    let p_max = max as f64 / data.len() as f64;
    -p_max.log2()
}

/// Letter grade for a min-entropy figure in bits/byte.
pub fn grade_min_entropy(h_min: f64) -> char {
    if h_min >= 6.0 {
        'A'
    } else if h_min >= 4.0 {
        'B'
    } else if h_min >= 2.0 {
        'C'
    } else if h_min >= 1.0 {
        'D'
    } else {
        'F'
    }
}

/// Zlib-compressed size over input size. Random data sits near (or above) 1.0.
pub fn compression_ratio(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    if encoder.write_all(data).is_err() {
        return 0.0;
    }
    let compressed = encoder.finish().unwrap_or_default();
    compressed.len() as f64 / data.len() as f64
}

/// Per-bit-position bias.
#[derive(Debug, Clone, Serialize)]
pub struct BitBias {
    /// Probability of 1 for each bit position (0 = LSB).
    pub bit_probabilities: [f64; 8],
    /// Mean deviation from 0.5 across positions.
    pub overall_bias: f64,
    /// Any position off by more than 0.01.
    pub has_significant_bias: bool,
}

/// Analyze per-bit-position bias.
pub fn bit_bias(data: &[u8]) -> BitBias {
    if data.is_empty() {
        return BitBias {
            bit_probabilities: [0.0; 8],
            overall_bias: 0.0,
            has_significant_bias: false,
        };
    }

    let n = data.len() as f64;
    let mut counts = [0u64; 8];
    for &byte in data {
        for (bit, count) in counts.iter_mut().enumerate() {
            if byte & (1 << bit) != 0 {
                *count += 1;
            }
        }
    }

    let mut bit_probabilities = [0.0; 8];
    for (p, &c) in bit_probabilities.iter_mut().zip(&counts) {
        *p = c as f64 / n;
    }
    let overall_bias = bit_probabilities.iter().map(|&p| (p - 0.5).abs()).sum::<f64>() / 8.0;
    let has_significant_bias = bit_probabilities.iter().any(|&p| (p - 0.5).abs() > 0.01);

    BitBias {
        bit_probabilities,
        overall_bias,
        has_significant_bias,
    }
}

/// Combined quick quality report.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub samples: usize,
    pub unique_values: usize,
    pub shannon_entropy: f64,
    pub min_entropy: f64,
    pub compression_ratio: f64,
    pub bit_bias: BitBias,
    pub quality_score: f64,
    pub grade: char,
}

/// Quick quality assessment.
pub fn quick_quality(data: &[u8]) -> QualityReport {
    if data.len() < 16 {
        return QualityReport {
            samples: data.len(),
            unique_values: 0,
            shannon_entropy: 0.0,
            min_entropy: 0.0,
            compression_ratio: 0.0,
            bit_bias: bit_bias(data),
            quality_score: 0.0,
            grade: 'F',
        };
    }

    let shannon = quick_shannon(data);
    let comp_ratio = compression_ratio(data);

    let mut seen = [false; 256];
    for &b in data {
        seen[b as usize] = true;
    }
    let unique = seen.iter().filter(|&&s| s).count();

    let eff = shannon / 8.0;
    let score =
        eff * 60.0 + comp_ratio.min(1.0) * 20.0 + (unique as f64 / 256.0).min(1.0) * 20.0;
    let grade = if score >= 80.0 {
        'A'
    } else if score >= 60.0 {
        'B'
    } else if score >= 40.0 {
        'C'
    } else if score >= 20.0 {
        'D'
    } else {
        'F'
    };

    QualityReport {
        samples: data.len(),
        unique_values: unique,
        shannon_entropy: shannon,
        min_entropy: quick_min_entropy(data),
        compression_ratio: comp_ratio,
        bit_bias: bit_bias(data),
        quality_score: score,
        grade,
    }
}
