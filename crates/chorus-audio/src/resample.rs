//! Linear-interpolation resampling.

/// Resample `samples` from `source_rate` to `target_rate` by linear
/// interpolation.
///
/// Target length is `round(len * target_rate / source_rate)`. Sample
/// positions are spaced evenly across the original index range with
/// inclusive endpoints, so the first and last input samples are always
/// preserved when the target has at least two samples.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let target_len = (samples.len() as f64 * f64::from(target_rate) / f64::from(source_rate))
        .round() as usize;
    if target_len == 0 {
        return Vec::new();
    }
    if samples.len() == 1 {
        return vec![samples[0]; target_len];
    }
    let last = (samples.len() - 1) as f64;
    let step = if target_len == 1 {
        0.0
    } else {
        last / (target_len - 1) as f64
    };
    (0..target_len)
        .map(|i| {
            let pos = step * i as f64;
            let lo = pos.floor() as usize;
            if lo + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let frac = (pos - lo as f64) as f32;
                samples[lo] + (samples[lo + 1] - samples[lo]) * frac
            }
        })
        .collect()
}
