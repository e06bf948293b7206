//! Signal multiplication, gain and the ring-modulation combine rules.

/*
Signal Multiplication
=====================

Multiplying two signals sample-by-sample is the operation behind three blocks
in a layer chain: AMP (signal × envelope), RINGMOD (A × B) and
RINGMOD SUMA (A + A × B).

Vocabulary
----------

  gain          A multiplier applied to amplitude.
                  gain > 1.0  →  louder
                  gain = 1.0  →  unchanged (unity gain)
                  gain = 0.0  →  silence

  modulation    Using one signal to control a parameter of another.
                Amplitude modulation (AM) = controlling volume with a signal.

  accumulator   The plane a block writes its result into. In a layer buffer
                that is the UPPER plane ("A"); the LOWER plane ("B") is the
                side input.


Decibels
--------

    dB     = 20 × log₁₀(amplitude_ratio)
    linear = 10^(dB / 20)

    ×1.0 = 0 dB    ×0.5 ≈ -6 dB    ×2.0 ≈ +6 dB


Ring Modulation
---------------

Multiply two audio-rate signals for metallic, bell-like tones:

    sin(A) × sin(B) = ½[cos(A-B) - cos(A+B)]

The product keeps only sum and difference frequencies. Two combine rules
share the same inputs and differ only in what they do with A:

    RINGMOD        A ← A × B           overwrite
    RINGMOD SUMA   A ← A + A × B       accumulate (carrier stays audible)

    A = [1.0, 1.0, ...]   B = [0.5, 0.5, ...]
    RINGMOD        → [0.5, 0.5, ...]
    RINGMOD SUMA   → [1.5, 1.5, ...]


Ramped Gain
-----------

Controllers update once per buffer. Multiplying a whole buffer by a value that
jumped since the previous buffer produces a click (zipper noise), so the AMP
block interpolates linearly from last buffer's value to this buffer's:

    gain[i] = from + (to - from) × (i + 1) / len

The final sample lands exactly on `to`, which is where the next buffer starts.
*/

/// Multiply two signal buffers sample-by-sample into `out`.
#[inline]
pub fn multiply(signal: &[f32], modulator: &[f32], out: &mut [f32]) {
    debug_assert_eq!(signal.len(), modulator.len());
    debug_assert_eq!(signal.len(), out.len());

    for ((o, &s), &m) in out.iter_mut().zip(signal.iter()).zip(modulator.iter()) {
        *o = s * m;
    }
}

/// Multiply a signal by a constant gain factor (in-place).
#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// `signal ← signal × modulator`. The RINGMOD rule.
#[inline]
pub fn multiply_in_place(signal: &mut [f32], modulator: &[f32]) {
    debug_assert_eq!(signal.len(), modulator.len());

    for (s, &m) in signal.iter_mut().zip(modulator.iter()) {
        *s *= m;
    }
}

/// `acc ← acc + acc × modulator`. The RINGMOD SUMA rule.
#[inline]
pub fn multiply_accumulate(acc: &mut [f32], modulator: &[f32]) {
    debug_assert_eq!(acc.len(), modulator.len());

    for (a, &m) in acc.iter_mut().zip(modulator.iter()) {
        *a += *a * m;
    }
}

/// Multiply by a gain that moves linearly from `from` to `to` across the buffer.
#[inline]
pub fn ramp_gain(signal: &mut [f32], from: f32, to: f32) {
    if signal.is_empty() {
        return;
    }
    if from == to {
        apply_gain(signal, to);
        return;
    }

    let step = (to - from) / signal.len() as f32;
    for (i, sample) in signal.iter_mut().enumerate() {
        *sample *= from + step * (i + 1) as f32;
    }
}

/// Add `src × gain` onto `dst`.
#[inline]
pub fn mix_into(dst: &mut [f32], src: &[f32], gain: f32) {
    debug_assert!(src.len() <= dst.len());

    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d += s * gain;
    }
}

#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
