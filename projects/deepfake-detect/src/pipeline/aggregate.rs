use crate::pipeline::types::{AggregateResult, Label, PredictionResult, VerdictLabel};

/// Majority vote over per-frame predictions.
///
/// Fake needs a strict majority; a tie goes to real. The confidence is the
/// mean over the frames that voted for the winner only. An empty input is
/// `Indeterminate` with zero confidence.
pub fn aggregate(results: &[PredictionResult]) -> AggregateResult {
    let frames_analyzed = results.len();
    let fake_frames = results.iter().filter(|r| r.label == Label::Fake).count();
    let real_frames = frames_analyzed - fake_frames;

    if frames_analyzed == 0 {
        return AggregateResult {
            label: VerdictLabel::Indeterminate,
            confidence: 0.0,
            frames_analyzed,
            fake_frames,
            real_frames,
        };
    }

    let winner = if fake_frames * 2 > frames_analyzed {
        Label::Fake
    } else {
        Label::Real
    };

    // sorted so the float sum does not depend on input order
    let mut confidences: Vec<f64> = results
        .iter()
        .filter(|r| r.label == winner)
        .map(|r| r.confidence)
        .collect();
    confidences.sort_by(|a, b| a.total_cmp(b));
    let confidence = confidences.iter().sum::<f64>() / confidences.len() as f64;

    AggregateResult {
        label: winner.into(),
        confidence,
        frames_analyzed,
        fake_frames,
        real_frames,
    }
}
