use crate::config::ClassifierConfig;
use shared::PredictionResponse;
use std::fmt;

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The top class cleared both thresholds; `confidence` is a percentage
    /// rounded to two decimals.
    Recognized { class: String, confidence: f64 },
    /// The model was unsure or could not separate the classes.
    NotRecognized,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Recognized { class, confidence } => write!(f, "{} ({:.2}%)", class, confidence),
            Decision::NotRecognized => f.write_str(shared::NOT_RECOGNIZED),
        }
    }
}

impl From<Decision> for PredictionResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Recognized { class, confidence } => {
                PredictionResponse::recognized(class, confidence)
            }
            Decision::NotRecognized => PredictionResponse::not_recognized(),
        }
    }
}

/// Index and value of the highest score. Ties resolve to the lowest index.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Applies the confidence/margin abstention rule to one score vector.
///
/// `scores[i]` must correspond to `config.class_names[i]`. The margin is the
/// gap between the two highest scores; a vector with a single entry is
/// compared against zero. Non-finite scores always abstain.
///
/// Confidence is rounded to two decimals with ties going to the even digit.
/// An f32 score times 10 000 is exact in f64, so no error creeps in before
/// the rounding step.
pub fn decide(scores: &[f32], config: &ClassifierConfig) -> Decision {
    if scores.iter().any(|s| !s.is_finite()) {
        return Decision::NotRecognized;
    }
    let Some((idx, top1)) = argmax(scores) else {
        return Decision::NotRecognized;
    };

    let top2 = scores
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != idx)
        .map(|(_, &s)| s)
        .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))))
        .unwrap_or(0.0);

    let top1 = top1 as f64;
    let margin = top1 - top2 as f64;

    if top1 < config.confidence_threshold || margin < config.margin_threshold {
        return Decision::NotRecognized;
    }

    match config.class_names.get(idx) {
        Some(class) => Decision::Recognized {
            class: class.clone(),
            confidence: (top1 * 10_000.0).round_ties_even() / 100.0,
        },
        None => Decision::NotRecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    fn recognized(class: &str, confidence: f64) -> Decision {
        Decision::Recognized {
            class: class.to_string(),
            confidence,
        }
    }

    #[test]
    fn confident_fresh() {
        assert_eq!(decide(&[0.97, 0.03], &config()), recognized("Fresh", 97.0));
    }

    #[test]
    fn confident_rotten() {
        assert_eq!(decide(&[0.012, 0.988], &config()), recognized("Rotten", 98.8));
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        assert_eq!(decide(&[0.987654, 0.012346], &config()), recognized("Fresh", 98.77));
    }

    #[test]
    fn halfway_confidence_rounds_to_even() {
        // Both scores sit exactly halfway between two-decimal percentages.
        assert_eq!(decide(&[0.90625, 0.09375], &config()), recognized("Fresh", 90.62));
        assert_eq!(decide(&[0.03125, 0.96875], &config()), recognized("Rotten", 96.88));
    }

    #[test]
    fn tie_never_recognized() {
        assert_eq!(decide(&[0.5, 0.5], &config()), Decision::NotRecognized);

        // Even with the confidence bar removed, a tie has zero margin.
        let lenient = ClassifierConfig {
            confidence_threshold: 0.0,
            ..config()
        };
        assert_eq!(decide(&[0.5, 0.5], &lenient), Decision::NotRecognized);
    }

    #[test]
    fn tie_picks_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some((1, 0.7)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn threshold_boundaries_are_inclusive() {
        assert_eq!(decide(&[0.85, 0.44], &config()), recognized("Fresh", 85.0));
    }

    #[test]
    fn margin_just_below_threshold_abstains() {
        assert_eq!(decide(&[0.85, 0.46], &config()), Decision::NotRecognized);
    }

    #[test]
    fn low_top_score_abstains() {
        assert_eq!(decide(&[0.84, 0.16], &config()), Decision::NotRecognized);
    }

    #[test]
    fn small_margin_abstains_despite_high_score() {
        // Unnormalized scores: top1 clears 0.85 but the classes are close.
        assert_eq!(decide(&[0.9, 0.6], &config()), Decision::NotRecognized);
    }

    #[test]
    fn non_finite_scores_abstain() {
        assert_eq!(decide(&[f32::NAN, 0.1], &config()), Decision::NotRecognized);
        assert_eq!(decide(&[f32::INFINITY, 0.0], &config()), Decision::NotRecognized);
    }

    #[test]
    fn empty_scores_abstain() {
        assert_eq!(decide(&[], &config()), Decision::NotRecognized);
    }

    #[test]
    fn accepted_iff_both_thresholds_met() {
        let config = config();
        for i in 0..=100 {
            let p = i as f32 / 100.0;
            let scores = [p, 1.0 - p];
            let top1 = p.max(1.0 - p) as f64;
            let top2 = p.min(1.0 - p) as f64;
            let accept = top1 >= 0.85 && top1 - top2 >= 0.40;

            match decide(&scores, &config) {
                Decision::Recognized { class, confidence } => {
                    assert!(accept, "accepted {:?}", scores);
                    let expected = if p >= 1.0 - p { "Fresh" } else { "Rotten" };
                    assert_eq!(class, expected);
                    assert_eq!(confidence, (top1 * 10_000.0).round_ties_even() / 100.0);
                }
                Decision::NotRecognized => assert!(!accept, "rejected {:?}", scores),
            }
        }
    }

    #[test]
    fn custom_labels_follow_score_order() {
        let config = ClassifierConfig {
            class_names: vec!["Ripe".into(), "Unripe".into(), "Spoiled".into()],
            ..config()
        };
        assert_eq!(decide(&[0.02, 0.03, 0.95], &config), recognized("Spoiled", 95.0));
    }

    #[test]
    fn converts_to_wire_format() {
        let response: PredictionResponse = recognized("Rotten", 91.5).into();
        assert_eq!(response, PredictionResponse::recognized("Rotten", 91.5));

        let response: PredictionResponse = Decision::NotRecognized.into();
        assert!(!response.is_recognized());
    }
}
