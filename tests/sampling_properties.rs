use kriegspiel::evaluation::{Evaluate, ScenarioEvaluator};
use kriegspiel::sampling::sample;
use kriegspiel::stats::aggregate;
use kriegspiel::{Distribution, Parameter, Sample, Scenario};
use proptest::prelude::*;

fn distribution() -> impl Strategy<Value = Distribution> {
    prop_oneof![
        (-5.0..5.0f64, 0.01..5.0f64).prop_map(|(low, width)| Distribution::Uniform {
            low,
            high: low + width
        }),
        (-5.0..5.0f64, 0.01..3.0f64)
            .prop_map(|(mean, std_dev)| Distribution::Normal { mean, std_dev }),
        (-5.0..5.0f64, 0.0..1.0f64, 0.01..5.0f64).prop_map(|(low, t, width)| {
            Distribution::Triangular {
                low,
                mode: low + t * width,
                high: low + width,
            }
        }),
        (0.5..10.0f64, 0.5..10.0f64).prop_map(|(alpha, beta)| Distribution::Beta { alpha, beta }),
        (0.05..10.0f64, 0.01..100.0f64).prop_map(|(shape, rate)| Distribution::Gamma { shape, rate }),
        (0.5..5.0f64, 0.1..5.0f64)
            .prop_map(|(shape, scale)| Distribution::Weibull { shape, scale }),
        (0.001..50.0f64).prop_map(|lambda| Distribution::Poisson { lambda }),
        (0.1..10.0f64).prop_map(|rate| Distribution::Exponential { rate }),
        (-2.0..2.0f64, 0.05..1.5f64).prop_map(|(mu, sigma)| Distribution::LogNormal { mu, sigma }),
    ]
}

fn parameter() -> impl Strategy<Value = Parameter> {
    (distribution(), -10.0..10.0f64, 0.0..10.0f64).prop_map(|(dist, min, width)| {
        Parameter::new("factor", dist, min, min + width).expect("generated parameter is valid")
    })
}

fn category() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("deception".to_string())),
        Just(Some("Maneuver".to_string())),
        Just(Some("defensive".to_string())),
        Just(Some("attrition".to_string())),
        Just(Some("unregistered".to_string())),
    ]
}

const FACTORS: [&str; 12] = [
    "terrain_advantage",
    "resource_availability",
    "timing_advantage",
    "leadership_quality",
    "enemy_intelligence",
    "enemy_morale",
    "deception_credibility",
    "intelligence_superiority",
    "mobility",
    "fortification_strength",
    "supply_lines",
    "unrelated_factor",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn samples_stay_within_bounds(param in parameter(), seed in any::<u64>()) {
        let samples = sample(std::slice::from_ref(&param), 64, seed).expect("sampling succeeds");
        prop_assert_eq!(samples.len(), 64);
        for s in &samples {
            let value = s.get("factor").expect("factor present");
            prop_assert!(value.is_finite());
            prop_assert!(
                value >= param.min() && value <= param.max(),
                "{} outside [{}, {}]", value, param.min(), param.max()
            );
        }
    }

    #[test]
    fn same_seed_same_samples(param in parameter(), seed in any::<u64>()) {
        let a = sample(std::slice::from_ref(&param), 16, seed).expect("sampling succeeds");
        let b = sample(std::slice::from_ref(&param), 16, seed).expect("sampling succeeds");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn evaluator_output_is_a_probability(
        values in proptest::collection::vec(0.0..=1.0f64, FACTORS.len()),
        base in 0.0..=1.0f64,
        category in category(),
    ) {
        let mut scenario = Scenario::new(
            "prop",
            "Property scenario",
            vec![Parameter::uniform("terrain_advantage", 0.0, 1.0).expect("valid")],
        )
        .with_base_success(base);
        scenario.category = category;
        let s = Sample::from_pairs(0, FACTORS.iter().copied().zip(values));
        let rate = ScenarioEvaluator::default()
            .success_rate(&s, &scenario)
            .expect("in-range factors evaluate");
        prop_assert!((0.0..=1.0).contains(&rate), "rate={}", rate);
    }

    #[test]
    fn out_of_range_factor_is_an_evaluation_error(value in prop_oneof![-5.0..-0.001f64, 1.001..5.0f64]) {
        let scenario = Scenario::new(
            "prop",
            "Property scenario",
            vec![Parameter::uniform("terrain_advantage", 0.0, 1.0).expect("valid")],
        );
        let s = Sample::from_pairs(0, [("terrain_advantage", value)]);
        prop_assert!(ScenarioEvaluator::default().success_rate(&s, &scenario).is_err());
    }

    #[test]
    fn aggregation_ignores_order(
        mut outcomes in proptest::collection::vec(0.0..=1.0f64, 1..200),
        level in 0.5..0.99f64,
    ) {
        let forward = aggregate(&outcomes, level).expect("aggregates");
        outcomes.reverse();
        let reversed = aggregate(&outcomes, level).expect("aggregates");
        prop_assert_eq!(&forward, &reversed);
        prop_assert!(forward.expected_shortfall <= forward.mean + 1e-12);
        prop_assert!(forward.confidence_interval.lower <= forward.confidence_interval.upper);
    }
}
