//! Property-based tests for neighbor generation and Shapley attribution.

use proptest::prelude::*;

use demolens_core::components::perturb::numeric_neighbors;
use demolens_core::components::{CheckboxGroup, Component, DeltaType, Slider, Textbox};
use demolens_core::interpret::shapley;
use serde_json::json;

// --- Numeric neighbor properties ---

proptest! {
    #[test]
    fn numeric_neighbors_ascend_and_skip_the_original(
        x in -1000.0f64..1000.0,
        steps in 1usize..6,
        delta in 0.1f64..10.0,
    ) {
        let neighbors = numeric_neighbors(x, steps, delta, DeltaType::Absolute);
        prop_assert_eq!(neighbors.len(), 2 * steps);
        prop_assert!(neighbors.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(!neighbors.contains(&x));
        prop_assert!(neighbors[steps - 1] < x && neighbors[steps] > x);
    }

    #[test]
    fn slider_neighbors_are_clamped_to_bounds(
        minimum in -50i32..0,
        width in 1i32..100,
        offset in 0i32..100,
    ) {
        let maximum = minimum + width;
        let x = minimum + offset % (width + 1);
        let slider = Slider::new()
            .range(f64::from(minimum), f64::from(maximum))
            .unwrap();
        let neighbors = slider.neighbors_of(f64::from(x));
        prop_assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            prop_assert!(n >= f64::from(minimum) && n <= f64::from(maximum));
        }
    }
}

// --- Neighbor determinism ---

proptest! {
    #[test]
    fn text_neighbors_are_deterministic(words in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let text = words.join(" ");
        let textbox = Textbox::new();
        let first = textbox.get_interpretation_neighbors(&json!(text)).unwrap();
        let second = textbox.get_interpretation_neighbors(&json!(text)).unwrap();
        prop_assert_eq!(&first.values, &second.values);
        prop_assert_eq!(first.len(), words.len());
    }

    #[test]
    fn checkbox_group_neighbors_toggle_one_choice(mask in prop::collection::vec(any::<bool>(), 1..6)) {
        let choices: Vec<String> = (0..mask.len()).map(|i| format!("c{i}")).collect();
        let selected: Vec<&String> = choices.iter().zip(&mask).filter(|(_, m)| **m).map(|(c, _)| c).collect();
        let group = CheckboxGroup::new(choices.clone()).unwrap();
        let neighbors = group.get_interpretation_neighbors(&json!(selected)).unwrap();
        prop_assert_eq!(neighbors.len(), choices.len());
        for (i, neighbor) in neighbors.values.iter().enumerate() {
            let items: Vec<&str> = neighbor.as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
            for (j, choice) in choices.iter().enumerate() {
                let present = items.contains(&choice.as_str());
                prop_assert_eq!(present, if i == j { !mask[j] } else { mask[j] });
            }
        }
    }
}

// --- Shapley properties ---

proptest! {
    #[test]
    fn exact_shapley_is_efficient(
        weights in prop::collection::vec(-5.0f64..5.0, 1..7),
        bonus in -3.0f64..3.0,
    ) {
        let units = weights.len();
        let value = |mask: &[bool]| -> demolens_core::Result<f64> {
            let linear: f64 = mask.iter().zip(&weights).filter(|(m, _)| **m).map(|(_, w)| w).sum();
            let all = mask.iter().all(|m| *m);
            Ok(linear + if all { bonus } else { 0.0 })
        };
        let phi = shapley::exact(units, value).unwrap();
        let total: f64 = phi.iter().sum();
        let full = value(&vec![true; units]).unwrap();
        let none = value(&vec![false; units]).unwrap();
        prop_assert!((total - (full - none)).abs() < 1e-9);
    }

    #[test]
    fn sampled_shapley_is_reproducible(
        weights in prop::collection::vec(-5.0f64..5.0, 1..8),
        seed in any::<u64>(),
    ) {
        let units = weights.len();
        let value = |mask: &[bool]| -> demolens_core::Result<f64> {
            let on: Vec<f64> = mask.iter().zip(&weights).filter(|(m, _)| **m).map(|(_, w)| *w).collect();
            Ok(on.iter().sum::<f64>() + on.iter().copied().fold(0.0, f64::max))
        };
        let a = shapley::sampled(units, 5, seed, value).unwrap();
        let b = shapley::sampled(units, 5, seed, value).unwrap();
        prop_assert_eq!(&a, &b);
        let total: f64 = a.iter().sum();
        let full = value(&vec![true; units]).unwrap();
        let none = value(&vec![false; units]).unwrap();
        prop_assert!((total - (full - none)).abs() < 1e-9);
    }
}
