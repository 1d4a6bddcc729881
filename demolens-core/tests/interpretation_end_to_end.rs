//! End-to-end interpretation runs against small known functions.

use demolens_core::components::{
    Checkbox, CheckboxGroup, Component, Image, InterpretParams, Number, Radio, Slider, Textbox,
};
use demolens_core::{
    DemoError, Interface, InterpretationConfig, InterpretationError, InterpretationMethod,
    Prediction, SlotScores, Value,
};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};

fn longest_word(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let text = inputs[0].as_text().unwrap_or_default();
    let longest = text.split_whitespace().map(str::len).max().unwrap_or(0);
    Ok(Prediction::Text(longest.to_string()))
}

fn square(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let x = inputs[0]
        .as_number()
        .ok_or_else(|| anyhow::anyhow!("expected a number"))?;
    Ok(Prediction::Number(x * x))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn quadrant_png() -> Json {
    let img = RgbImage::from_fn(16, 16, |x, y| match (x < 8, y < 8) {
        (true, true) => Rgb([240, 240, 240]),
        (false, true) => Rgb([200, 20, 20]),
        (true, false) => Rgb([20, 200, 20]),
        (false, false) => Rgb([20, 20, 200]),
    });
    let img = image::DynamicImage::ImageRgb8(img);
    json!(demolens_core::codec::encode_image_data_url(&img).unwrap())
}

fn pixel_sum(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let pixels = inputs[0]
        .as_pixels()
        .ok_or_else(|| anyhow::anyhow!("expected pixels"))?;
    Ok(Prediction::Number(pixels.iter().map(|&p| f64::from(p)).sum()))
}

#[test]
fn longest_word_credits_the_longest_word() {
    let interface = Interface::new(vec![Box::new(Textbox::new())], longest_word);
    let result = interface
        .interpret(&[json!("Return the length of the longest word in this sentence")])
        .unwrap();

    let SlotScores::Tokens(tokens) = &result.scores[0] else {
        panic!("expected token scores");
    };
    assert_eq!(tokens.len(), 20);
    assert_eq!(tokens[18], ("sentence".to_string(), 1.0));
    assert_eq!(tokens[19], (" ".to_string(), 0.0));
    for (token, score) in result.scores[0].token_scores(" ") {
        if token != "sentence" {
            assert_eq!(score, 0.0, "token {token}");
        }
    }

    let mut expected = vec![Prediction::from("8"); 9];
    expected.push(Prediction::from("7"));
    assert_eq!(result.alternative_outputs[0], expected);
}

#[test]
fn square_around_two_with_percent_neighbors() {
    let interface = Interface::new(vec![Box::new(Number::new())], square);
    let result = interface.interpret(&[json!(2)]).unwrap();

    let SlotScores::Numeric(pairs) = &result.scores[0] else {
        panic!("expected numeric scores");
    };
    assert_eq!(pairs.len(), 7);
    assert_eq!(pairs[3], (2.0, None));
    let expected = [
        (1.94, -0.2364),
        (1.96, -0.1584),
        (1.98, -0.0796),
        (2.02, 0.0804),
        (2.04, 0.1616),
        (2.06, 0.2436),
    ];
    let scored: Vec<_> = pairs.iter().filter(|(_, s)| s.is_some()).collect();
    for ((x, score), (ex, es)) in scored.iter().zip(expected) {
        assert_close(*x, ex);
        assert_close(score.unwrap(), es);
    }

    let outputs: Vec<f64> = result.alternative_outputs[0]
        .iter()
        .map(|p| p.as_number().unwrap())
        .collect();
    assert!(outputs.windows(2).all(|w| w[0] < w[1]));
    assert!(outputs[2] < 4.0 && outputs[3] > 4.0);
}

#[test]
fn slider_neighbors_stay_in_range() {
    let slider = Slider::new().range(10.0, 20.0).unwrap().step(1.0).unwrap();
    let interface = Interface::new(vec![Box::new(slider)], square);

    let result = interface.interpret(&[json!(15)]).unwrap();
    let outputs: Vec<f64> = result.alternative_outputs[0]
        .iter()
        .map(|p| p.as_number().unwrap())
        .collect();
    assert_eq!(outputs, vec![144.0, 169.0, 196.0, 256.0, 289.0, 324.0]);
    assert_eq!(
        result.scores[0],
        SlotScores::Flat(vec![-81.0, -56.0, -29.0, 31.0, 64.0, 99.0])
    );

    let edge = interface.interpret(&[json!(19)]).unwrap();
    let outputs: Vec<f64> = edge.alternative_outputs[0]
        .iter()
        .map(|p| p.as_number().unwrap())
        .collect();
    assert_eq!(outputs, vec![256.0, 289.0, 324.0, 400.0, 400.0, 400.0]);
    assert_eq!(edge.scores[0].len(), 6);
}

#[test]
fn checkbox_scores_the_flip_on_its_side() {
    let indicator = |inputs: &[Value]| -> anyhow::Result<Prediction> {
        Ok(Prediction::from(inputs[0].as_bool().unwrap_or(false)))
    };
    let interface = Interface::new(vec![Box::new(Checkbox::new())], indicator);

    let off = interface.interpret(&[json!(false)]).unwrap();
    assert_eq!(off.scores[0], SlotScores::Binary(None, Some(1.0)));
    assert_eq!(off.alternative_outputs[0], vec![Prediction::Number(1.0)]);

    let on = interface.interpret(&[json!(true)]).unwrap();
    assert_eq!(on.scores[0], SlotScores::Binary(Some(-1.0), None));
}

#[test]
fn checkbox_group_pairs_follow_selection() {
    let group = CheckboxGroup::new(["a", "b", "c"])
        .unwrap()
        .type_name("index")
        .unwrap();
    let join = |inputs: &[Value]| -> anyhow::Result<Prediction> {
        let Value::Indices(indices) = &inputs[0] else {
            anyhow::bail!("expected indices");
        };
        let parts: Vec<String> = indices.iter().map(usize::to_string).collect();
        Ok(Prediction::Text(parts.join("|")))
    };
    let interface = Interface::new(vec![Box::new(group)], join);
    let result = interface.interpret(&[json!(["a", "c"])]).unwrap();

    assert_eq!(
        result.scores[0],
        SlotScores::Pairs(vec![
            [Some(-1.0), None],
            [None, Some(-1.0)],
            [Some(-1.0), None],
        ])
    );
    assert_eq!(
        result.alternative_outputs[0],
        vec![
            Prediction::from("2"),
            Prediction::from("0|2|1"),
            Prediction::from("0"),
        ]
    );
}

#[test]
fn radio_by_index_scores_other_choices() {
    let radio = Radio::new(["a", "b", "c"]).unwrap().type_name("index").unwrap();
    let double = |inputs: &[Value]| -> anyhow::Result<Prediction> {
        Ok(Prediction::Number(2.0 * inputs[0].as_number().unwrap_or_default()))
    };
    let interface = Interface::new(vec![Box::new(radio)], double);
    let result = interface.interpret(&[json!("b")]).unwrap();

    assert_eq!(
        result.scores[0],
        SlotScores::Choices(vec![Some(-2.0), None, Some(2.0)])
    );
    assert_eq!(
        result.alternative_outputs[0],
        vec![Prediction::Number(0.0), Prediction::Number(4.0)]
    );
}

#[test]
fn image_pixel_sum_scores_every_pixel() {
    let image = Image::new().with_interpret_parameters(&InterpretParams::new().segments(4));
    let raw = quadrant_png();
    let regions = image.segment(&raw).unwrap().count;
    let interface = Interface::new(vec![Box::new(image)], pixel_sum);

    let result = interface.interpret(&[raw]).unwrap();
    let SlotScores::Pixels(rows) = &result.scores[0] else {
        panic!("expected pixel scores");
    };
    assert_eq!(rows.len(), 16);
    assert!(rows.iter().all(|row| row.len() == 16));
    assert_eq!(result.alternative_outputs[0].len(), regions);
    assert!(rows.iter().flatten().all(|s| s.is_finite() && *s >= 0.0));
    if regions > 1 {
        let max = rows.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_close(max, 1.0);
    }
}

#[test]
fn shapley_on_text_sums_to_total_change() {
    let interface = Interface::new(vec![Box::new(Textbox::new())], longest_word)
        .with_method(InterpretationMethod::Shapley);
    let result = interface.interpret(&[json!("a bb cccc")]).unwrap();

    let scores = result.scores[0].token_scores(" ");
    let total: f64 = scores.iter().map(|(_, s)| s).sum();
    assert_close(total, 4.0);
    assert!(scores[2].1 > scores[1].1 && scores[1].1 > scores[0].1);
    assert_eq!(result.alternative_outputs[0].len(), 3);
}

#[test]
fn shapley_with_a_huge_exact_threshold_still_samples() {
    let config = InterpretationConfig {
        shapley_exact_max_units: 64,
        ..InterpretationConfig::default()
    };
    let interface = Interface::new(vec![Box::new(Textbox::new())], longest_word)
        .with_method(InterpretationMethod::Shapley)
        .with_config(config);
    let words: Vec<String> = (0..64).map(|i| "x".repeat(1 + i % 5)).collect();
    let result = interface.interpret(&[json!(words.join(" "))]).unwrap();

    assert_eq!(result.scores[0].token_scores(" ").len(), 64);
    assert_eq!(result.alternative_outputs[0].len(), 64);
}

#[test]
fn shapley_on_image_aligns_with_regions() {
    let image = Image::new().with_interpret_parameters(&InterpretParams::new().segments(4));
    let raw = quadrant_png();
    let regions = image.segment(&raw).unwrap().count;
    let interface =
        Interface::new(vec![Box::new(image)], pixel_sum).with_method(InterpretationMethod::Shapley);

    let result = interface.interpret(&[raw]).unwrap();
    assert!(matches!(result.scores[0], SlotScores::Pixels(_)));
    assert_eq!(result.alternative_outputs[0].len(), regions);
}

#[test]
fn slots_align_with_inputs() {
    let sum = |inputs: &[Value]| -> anyhow::Result<Prediction> {
        let text = inputs[0].as_text().unwrap_or_default().len() as f64;
        let flag = inputs[1].as_number().unwrap_or_default();
        let x = inputs[2].as_number().unwrap_or_default();
        Ok(Prediction::Number(text + flag + x))
    };
    let inputs: Vec<Box<dyn Component>> = vec![
        Box::new(Textbox::new()),
        Box::new(Checkbox::new()),
        Box::new(Number::new()),
    ];
    let interface = Interface::new(inputs, sum);
    let raw = [json!("hello world"), json!(true), json!(10)];
    let result = interface.interpret(&raw).unwrap();

    assert_eq!(result.scores.len(), 3);
    assert_eq!(result.alternative_outputs.len(), 3);
    for (slot, component) in interface.inputs().iter().enumerate() {
        let neighbors = component.get_interpretation_neighbors(&raw[slot]).unwrap();
        assert_eq!(result.alternative_outputs[slot].len(), neighbors.len(), "slot {slot}");
    }
    assert_eq!(interface.process(&raw).unwrap(), Prediction::Number(22.0));
}

#[test]
fn shapley_on_number_is_unsupported() {
    let interface =
        Interface::new(vec![Box::new(Number::new())], square).with_method(InterpretationMethod::Shapley);
    let err = interface.interpret(&[json!(3)]).unwrap_err();
    assert!(matches!(
        err,
        DemoError::Interpretation(InterpretationError::UnsupportedMethod { .. })
    ));
}
