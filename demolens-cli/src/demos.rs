//! Built-in demo functions the `interpret` subcommand can wrap.

use demolens_core::components::{
    Checkbox, CheckboxGroup, Component, Image, Number, Radio, Slider, Textbox,
};
use demolens_core::{DemoConfig, Interface, Prediction, Value};
use serde_json::{Value as Json, json};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Demo {
    /// Length of the longest word in a sentence
    LongestWord,
    /// x squared, with a number input
    Square,
    /// x squared, with a slider over [10, 20]
    SquareSlider,
    /// 1 when the box is checked, else 0
    CheckboxIndicator,
    /// Indices of the selected choices joined by '|'
    JoinChoices,
    /// Twice the index of the selected radio choice
    DoubleIndex,
    /// Sum of all pixel intensities of an image
    PixelSum,
}

impl Demo {
    /// Wrap the demo function with its input components.
    pub fn interface(self, config: &DemoConfig) -> anyhow::Result<Interface> {
        let inputs: Vec<Box<dyn Component>> = match self {
            Self::LongestWord => vec![Box::new(Textbox::new())],
            Self::Square => vec![Box::new(Number::new())],
            Self::SquareSlider => vec![Box::new(Slider::new().range(10.0, 20.0)?.step(1.0)?)],
            Self::CheckboxIndicator => vec![Box::new(Checkbox::new())],
            Self::JoinChoices => vec![Box::new(
                CheckboxGroup::new(["a", "b", "c"])?.type_name("index")?,
            )],
            Self::DoubleIndex => vec![Box::new(Radio::new(["a", "b", "c"])?.type_name("index")?)],
            Self::PixelSum => vec![Box::new(Image::new().segmentation(config.segmentation.clone()))],
        };
        let interface = match self {
            Self::LongestWord => Interface::new(inputs, longest_word),
            Self::Square | Self::SquareSlider => Interface::new(inputs, square),
            Self::CheckboxIndicator => Interface::new(inputs, indicator),
            Self::JoinChoices => Interface::new(inputs, join_choices),
            Self::DoubleIndex => Interface::new(inputs, double_index),
            Self::PixelSum => Interface::new(inputs, pixel_sum),
        };
        Ok(interface.with_config(config.interpretation.clone()))
    }

    /// Raw inputs used when none are given on the command line.
    pub fn default_inputs(self, interface: &Interface) -> Vec<Json> {
        match self {
            Self::LongestWord => vec![json!("Return the length of the longest word in this sentence")],
            Self::Square => vec![json!(2)],
            Self::SquareSlider => vec![json!(15)],
            Self::CheckboxIndicator => vec![json!(false)],
            Self::JoinChoices => vec![json!(["a", "c"])],
            Self::DoubleIndex => vec![json!("b")],
            Self::PixelSum => interface.inputs().iter().map(|c| c.generate_sample()).collect(),
        }
    }
}

fn longest_word(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let text = inputs[0]
        .as_text()
        .ok_or_else(|| anyhow::anyhow!("expected text"))?;
    let longest = text.split_whitespace().map(str::len).max().unwrap_or(0);
    Ok(Prediction::Text(longest.to_string()))
}

fn square(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let x = inputs[0]
        .as_number()
        .ok_or_else(|| anyhow::anyhow!("expected a number"))?;
    Ok(Prediction::Number(x * x))
}

fn indicator(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let checked = inputs[0]
        .as_bool()
        .ok_or_else(|| anyhow::anyhow!("expected a boolean"))?;
    Ok(Prediction::from(checked))
}

fn join_choices(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let Value::Indices(indices) = &inputs[0] else {
        anyhow::bail!("expected choice indices");
    };
    let parts: Vec<String> = indices.iter().map(usize::to_string).collect();
    Ok(Prediction::Text(parts.join("|")))
}

fn double_index(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let index = inputs[0]
        .as_number()
        .ok_or_else(|| anyhow::anyhow!("expected a choice index"))?;
    Ok(Prediction::Number(2.0 * index))
}

fn pixel_sum(inputs: &[Value]) -> anyhow::Result<Prediction> {
    let pixels = inputs[0]
        .as_pixels()
        .ok_or_else(|| anyhow::anyhow!("expected image pixels"))?;
    Ok(Prediction::Number(pixels.iter().map(|&p| f64::from(p)).sum()))
}
