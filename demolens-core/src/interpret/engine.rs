//! The interpretation run: baseline, per-slot perturbation, scoring.

use super::distance::{coalition_value, quantify_difference};
use super::scores::SlotScores;
use super::shapley::shapley_values;
use crate::components::{Component, Neighbors};
use crate::config::InterpretationConfig;
use crate::error::{CallSite, ConfigError, InterpretationError, Result};
use crate::prediction::{Prediction, Predictor};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use tracing::{debug, info};

/// How one input slot is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretationMethod {
    /// Leave-one-out: score every neighbor the component proposes.
    #[default]
    Default,
    /// Shapley attribution over the component's units.
    Shapley,
    /// Skip the slot.
    None,
}

/// Replacement for the built-in methods: receives the preprocessed inputs,
/// returns one score entry per slot.
pub type CustomInterpreter = Box<dyn Fn(&[Value]) -> anyhow::Result<Vec<SlotScores>>>;

/// Scores and the outputs that produced them, one entry per input slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub scores: Vec<SlotScores>,
    /// Per slot, the output for each neighbor (or left-out unit) in order.
    pub alternative_outputs: Vec<Vec<Prediction>>,
}

/// A wrapped function together with its input components.
pub struct Interface {
    inputs: Vec<Box<dyn Component>>,
    predictor: Box<dyn Predictor>,
    methods: Vec<InterpretationMethod>,
    custom: Option<CustomInterpreter>,
    config: InterpretationConfig,
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("inputs", &self.inputs)
            .field("methods", &self.methods)
            .field("custom", &self.custom.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Interface {
    pub fn new(inputs: Vec<Box<dyn Component>>, predictor: impl Predictor + 'static) -> Self {
        let methods = vec![InterpretationMethod::Default; inputs.len()];
        Self {
            inputs,
            predictor: Box::new(predictor),
            methods,
            custom: None,
            config: InterpretationConfig::default(),
        }
    }

    /// Use `method` for every slot.
    pub fn with_method(mut self, method: InterpretationMethod) -> Self {
        self.methods.fill(method);
        self
    }

    /// Use `method` for one slot.
    pub fn with_slot_method(
        mut self,
        slot: usize,
        method: InterpretationMethod,
    ) -> Result<Self, ConfigError> {
        let count = self.methods.len();
        let entry = self.methods.get_mut(slot).ok_or_else(|| ConfigError::InvalidParameter {
            component: "interface".into(),
            parameter: "slot".into(),
            reason: format!("slot {slot} out of range for {count} inputs"),
        })?;
        *entry = method;
        Ok(self)
    }

    pub fn with_custom_interpreter<F>(mut self, interpreter: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Vec<SlotScores>> + 'static,
    {
        self.custom = Some(Box::new(interpreter));
        self
    }

    pub fn with_config(mut self, config: InterpretationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn inputs(&self) -> &[Box<dyn Component>] {
        &self.inputs
    }

    pub fn methods(&self) -> &[InterpretationMethod] {
        &self.methods
    }

    fn check_arity(&self, got: usize) -> Result<()> {
        if got != self.inputs.len() {
            return Err(InterpretationError::ArityMismatch {
                expected: self.inputs.len(),
                got,
            }
            .into());
        }
        Ok(())
    }

    fn preprocess_all(&self, raw: &[Json]) -> Result<Vec<Value>> {
        self.check_arity(raw.len())?;
        self.inputs
            .iter()
            .zip(raw)
            .map(|(component, value)| component.preprocess(value))
            .collect()
    }

    fn call(&self, inputs: &[Value], site: CallSite) -> Result<Prediction> {
        self.predictor
            .predict(inputs)
            .map_err(|e| InterpretationError::prediction(site, &e).into())
    }

    /// Run the wrapped function once on raw inputs.
    pub fn process(&self, raw: &[Json]) -> Result<Prediction> {
        let inputs = self.preprocess_all(raw)?;
        self.call(&inputs, CallSite::Baseline)
    }

    /// Interpret with the configured per-slot methods.
    pub fn interpret(&self, raw: &[Json]) -> Result<Interpretation> {
        self.run(raw, &self.methods)
    }

    /// Interpret every slot with `method`, ignoring the configured per-slot methods.
    pub fn interpret_with(&self, raw: &[Json], method: InterpretationMethod) -> Result<Interpretation> {
        let methods = vec![method; self.inputs.len()];
        self.run(raw, &methods)
    }

    fn run(&self, raw: &[Json], methods: &[InterpretationMethod]) -> Result<Interpretation> {
        let mut processed = self.preprocess_all(raw)?;

        if let Some(custom) = &self.custom {
            let scores = custom(&processed)
                .map_err(|e| InterpretationError::prediction(CallSite::Custom, &e))?;
            if scores.len() != self.inputs.len() {
                return Err(InterpretationError::ArityMismatch {
                    expected: self.inputs.len(),
                    got: scores.len(),
                }
                .into());
            }
            info!(slots = scores.len(), "Custom interpretation finished");
            let alternative_outputs = vec![Vec::new(); scores.len()];
            return Ok(Interpretation {
                scores,
                alternative_outputs,
            });
        }

        let baseline = self.call(&processed, CallSite::Baseline)?;
        let mut calls = 1usize;
        let mut scores = Vec::with_capacity(self.inputs.len());
        let mut alternative_outputs = Vec::with_capacity(self.inputs.len());

        for (slot, method) in methods.iter().enumerate() {
            let (slot_scores, outputs) = match method {
                InterpretationMethod::None => (SlotScores::Skipped, Vec::new()),
                InterpretationMethod::Default => {
                    self.leave_one_out(slot, raw, &mut processed, &baseline, &mut calls)?
                }
                InterpretationMethod::Shapley => {
                    self.shapley(slot, raw, &mut processed, &baseline, &mut calls)?
                }
            };
            debug!(
                slot,
                component = self.inputs[slot].name(),
                method = ?method,
                alternatives = outputs.len(),
                "Interpreted slot"
            );
            scores.push(slot_scores);
            alternative_outputs.push(outputs);
        }

        info!(slots = scores.len(), calls, baseline = %baseline, "Interpretation finished");
        Ok(Interpretation {
            scores,
            alternative_outputs,
        })
    }

    /// Call the function with `raw_value` substituted into `slot`, restoring the baseline afterwards.
    fn call_substituted(
        &self,
        processed: &mut [Value],
        slot: usize,
        raw_value: &Json,
        site: CallSite,
    ) -> Result<Prediction> {
        let value = self.inputs[slot].preprocess(raw_value)?;
        let original = std::mem::replace(&mut processed[slot], value);
        let output = self.call(processed, site);
        processed[slot] = original;
        output
    }

    fn leave_one_out(
        &self,
        slot: usize,
        raw: &[Json],
        processed: &mut [Value],
        baseline: &Prediction,
        calls: &mut usize,
    ) -> Result<(SlotScores, Vec<Prediction>)> {
        let component = &self.inputs[slot];
        let neighbors = component.get_interpretation_neighbors(&raw[slot])?;
        let by_tokens = component.interpret_by_tokens();

        let mut diffs = Vec::with_capacity(neighbors.values.len());
        let mut outputs = Vec::with_capacity(neighbors.values.len());
        for (index, neighbor) in neighbors.values.iter().enumerate() {
            let output = self.call_substituted(processed, slot, neighbor, CallSite::Neighbor { slot, index })?;
            let diff = quantify_difference(baseline, &output);
            diffs.push(if by_tokens { diff } else { -diff });
            outputs.push(output);
        }
        *calls += outputs.len();

        let scores = component.get_interpretation_scores(&raw[slot], &neighbors, &diffs)?;
        Ok((scores, outputs))
    }

    fn shapley(
        &self,
        slot: usize,
        raw: &[Json],
        processed: &mut [Value],
        baseline: &Prediction,
        calls: &mut usize,
    ) -> Result<(SlotScores, Vec<Prediction>)> {
        let component = &self.inputs[slot];
        let neighbors = component.get_interpretation_neighbors(&raw[slot])?;
        let units = component
            .shapley_units(&neighbors)
            .ok_or_else(|| InterpretationError::UnsupportedMethod {
                component: component.name().to_string(),
                method: "shapley".to_string(),
            })?;

        let mut coalitions = Coalitions {
            interface: self,
            slot,
            raw: &raw[slot],
            neighbors: &neighbors,
            processed,
            outputs: HashMap::new(),
        };
        let values = shapley_values(units, &self.config, |keep| {
            Ok(coalition_value(baseline, coalitions.output(keep)?))
        })?;

        let mut outputs = Vec::with_capacity(units);
        for unit in 0..units {
            let mut keep = vec![true; units];
            keep[unit] = false;
            outputs.push(coalitions.output(&keep)?.clone());
        }
        *calls += coalitions.outputs.len();
        debug!(slot, units, coalitions = coalitions.outputs.len(), "Shapley attribution");

        let scores = component.get_interpretation_scores(&raw[slot], &neighbors, &values)?;
        Ok((scores, outputs))
    }
}

/// Memoized function outputs per keep-mask for one slot.
struct Coalitions<'a> {
    interface: &'a Interface,
    slot: usize,
    raw: &'a Json,
    neighbors: &'a Neighbors,
    processed: &'a mut [Value],
    outputs: HashMap<Vec<bool>, Prediction>,
}

impl Coalitions<'_> {
    fn output(&mut self, keep: &[bool]) -> Result<&Prediction> {
        match self.outputs.entry(keep.to_vec()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let component = &self.interface.inputs[self.slot];
                let masked = component.masked_input(self.raw, self.neighbors, keep)?;
                let output = self.interface.call_substituted(
                    self.processed,
                    self.slot,
                    &masked,
                    CallSite::Coalition { slot: self.slot },
                )?;
                Ok(entry.insert(output))
            }
        }
    }
}
