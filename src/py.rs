//! Python bindings for the assistant using PyO3

use crate::assistant::{Assistant, Rejection};
use crate::config::AssistantConfig;
use crate::dates::normalize_date;
use crate::types::ProcessedItem;
use chrono::{Local, NaiveDate};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde_json::Value;

/// Normalize a date phrase (Python function)
///
/// `reference` is an ISO date; today's local date when omitted.
#[pyfunction]
#[pyo3(name = "normalize_date", signature = (raw, reference = None))]
pub fn py_normalize_date(raw: &str, reference: Option<&str>) -> PyResult<String> {
    let reference = match reference {
        Some(iso) => NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
            .map_err(|e| PyValueError::new_err(format!("Invalid reference date {iso:?}: {e}")))?,
        None => Local::now().date_naive(),
    };
    Ok(normalize_date(raw, reference))
}

/// Python wrapper for the assistant
#[pyclass(name = "Assistant")]
pub struct PyAssistant {
    inner: Assistant,
}

#[pymethods]
impl PyAssistant {
    #[new]
    #[pyo3(signature = (api_key = None, model_name = None, offensive_terms = None, invalid_locations = None))]
    fn new(
        api_key: Option<String>,
        model_name: Option<String>,
        offensive_terms: Option<Vec<String>>,
        invalid_locations: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let mut config = match api_key {
            Some(key) => {
                dotenvy::dotenv().ok();
                AssistantConfig::from_lookup(|name| match name {
                    "API_KEY" => Some(key.clone()),
                    _ => std::env::var(name).ok(),
                })
            }
            None => AssistantConfig::from_env(),
        }
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

        if let Some(model) = model_name {
            config = config.with_model(model);
        }
        if let Some(terms) = offensive_terms {
            config = config.with_offensive_terms(terms);
        }
        if let Some(places) = invalid_locations {
            config = config.with_invalid_locations(places);
        }

        let inner = Assistant::from_config(config).map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Process one request into a list of intent (or error) dicts
    fn process_input(&self, py: Python<'_>, user_input: &Bound<'_, PyAny>) -> PyResult<PyObject> {
        if user_input.is_none() {
            return items_to_py(py, &Rejection::Empty.into_items());
        }
        let Ok(text) = user_input.extract::<String>() else {
            return items_to_py(py, &Rejection::NotText.into_items());
        };

        let items = py
            .allow_threads(|| self.inner.process_input(&text))
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        items_to_py(py, &items)
    }
}

fn items_to_py(py: Python<'_>, items: &[ProcessedItem]) -> PyResult<PyObject> {
    let value = serde_json::to_value(items)
        .map_err(|e| PyValueError::new_err(format!("Failed to serialize result: {}", e)))?;
    json_to_py(py, &value)
}

fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    let object = match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.to_object(py),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_object(py),
            (None, Some(u)) => u.to_object(py),
            _ => n.as_f64().unwrap_or_default().to_object(py),
        },
        Value::String(s) => s.to_object(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_any().unbind()
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_any().unbind()
        }
    };
    Ok(object)
}
