//! Prop adapters for the single-purpose geo chart types.
//!
//! Decks written against the older `map`, `bubbles`, `hexgrid`, `flow2d`,
//! `plumes` and `water` charts pass props in those charts' own shapes. These
//! adapters rewrite such props into a [`GeoChartConfig`] shape so that every
//! alias is served by the unified geo composer.
//!
//! Props are only rewritten when they carry the legacy key of their type
//! (for example `clusters` for `map`). Anything else passes through
//! unchanged, so a deck may also hand full geo props to an alias.
//!
//! [`GeoChartConfig`]: crate::chart_config::GeoChartConfig

use log::debug;
use serde_json::{Map, Value, json};

/// Rewrites legacy props of chart type `kind` into geo chart props.
pub fn adapt(kind: &str, props: Value) -> Value {
    let Value::Object(props) = props else {
        return props;
    };
    let adapted = match kind {
        "map" => map(&props),
        "bubbles" => bubbles(&props),
        "hexgrid" => hexgrid(&props),
        "flow2d" => flow2d(&props),
        "plumes" => plumes(&props),
        "water" => water(&props),
        _ => None,
    };
    match adapted {
        Some(value) => {
            debug!(kind; "Adapted legacy chart props");
            value
        }
        None => Value::Object(props),
    }
}

fn map(props: &Map<String, Value>) -> Option<Value> {
    let clusters = props.get("clusters")?;
    Some(json!({
        "width": 1200,
        "height": 700,
        "layers": {
            "bubbles": {
                "data": clusters,
                "r": "mw",
                "rRange": [6, 58],
                "style": {
                    "fill": "rgba(123,223,242,.25)",
                    "stroke": "rgba(123,223,242,.9)",
                    "strokeWidth": 1.6
                },
                "label": {"text": "{name}"},
                "tooltip": "<strong>{name}</strong><br/>~{mw:,} MW"
            }
        }
    }))
}

fn bubbles(props: &Map<String, Value>) -> Option<Value> {
    let metros = props.get("metros")?;
    let value_key = props
        .get("valueKey")
        .and_then(Value::as_str)
        .unwrap_or("inc");
    let mut layer = json!({
        "data": metros,
        "r": value_key,
        "rRange": props.get("rRange").cloned().unwrap_or_else(|| json!([6, 36])),
        "tooltip": format!("<strong>{{name}}</strong><br/>{{{value_key}}}"),
        "anim": {"growMs": 1600}
    });
    if let Some(label) = props.get("labelFmt").filter(|v| v.is_string()) {
        layer["label"] = json!({"text": label});
    }
    Some(json!({"width": 1200, "height": 720, "layers": {"bubbles": layer}}))
}

fn hexgrid(props: &Map<String, Value>) -> Option<Value> {
    let points = props.get("points")?;
    let label = props
        .get("labelFmt")
        .filter(|v| v.is_string())
        .cloned()
        .unwrap_or_else(|| json!("{name} · {burden:.2}%"));
    Some(json!({
        "width": 1200,
        "height": 720,
        "basemap": {
            "sphereFill": "rgba(255,255,255,.03)",
            "stateFill": "rgba(255,255,255,.04)",
            "stateStroke": "rgba(255,255,255,.10)"
        },
        "layers": {"hexgrid": {"points": points, "labelFmt": label}}
    }))
}

fn flow2d(props: &Map<String, Value>) -> Option<Value> {
    let edges = props.get("edges")?;
    Some(json!({
        "width": 1200,
        "height": 720,
        "layers": {
            "flow": {
                "hubs": props.get("hubs").cloned().unwrap_or_else(|| json!([])),
                "gens": props.get("gens").cloned().unwrap_or_else(|| json!([])),
                "edges": edges
            }
        }
    }))
}

fn plumes(props: &Map<String, Value>) -> Option<Value> {
    let sites = props.get("sites")?;
    Some(json!({
        "width": 1200,
        "height": 720,
        "layers": {"plumes": {"sites": sites}}
    }))
}

fn water(props: &Map<String, Value>) -> Option<Value> {
    let stress = props.get("stressByState")?;
    Some(json!({
        "width": 1200,
        "height": 700,
        "basemap": {
            "choropleth": {
                "valueByName": stress,
                "color": {"domain": [0, 0.5, 1], "range": ["#3aa0ff", "#f0e68c", "#e34a33"]},
                "missing": 0.25,
                "staggerMs": 24,
                "title": "{name} • stress {pctl}pctl",
                "outline": {"threshold": 0.75}
            }
        }
    }))
}
