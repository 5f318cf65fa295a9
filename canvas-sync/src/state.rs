//! State codec: full snapshots and partial patches over declared properties.
//!
//! Layers compose explicitly. Each [`StateLayer`] serializes and patches the
//! layer beneath it before handling its own properties, so a derived layer
//! always observes the base layer's values already applied.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::property::{Binary, Property, PropertyCodec};

/// Module name the remote renderer registers its model and view under.
pub const MODEL_MODULE: &str = "ipycanvas";

/// Version range of the renderer module this crate speaks to.
pub const MODEL_MODULE_VERSION: &str = "^0.13";

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: i32 = 700;

/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: i32 = 500;

/// A structured state mapping plus the side buffers it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Property name to wire value.
    pub state: Map<String, Value>,
    /// Binary payloads referenced from `state`.
    pub buffers: Vec<Bytes>,
}

impl Snapshot {
    /// Serialize the given properties, in order, into a fresh snapshot.
    #[must_use]
    pub fn of(properties: &[&dyn PropertyCodec]) -> Self {
        let mut snapshot = Self::default();
        serialize_properties(
            properties.iter().copied(),
            &mut snapshot.state,
            &mut snapshot.buffers,
        );
        snapshot
    }

    /// Whether the snapshot carries no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// What happened to each entry of an applied patch.
#[derive(Debug, Default)]
pub struct PatchOutcome {
    /// Declared properties that were decoded and assigned.
    pub applied: Vec<String>,
    /// Names not declared on any layer.
    pub ignored: Vec<String>,
    /// Declared properties whose value could not be decoded.
    pub rejected: Vec<(String, CodecError)>,
}

/// One layer in a linear chain of property codecs.
pub trait StateLayer {
    /// Write this layer's properties (base layers first) into `state`.
    fn serialize_state(&self, state: &mut Map<String, Value>, buffers: &mut Vec<Bytes>);

    /// Apply the entries of `patch` this layer declares (base layers first).
    fn apply_patch(
        &mut self,
        patch: &Map<String, Value>,
        buffers: &[Bytes],
        outcome: &mut PatchOutcome,
    );

    /// Whether this layer or one beneath it declares `name`.
    fn declares(&self, name: &str) -> bool;

    /// Serialize the full chain into a new snapshot.
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        self.serialize_state(&mut snapshot.state, &mut snapshot.buffers);
        snapshot
    }

    /// Apply a patch to the full chain and report unknown names.
    fn patch(&mut self, patch: &Map<String, Value>, buffers: &[Bytes]) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();
        self.apply_patch(patch, buffers, &mut outcome);
        for name in patch.keys() {
            if !self.declares(name) {
                tracing::debug!("Ignoring undeclared property in patch: {name}");
                outcome.ignored.push(name.clone());
            }
        }
        outcome
    }
}

/// Serialize each property under its name.
pub fn serialize_properties<'a>(
    properties: impl IntoIterator<Item = &'a dyn PropertyCodec>,
    state: &mut Map<String, Value>,
    buffers: &mut Vec<Bytes>,
) {
    for property in properties {
        let value = property.serialize(buffers);
        state.insert(property.name().to_string(), value);
    }
}

/// Assign every property present in `patch`, leaving the rest untouched.
pub fn apply_properties<'a>(
    properties: impl IntoIterator<Item = &'a mut dyn PropertyCodec>,
    patch: &Map<String, Value>,
    buffers: &[Bytes],
    outcome: &mut PatchOutcome,
) {
    for property in properties {
        let name = property.name();
        let Some(value) = patch.get(name) else {
            continue;
        };
        match property.apply(value, buffers) {
            Ok(_) => outcome.applied.push(name.to_string()),
            Err(err) => {
                tracing::warn!("Rejected patch value for {name}: {err}");
                outcome.rejected.push((name.to_string(), err));
            }
        }
    }
}

/// Base widget layer: identifies the remote model and view.
#[derive(Debug)]
pub struct WidgetBase {
    /// Module providing the remote model.
    pub model_module: Property<String>,
    /// Version range of the model module.
    pub model_module_version: Property<String>,
    /// Remote model class name.
    pub model_name: Property<String>,
    /// Module providing the remote view.
    pub view_module: Property<String>,
    /// Version range of the view module.
    pub view_module_version: Property<String>,
    /// Remote view class name.
    pub view_name: Property<String>,
    /// CSS classes applied to the view.
    pub dom_classes: Property<Vec<String>>,
}

impl WidgetBase {
    /// Create a base layer for the given model and view names.
    #[must_use]
    pub fn new(model_name: &str, view_name: &str) -> Self {
        Self {
            model_module: Property::new("_model_module", MODEL_MODULE.to_string()),
            model_module_version: Property::new(
                "_model_module_version",
                MODEL_MODULE_VERSION.to_string(),
            ),
            model_name: Property::new("_model_name", model_name.to_string()),
            view_module: Property::new("_view_module", MODEL_MODULE.to_string()),
            view_module_version: Property::new(
                "_view_module_version",
                MODEL_MODULE_VERSION.to_string(),
            ),
            view_name: Property::new("_view_name", view_name.to_string()),
            dom_classes: Property::new("_dom_classes", Vec::new()),
        }
    }

    fn properties(&self) -> [&dyn PropertyCodec; 7] {
        [
            &self.model_module,
            &self.model_module_version,
            &self.model_name,
            &self.view_module,
            &self.view_module_version,
            &self.view_name,
            &self.dom_classes,
        ]
    }

    fn properties_mut(&mut self) -> [&mut dyn PropertyCodec; 7] {
        [
            &mut self.model_module,
            &mut self.model_module_version,
            &mut self.model_name,
            &mut self.view_module,
            &mut self.view_module_version,
            &mut self.view_name,
            &mut self.dom_classes,
        ]
    }
}

impl StateLayer for WidgetBase {
    fn serialize_state(&self, state: &mut Map<String, Value>, buffers: &mut Vec<Bytes>) {
        serialize_properties(self.properties(), state, buffers);
    }

    fn apply_patch(
        &mut self,
        patch: &Map<String, Value>,
        buffers: &[Bytes],
        outcome: &mut PatchOutcome,
    ) {
        apply_properties(self.properties_mut(), patch, buffers, outcome);
    }

    fn declares(&self, name: &str) -> bool {
        self.properties().iter().any(|p| p.name() == name)
    }
}

/// Canvas layer on top of [`WidgetBase`].
#[derive(Debug)]
pub struct CanvasState {
    /// The widget layer beneath.
    pub base: WidgetBase,
    /// Canvas width in pixels.
    pub width: Property<i32>,
    /// Canvas height in pixels.
    pub height: Property<i32>,
    /// Whether the renderer should send its pixels back as `image_data`.
    pub sync_image_data: Property<bool>,
    /// Last pixel data reported by the renderer.
    pub image_data: Property<Option<Binary>>,
}

impl CanvasState {
    /// Create a canvas layer with default property values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new("CanvasModel", "CanvasView"),
            width: Property::new("width", DEFAULT_WIDTH),
            height: Property::new("height", DEFAULT_HEIGHT),
            sync_image_data: Property::new("sync_image_data", false),
            image_data: Property::new("image_data", None),
        }
    }

    fn properties(&self) -> [&dyn PropertyCodec; 4] {
        [
            &self.width,
            &self.height,
            &self.sync_image_data,
            &self.image_data,
        ]
    }

    fn properties_mut(&mut self) -> [&mut dyn PropertyCodec; 4] {
        [
            &mut self.width,
            &mut self.height,
            &mut self.sync_image_data,
            &mut self.image_data,
        ]
    }
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

impl StateLayer for CanvasState {
    fn serialize_state(&self, state: &mut Map<String, Value>, buffers: &mut Vec<Bytes>) {
        self.base.serialize_state(state, buffers);
        serialize_properties(self.properties(), state, buffers);
    }

    fn apply_patch(
        &mut self,
        patch: &Map<String, Value>,
        buffers: &[Bytes],
        outcome: &mut PatchOutcome,
    ) {
        self.base.apply_patch(patch, buffers, outcome);
        apply_properties(self.properties_mut(), patch, buffers, outcome);
    }

    fn declares(&self, name: &str) -> bool {
        self.base.declares(name) || self.properties().iter().any(|p| p.name() == name)
    }
}
