use std::{fmt::Display, marker::PhantomData, path::Path, str::FromStr};

use fxhash::{FxHashMap, FxHashSet};
use serde::{de::Visitor, Deserialize, Serialize};
use serde_yml::Value;

use super::{
    ComponentDescriptor, ComponentId, ConfigError, ElementRegistry, Link, LinkEnd, LinkId,
    Params, PortId, Rank, Side,
};
use crate::time::Duration;

/// A full simulation topology.
///
/// The topology lists every component instance together with the links
/// that connect their ports. It can be loaded from YAML or assembled in
/// code, and is only checked against an [`ElementRegistry`] once a
/// simulation gets built from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDef {
    /// The component instances, in registration order.
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    /// The links between component ports.
    #[serde(default)]
    pub links: Vec<LinkDef>,
}

/// A single component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    /// The unique name of the instance.
    pub name: String,
    /// The registered element type, written `<library>.<name>`.
    #[serde(rename = "type")]
    pub ty: String,
    /// The rank this instance executes on.
    #[serde(default)]
    pub rank: u32,
    /// Parameters passed to the factory. Scalars are converted to strings.
    #[serde(default)]
    #[serde(skip_serializing_if = "FxHashMap::is_empty")]
    pub params: FxHashMap<String, Value>,
}

/// A link between two component ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDef {
    /// The unique name of the link.
    pub name: String,
    /// The latency of both directions, defined in seconds.
    #[serde(default = "default_latency")]
    pub latency: f64,
    /// The two connected ports.
    pub ends: [Endpoint; 2],
}

fn default_latency() -> f64 {
    1.0
}

/// A port on a named component, written `component.port`.
///
/// Component names may contain dots themselves, so the port is
/// everything after the last dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// The component name.
    pub component: String,
    /// The port name.
    pub port: String,
}

impl Endpoint {
    /// Creates a new endpoint.
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((component, port)) if !component.is_empty() && !port.is_empty() => {
                Ok(Endpoint::new(component, port))
            }
            _ => Err(ConfigError::InvalidEndpoint(s.to_string())),
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(FromStringVisitor(PhantomData))
    }
}

struct FromStringVisitor<T>(PhantomData<T>);
impl<'de, T: FromStr> Visitor<'de> for FromStringVisitor<T>
where
    T::Err: Display,
{
    type Value = T;
    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("string of the form 'component.port'")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        T::from_str(v).map_err(serde::de::Error::custom)
    }
}

impl TopologyDef {
    /// Creates an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a topology from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid topology.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a topology file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are not a valid topology.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&raw)
    }

    /// Serializes the topology to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Adds a component instance.
    pub fn add_component<K, V>(
        &mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        rank: u32,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.components.push(ComponentDef {
            name: name.into(),
            ty: ty.into(),
            rank,
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.to_string())))
                .collect(),
        });
        self
    }

    /// Adds a link between two ports.
    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        latency: f64,
        a: Endpoint,
        b: Endpoint,
    ) -> &mut Self {
        self.links.push(LinkDef {
            name: name.into(),
            latency,
            ends: [a, b],
        });
        self
    }

    /// Checks the topology against a registry and assigns identifiers.
    pub(crate) fn resolve<'a>(
        &'a self,
        registry: &'a ElementRegistry,
    ) -> Result<ResolvedTopology<'a>, ConfigError> {
        let mut by_name = FxHashMap::default();
        let mut components = Vec::with_capacity(self.components.len());

        for (idx, def) in self.components.iter().enumerate() {
            if by_name.insert(def.name.as_str(), ComponentId(idx)).is_some() {
                return Err(ConfigError::DuplicateComponent(def.name.clone()));
            }
            let descriptor =
                registry
                    .get(&def.ty)
                    .ok_or_else(|| ConfigError::UnknownComponentType {
                        component: def.name.clone(),
                        ty: def.ty.clone(),
                    })?;

            let mut params = Params::new(&def.name);
            for (key, value) in &def.params {
                params.insert(key.clone(), param_to_string(&def.name, key, value)?);
            }

            components.push(ResolvedComponent {
                name: &def.name,
                rank: Rank(def.rank),
                descriptor,
                params,
                wiring: FxHashMap::default(),
            });
        }

        let mut link_names = FxHashSet::default();
        let mut links = Vec::with_capacity(self.links.len());

        for (idx, def) in self.links.iter().enumerate() {
            if !link_names.insert(def.name.as_str()) {
                return Err(ConfigError::DuplicateLink(def.name.clone()));
            }
            let latency = Duration::try_from_secs_f64(def.latency).map_err(|_| {
                ConfigError::InvalidLatency {
                    link: def.name.clone(),
                    latency: def.latency.to_string(),
                }
            })?;
            if def.ends[0] == def.ends[1] {
                return Err(ConfigError::SelfLink(def.name.clone()));
            }

            let id = LinkId(idx);
            let mut ends = Vec::with_capacity(2);
            for (endpoint, side) in def.ends.iter().zip([Side::A, Side::B]) {
                let component = *by_name.get(endpoint.component.as_str()).ok_or_else(|| {
                    ConfigError::UnknownComponent {
                        link: def.name.clone(),
                        component: endpoint.component.clone(),
                    }
                })?;

                let resolved = &mut components[component.0];
                let port = resolved
                    .descriptor
                    .ports
                    .iter()
                    .position(|p| p.name == endpoint.port)
                    .map(PortId)
                    .ok_or_else(|| ConfigError::UnknownPort {
                        component: endpoint.component.clone(),
                        port: endpoint.port.clone(),
                    })?;

                if resolved.wiring.insert(port, (id, side)).is_some() {
                    return Err(ConfigError::PortAlreadyLinked {
                        component: endpoint.component.clone(),
                        port: endpoint.port.clone(),
                    });
                }

                ends.push(LinkEnd {
                    component,
                    port,
                    rank: resolved.rank,
                });
            }

            let [a, b]: [LinkEnd; 2] = ends
                .try_into()
                .map_err(|_| ConfigError::InvalidEndpoint(def.name.clone()))?;
            let link = Link::new(id, def.name.clone(), latency, [a, b]);
            if link.is_cross_rank() && link.latency().is_zero() {
                return Err(ConfigError::ZeroLatencyCrossRank(def.name.clone()));
            }
            links.push(link);
        }

        Ok(ResolvedTopology { components, links })
    }
}

fn param_to_string(component: &str, key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::InvalidParam {
            component: component.to_string(),
            key: key.to_string(),
            value: format!("{other:?}"),
        }),
    }
}

/// A topology that was checked against a registry.
#[derive(Debug)]
pub(crate) struct ResolvedTopology<'a> {
    pub(crate) components: Vec<ResolvedComponent<'a>>,
    pub(crate) links: Vec<Link>,
}

#[derive(Debug)]
pub(crate) struct ResolvedComponent<'a> {
    pub(crate) name: &'a str,
    pub(crate) rank: Rank,
    pub(crate) descriptor: &'a ComponentDescriptor,
    pub(crate) params: Params,
    pub(crate) wiring: FxHashMap<PortId, (LinkId, Side)>,
}
