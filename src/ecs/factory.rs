//! Component creators looked up by name, used when building entities from
//! level data.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use super::{Component, EcsError, ErasedComponent};

type Creator =
    Box<dyn Fn(serde_yaml::Value) -> Result<Box<dyn ErasedComponent>, EcsError> + Send + Sync>;

#[derive(Default)]
pub struct ComponentFactory {
    creators: BTreeMap<String, Creator>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, name: impl Into<String>)
    where
        T: Component + DeserializeOwned,
    {
        let name = name.into();
        let label = name.clone();
        self.creators.insert(
            name,
            Box::new(move |value| {
                let component: T = serde_yaml::from_value(value).map_err(|err| {
                    EcsError::InvalidComponent {
                        name: label.clone(),
                        message: err.to_string(),
                    }
                })?;
                Ok(Box::new(component) as Box<dyn ErasedComponent>)
            }),
        );
    }

    pub fn with<T>(mut self, name: impl Into<String>) -> Self
    where
        T: Component + DeserializeOwned,
    {
        self.register::<T>(name);
        self
    }

    pub fn create(
        &self,
        name: &str,
        value: serde_yaml::Value,
    ) -> Result<Box<dyn ErasedComponent>, EcsError> {
        let creator = self
            .creators
            .get(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_string()))?;
        creator(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.creators.keys().map(String::as_str)
    }
}
