use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchyard_model::ErrorKind;

/// The step of a factory call a [`Failure`] applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePoint {
    /// The policy fails to create its resource.
    CreateResource,
    /// The provider fails to build the model object, after the resource
    /// has been created.
    CreateModel,
    /// Closing the resource fails.
    CloseResource,
}

/// A preset failure of the fake provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Failure {
    /// Where the failure happens.
    pub point: FailurePoint,
    /// The kind of error that is reported.
    pub kind: ErrorKind,
}

/// How the fake provider behaves.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetBehavior {
    /// Whether the provider needs a managed resource at all.
    #[serde(default)]
    pub resource_free: bool,
    /// How long creating the resource takes.
    #[serde(default, with = "millis")]
    pub create_delay: Option<Duration>,
    /// Failures to inject.
    #[serde(default)]
    pub failures: Vec<Failure>,
}

impl PresetBehavior {
    /// Returns the preset failure at `point`, if any.
    #[inline]
    pub fn failure_at(&self, point: FailurePoint) -> Option<ErrorKind> {
        self.failures
            .iter()
            .find(|f| f.point == point)
            .map(|f| f.kind)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
